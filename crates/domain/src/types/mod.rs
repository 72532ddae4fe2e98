//! Domain types and models

pub mod integration;
pub mod invoice;
pub mod order;

pub use integration::{integration_types, Integration};
pub use invoice::{
    AuditBlock, InvoiceCustomer, InvoiceLineItem, InvoiceOperation, InvoicePayload,
    InvoiceRequestMessage, InvoiceResponseMessage, InvoiceStatus,
};
pub use order::{
    Address, AddressKind, CanonicalOrder, ChannelMetadata, Customer, MoneyBreakdown, OrderItem,
    OrderStatus, Payment, Shipment,
};

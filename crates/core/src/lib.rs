//! # OrderBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for queues, vaults, order sources and
//!   invoicing providers
//! - Vendor order mappers and the canonical mapper registry
//! - The webhook ingestor, the paginated sync engine and the invoice bridge
//!
//! ## Architecture Principles
//! - Only depends on `orderbridge-domain`
//! - No HTTP, broker or storage code
//! - All external dependencies via traits

pub mod invoicing;
pub mod mapping;
pub mod orders;
pub mod ports;
pub mod sync;

pub use invoicing::{InvoiceBridgeConfig, InvoiceRpcBridge};
pub use mapping::{MapperRegistry, OrderMapper, Platform};
pub use orders::{IngestOutcome, OrderPublisher, WebhookIngestor};
pub use ports::{
    CreatedInvoice, CredentialVault, InvoiceProvider, InvoiceProviderFactory, MessageHandler,
    MessageQueuePort, OrderPage, OrderSource, PageCursor, PageInfo, ProviderCallError, SyncParams,
};
pub use sync::{PaginatedSyncEngine, SyncEngineConfig, SyncHandle, SyncOutcome, SyncReport};

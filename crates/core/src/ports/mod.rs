//! Port interfaces implemented by infrastructure adapters

pub mod invoicing;
pub mod messaging;
pub mod orders;
pub mod vault;

pub use invoicing::{CreatedInvoice, InvoiceProvider, InvoiceProviderFactory, ProviderCallError};
pub use messaging::{MessageHandler, MessageQueuePort};
pub use orders::{OrderPage, OrderSource, PageCursor, PageInfo, SyncParams};
pub use vault::CredentialVault;

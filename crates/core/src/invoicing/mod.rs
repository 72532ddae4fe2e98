//! Request/response bridge to electronic invoicing providers

pub mod bridge;

pub use bridge::{InvoiceBridgeConfig, InvoiceRpcBridge};

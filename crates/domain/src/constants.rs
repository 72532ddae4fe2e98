//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Queue names
pub const CANONICAL_ORDERS_QUEUE: &str = "orders.canonical";
pub const INVOICE_REQUESTS_QUEUE: &str = "invoices.requests";
pub const INVOICE_RESPONSES_QUEUE: &str = "invoices.responses";

// Canonical schema
pub const CANONICAL_SCHEMA_VERSION: &str = "1.0";

// Token lifecycle
pub const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 300;

// Sync engine
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const DEFAULT_INTER_PAGE_DELAY_MS: u64 = 500;

// Invoice bridge
pub const DEFAULT_CONSISTENCY_DELAY_MS: u64 = 3000;

// Webhook topics that announce a deletion and must not produce a message
pub const DELETION_TOPICS: &[&str] = &["order.deleted", "orders/delete", "order_deleted"];

//! Application configuration structures
//!
//! Loaded by `orderbridge_infra::config` from environment variables or a
//! TOML/JSON file. Every section has defaults so partial files are accepted.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CANONICAL_ORDERS_QUEUE, DEFAULT_CONSISTENCY_DELAY_MS, DEFAULT_INTER_PAGE_DELAY_MS,
    DEFAULT_PAGE_SIZE, DEFAULT_TOKEN_REFRESH_MARGIN_SECS, INVOICE_REQUESTS_QUEUE,
    INVOICE_RESPONSES_QUEUE,
};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub invoicing: InvoicingConfig,
    #[serde(default)]
    pub tokens: TokenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub canonical_orders: String,
    pub invoice_requests: String,
    pub invoice_responses: String,
    pub durable: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            canonical_orders: CANONICAL_ORDERS_QUEUE.to_string(),
            invoice_requests: INVOICE_REQUESTS_QUEUE.to_string(),
            invoice_responses: INVOICE_RESPONSES_QUEUE.to_string(),
            durable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub default_page_size: i64,
    /// Courtesy delay before every page after the first.
    pub inter_page_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            inter_page_delay_ms: DEFAULT_INTER_PAGE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicingConfig {
    /// Wait before the follow-up document lookup.
    pub consistency_delay_ms: u64,
    pub lookup_after_create: bool,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self { consistency_delay_ms: DEFAULT_CONSISTENCY_DELAY_MS, lookup_after_create: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub refresh_margin_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self { refresh_margin_secs: DEFAULT_TOKEN_REFRESH_MARGIN_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,orderbridge_core=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

//! Canonical order publishing and webhook ingestion

pub mod ingest;
pub mod publisher;

pub use ingest::{IngestOutcome, WebhookIngestor};
pub use publisher::OrderPublisher;

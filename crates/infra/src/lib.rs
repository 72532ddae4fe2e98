//! # OrderBridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The retrying HTTP client shared by vendor clients
//! - Order sources for WooCommerce, MercadoLibre and VTEX
//! - The Siigo invoicing provider and its factory
//! - In-memory message queue and credential vault adapters
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `orderbridge-core`
//! - Depends on `orderbridge-common`, `orderbridge-domain` and
//!   `orderbridge-core`
//! - Contains all "impure" code (network I/O, environment, files)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod messaging;
pub mod observability;
pub mod vault;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RetryPolicy};
pub use integrations::{
    classify_status, token_manager, OrderSourceFactory, SiigoProvider, SiigoProviderFactory,
};
pub use messaging::InMemoryMessageQueue;
pub use observability::init_tracing;
pub use vault::InMemoryCredentialVault;

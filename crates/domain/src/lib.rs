//! # OrderBridge Domain
//!
//! Business domain types and models for OrderBridge.
//!
//! This crate contains:
//! - The canonical order schema and its sub-records
//! - Invoice request/response messages
//! - Integration records
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other OrderBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

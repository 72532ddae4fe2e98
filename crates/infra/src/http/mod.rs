//! Shared HTTP plumbing for vendor clients.

mod client;

pub use client::{HttpClient, HttpClientBuilder, RetryPolicy};

//! Port interfaces for electronic invoicing providers

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderbridge_domain::{AuditBlock, Integration, InvoiceRequestMessage, OrderBridgeError, Result};
use thiserror::Error;

/// Result of a successful create call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedInvoice {
    /// Human-facing number, e.g. `FE001`.
    pub invoice_number: String,
    /// Provider's internal identifier.
    pub external_id: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub audit: Option<AuditBlock>,
}

/// Provider failure. `audit` is set whenever the remote call was issued, so
/// error responses can still carry what was sent and received.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct ProviderCallError {
    pub error: OrderBridgeError,
    pub audit: Option<AuditBlock>,
}

impl ProviderCallError {
    #[must_use]
    pub fn with_audit(error: OrderBridgeError, audit: AuditBlock) -> Self {
        Self { error, audit: Some(audit) }
    }
}

impl From<OrderBridgeError> for ProviderCallError {
    fn from(error: OrderBridgeError) -> Self {
        Self { error, audit: None }
    }
}

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    /// Provider name as it appears in request messages (`siigo`).
    fn name(&self) -> &str;

    async fn create_invoice(
        &self,
        request: &InvoiceRequestMessage,
    ) -> std::result::Result<CreatedInvoice, ProviderCallError>;

    /// Fetch the full document for an already issued invoice.
    async fn find_by_number(
        &self,
        invoice_number: &str,
    ) -> std::result::Result<serde_json::Value, ProviderCallError>;
}

/// Builds a configured provider for one invoicing integration.
#[async_trait]
pub trait InvoiceProviderFactory: Send + Sync {
    /// # Errors
    /// `OrderBridgeError::Config` for an unknown provider name, a mismatched
    /// integration type or missing credentials.
    async fn provider_for(
        &self,
        integration: &Integration,
        provider: &str,
        overrides: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<Arc<dyn InvoiceProvider>>;
}

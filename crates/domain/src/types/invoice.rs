//! Invoice request/response messages exchanged over the queue
//!
//! A request is consumed once; exactly one response with the same
//! `correlation_id` is published for it, whatever the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::OrderBridgeError;
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceOperation {
    Create,
    Retry,
}

impl_domain_status_conversions!(InvoiceOperation {
    Create => "create",
    Retry => "retry",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Success,
    Error,
}

impl_domain_status_conversions!(InvoiceStatus {
    Success => "success",
    Error => "error",
});

/// Buyer identity as required by electronic invoicing providers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceCustomer {
    pub identification: String,
    #[serde(default)]
    pub identification_type: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub code: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount: f64,
    /// Tax rate as a percentage (19.0 means 19%).
    #[serde(default)]
    pub tax_rate: f64,
}

/// Everything a provider needs to issue one invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoicePayload {
    #[serde(default)]
    pub customer: InvoiceCustomer,
    #[serde(default)]
    pub items: Vec<InvoiceLineItem>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax_total: f64,
    #[serde(default)]
    pub discount_total: f64,
    pub total: f64,
    pub currency: String,
    pub order_id: String,
    /// Per-request overrides of the integration's provider settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequestMessage {
    pub invoice_id: String,
    pub integration_id: String,
    pub provider: String,
    pub operation: InvoiceOperation,
    pub payload: InvoicePayload,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Captured request/response pair of a remote HTTP call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditBlock {
    pub request_url: String,
    pub request_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    pub response_body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponseMessage {
    pub invoice_id: String,
    pub provider: String,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds from message receipt to response construction.
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditBlock>,
}

impl InvoiceResponseMessage {
    /// Successful response for `request`.
    #[must_use]
    pub fn success(
        request: &InvoiceRequestMessage,
        invoice_number: String,
        external_id: String,
        issued_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            invoice_id: request.invoice_id.clone(),
            provider: request.provider.clone(),
            status: InvoiceStatus::Success,
            invoice_number: Some(invoice_number),
            external_id: Some(external_id),
            issued_at,
            document: None,
            error_code: None,
            error_message: None,
            correlation_id: request.correlation_id.clone(),
            timestamp: Utc::now(),
            processing_time_ms: 0,
            audit: None,
        }
    }

    /// Error response for `request`, carrying the error's stable code.
    #[must_use]
    pub fn failure(request: &InvoiceRequestMessage, error: &OrderBridgeError) -> Self {
        Self {
            invoice_id: request.invoice_id.clone(),
            provider: request.provider.clone(),
            status: InvoiceStatus::Error,
            invoice_number: None,
            external_id: None,
            issued_at: None,
            document: None,
            error_code: Some(error.error_code().to_string()),
            error_message: Some(error.to_string()),
            correlation_id: request.correlation_id.clone(),
            timestamp: Utc::now(),
            processing_time_ms: 0,
            audit: None,
        }
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Option<AuditBlock>) -> Self {
        self.audit = audit;
        self
    }

    #[must_use]
    pub fn with_document(mut self, document: Option<serde_json::Value>) -> Self {
        self.document = document;
        self
    }

    #[must_use]
    pub fn with_processing_time_ms(mut self, elapsed_ms: u64) -> Self {
        self.processing_time_ms = elapsed_ms;
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, InvoiceStatus::Success)
    }
}

//! Invoicing provider doubles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use orderbridge_core::{CreatedInvoice, InvoiceProvider, InvoiceProviderFactory, ProviderCallError};
use orderbridge_domain::{AuditBlock, Integration, InvoiceRequestMessage, OrderBridgeError, Result};
use parking_lot::Mutex;

pub enum CreateBehaviour {
    Succeed { invoice_number: String },
    /// Remote call issued and rejected; the audit is returned with the error.
    RejectWithAudit { status: u16, body: String },
    /// Failure before any request was sent.
    FailBeforeSend(OrderBridgeError),
}

pub struct StubProvider {
    behaviour: CreateBehaviour,
    lookup_fails: bool,
    creates: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new(behaviour: CreateBehaviour) -> Self {
        Self {
            behaviour,
            lookup_fails: false,
            creates: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(invoice_number: &str) -> Self {
        Self::new(CreateBehaviour::Succeed { invoice_number: invoice_number.to_string() })
    }

    pub fn with_failing_lookup(mut self) -> Self {
        self.lookup_fails = true;
        self
    }

    pub fn creates(&self) -> Vec<String> {
        self.creates.lock().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    fn audit(request: &InvoiceRequestMessage, status: u16, body: &str) -> AuditBlock {
        AuditBlock {
            request_url: "https://invoicing.test/v1/invoices".into(),
            request_payload: serde_json::to_string(&request.payload).unwrap(),
            response_status: Some(status),
            response_body: body.to_string(),
        }
    }
}

#[async_trait]
impl InvoiceProvider for StubProvider {
    fn name(&self) -> &str {
        "siigo"
    }

    async fn create_invoice(
        &self,
        request: &InvoiceRequestMessage,
    ) -> std::result::Result<CreatedInvoice, ProviderCallError> {
        self.creates.lock().push(request.invoice_id.clone());
        match &self.behaviour {
            CreateBehaviour::Succeed { invoice_number } => Ok(CreatedInvoice {
                invoice_number: invoice_number.clone(),
                external_id: format!("ext-{invoice_number}"),
                issued_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                audit: Some(Self::audit(request, 201, r#"{"name":"FE001"}"#)),
            }),
            CreateBehaviour::RejectWithAudit { status, body } => Err(ProviderCallError::with_audit(
                OrderBridgeError::InvalidInput(format!("provider rejected invoice: {body}")),
                Self::audit(request, *status, body),
            )),
            CreateBehaviour::FailBeforeSend(err) => Err(err.clone().into()),
        }
    }

    async fn find_by_number(
        &self,
        invoice_number: &str,
    ) -> std::result::Result<serde_json::Value, ProviderCallError> {
        self.lookups.lock().push(invoice_number.to_string());
        if self.lookup_fails {
            return Err(OrderBridgeError::Network("lookup timed out".into()).into());
        }
        Ok(serde_json::json!({ "name": invoice_number, "stamp": { "status": "Accepted" } }))
    }
}

/// Hands out one shared provider, or a fixed error.
pub struct StubFactory {
    provider: Option<Arc<StubProvider>>,
    error: Option<OrderBridgeError>,
    requests: Mutex<Vec<(String, String)>>,
}

impl StubFactory {
    pub fn with_provider(provider: Arc<StubProvider>) -> Self {
        Self { provider: Some(provider), error: None, requests: Mutex::new(Vec::new()) }
    }

    pub fn failing(error: OrderBridgeError) -> Self {
        Self { provider: None, error: Some(error), requests: Mutex::new(Vec::new()) }
    }

    /// `(integration id, provider name)` of every request.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl InvoiceProviderFactory for StubFactory {
    async fn provider_for(
        &self,
        integration: &Integration,
        provider: &str,
        _overrides: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<Arc<dyn InvoiceProvider>> {
        self.requests.lock().push((integration.id.clone(), provider.to_string()));
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match &self.provider {
            Some(provider) => Ok(Arc::clone(provider) as Arc<dyn InvoiceProvider>),
            None => Err(OrderBridgeError::Config("no provider".into())),
        }
    }
}

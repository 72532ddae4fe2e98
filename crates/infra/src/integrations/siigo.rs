//! Siigo electronic invoicing provider
//!
//! Authentication is a username/access-key exchange for a bearer token that
//! is cached in the shared [`TokenLifecycleManager`]. Every call also
//! carries the `Partner-Id` header Siigo uses to identify integrators.
//!
//! Invoice creation is not idempotent on Siigo's side, so the create call is
//! sent through a single-attempt client and replayed at most once, only after
//! a 401 and a token refresh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use orderbridge_common::{IssuedToken, TokenKey, TokenLifecycleManager};
use orderbridge_core::ports::{
    CreatedInvoice, CredentialVault, InvoiceProvider, InvoiceProviderFactory, ProviderCallError,
};
use orderbridge_domain::integration_types::SIIGO;
use orderbridge_domain::{
    AuditBlock, Integration, InvoiceLineItem, InvoicePayload, InvoiceRequestMessage,
    OrderBridgeError, Result,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::{classify_status, read_body, read_json};
use super::{base_url, join};
use crate::http::{HttpClient, RetryPolicy};

pub const PROVIDER_NAME: &str = "siigo";
pub const DEFAULT_API_BASE: &str = "https://api.siigo.com";

/// Typed view of a Siigo integration, after per-request overrides.
#[derive(Clone)]
pub struct SiigoConfig {
    pub api_base: Url,
    pub username: String,
    pub access_key: String,
    pub partner_id: String,
    /// Siigo document type used for the invoice (`document.id`).
    pub document_id: i64,
    pub seller_id: Option<i64>,
    pub payment_type_id: Option<i64>,
    pub tax_id: Option<i64>,
}

impl std::fmt::Debug for SiigoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiigoConfig")
            .field("api_base", &self.api_base.as_str())
            .field("username", &self.username)
            .field("partner_id", &self.partner_id)
            .field("document_id", &self.document_id)
            .finish_non_exhaustive()
    }
}

impl SiigoConfig {
    /// Read the integration config with `overrides` applied on top of it.
    ///
    /// # Errors
    /// `OrderBridgeError::Config` when `username`, `partner_id`,
    /// `document_id` or the `access_key` credential is missing.
    pub async fn resolve(
        integration: &Integration,
        vault: &dyn CredentialVault,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Self> {
        let mut merged = integration.clone();
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                merged.config.insert(key.clone(), value.clone());
            }
        }

        let api_base =
            base_url(&merged.optional_str("base_url").unwrap_or_else(|| DEFAULT_API_BASE.to_string()))?;
        let document_id = merged.optional_i64("document_id").ok_or_else(|| {
            OrderBridgeError::Config(format!(
                "integration {} is missing required config field 'document_id'",
                merged.id
            ))
        })?;

        Ok(Self {
            api_base,
            username: merged.require_str("username")?,
            access_key: vault.decrypt_credential(&integration.id, "access_key").await?,
            partner_id: merged.require_str("partner_id")?,
            document_id,
            seller_id: merged.optional_i64("seller_id"),
            payment_type_id: merged.optional_i64("payment_type_id"),
            tax_id: merged.optional_i64("tax_id"),
        })
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    86_400
}

#[derive(Deserialize)]
struct InvoiceCreated {
    id: String,
    name: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    metadata: Option<InvoiceMetadata>,
}

#[derive(Deserialize)]
struct InvoiceMetadata {
    #[serde(default)]
    created: Option<String>,
}

#[derive(Deserialize)]
struct InvoiceSearch {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct SiigoProvider {
    http: HttpClient,
    config: SiigoConfig,
    tokens: Arc<TokenLifecycleManager>,
}

impl SiigoProvider {
    #[must_use]
    pub const fn new(http: HttpClient, config: SiigoConfig, tokens: Arc<TokenLifecycleManager>) -> Self {
        Self { http, config, tokens }
    }

    fn token_key(&self) -> TokenKey {
        TokenKey::new(PROVIDER_NAME, format!("{}#{}", self.config.api_base, self.config.username))
    }

    async fn access_token(&self) -> Result<String> {
        self.tokens.ensure_valid(&self.token_key(), || self.authenticate()).await
    }

    async fn authenticate(&self) -> Result<IssuedToken> {
        let body = json!({ "username": self.config.username, "access_key": self.config.access_key });
        let request = self
            .http
            .request(Method::POST, join(&self.config.api_base, "auth")?)
            .header("Partner-Id", &self.config.partner_id)
            .json(&body);
        let response = self.http.send(request).await?;
        let granted: AuthResponse = read_json(response).await.map_err(|err| match err {
            OrderBridgeError::TokenExpired(msg)
            | OrderBridgeError::InvalidInput(msg)
            | OrderBridgeError::Auth(msg) => {
                OrderBridgeError::Auth(format!("Siigo rejected the API credentials: {msg}"))
            }
            other => other,
        })?;
        debug!(username = %self.config.username, "issued Siigo access token");
        Ok(IssuedToken::new(granted.access_token, Duration::from_secs(granted.expires_in)))
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.bearer_auth(token).header("Partner-Id", &self.config.partner_id)
    }

    async fn post_once(&self, url: &Url, body: &str, token: &str) -> Result<(StatusCode, String)> {
        let request = self
            .authorized(self.http.request(Method::POST, url.clone()), token)
            .header("Content-Type", "application/json")
            .body(body.to_string());
        read_body(self.http.send(request).await?).await
    }

    /// POST the invoice, refreshing the token and replaying once on 401.
    /// Returns the final exchange; any failure after the first send carries
    /// an audit block.
    async fn post_invoice(
        &self,
        url: &Url,
        body: &str,
    ) -> std::result::Result<(StatusCode, String), ProviderCallError> {
        let unanswered = |error: OrderBridgeError| {
            ProviderCallError::with_audit(error, audit(url, body, None, String::new()))
        };

        let token = self.access_token().await?;
        let (status, text) = self.post_once(url, body, &token).await.map_err(unanswered)?;
        if status != StatusCode::UNAUTHORIZED {
            return Ok((status, text));
        }

        warn!(username = %self.config.username, "Siigo rejected cached token; refreshing once");
        self.tokens.invalidate(&self.token_key());
        let token = self.access_token().await.map_err(|error| {
            ProviderCallError::with_audit(error, audit(url, body, Some(status), text.clone()))
        })?;
        self.post_once(url, body, &token).await.map_err(unanswered)
    }

    async fn get_with_refresh(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let retry = request.try_clone();
        let token = self.access_token().await?;
        let (status, text) = read_body(self.http.send(self.authorized(request, &token)).await?).await?;
        match (status, retry) {
            (StatusCode::UNAUTHORIZED, Some(retry)) => {
                self.tokens.invalidate(&self.token_key());
                let token = self.access_token().await?;
                read_body(self.http.send(self.authorized(retry, &token)).await?).await
            }
            _ => Ok((status, text)),
        }
    }
}

#[async_trait]
impl InvoiceProvider for SiigoProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip_all, fields(invoice_id = %request.invoice_id, correlation_id = %request.correlation_id))]
    async fn create_invoice(
        &self,
        request: &InvoiceRequestMessage,
    ) -> std::result::Result<CreatedInvoice, ProviderCallError> {
        let document = invoice_document(&request.payload, &self.config, request.timestamp)?;
        let body = serde_json::to_string(&document).map_err(OrderBridgeError::from)?;
        let url = join(&self.config.api_base, "v1/invoices")?;

        let (status, text) = self.post_invoice(&url, &body).await?;
        let audit_block = audit(&url, &body, Some(status), text.clone());
        if !status.is_success() {
            return Err(ProviderCallError::with_audit(classify_status(status, &text), audit_block));
        }

        let created: InvoiceCreated = serde_json::from_str(&text).map_err(|err| {
            ProviderCallError::with_audit(
                OrderBridgeError::Serialization(format!("unexpected Siigo invoice response: {err}")),
                audit_block.clone(),
            )
        })?;
        info!(invoice_number = %created.name, external_id = %created.id, "Siigo invoice issued");

        Ok(CreatedInvoice {
            issued_at: issued_at(&created),
            invoice_number: created.name,
            external_id: created.id,
            audit: Some(audit_block),
        })
    }

    async fn find_by_number(
        &self,
        invoice_number: &str,
    ) -> std::result::Result<Value, ProviderCallError> {
        let url = join(&self.config.api_base, "v1/invoices")?;
        let request = self.http.request(Method::GET, url).query(&[("name", invoice_number)]);
        let (status, text) = self.get_with_refresh(request).await?;
        if !status.is_success() {
            return Err(classify_status(status, &text).into());
        }

        let search: InvoiceSearch = serde_json::from_str(&text).map_err(OrderBridgeError::from)?;
        search.results.into_iter().next().ok_or_else(|| {
            OrderBridgeError::NotFound(format!("Siigo invoice {invoice_number} not found")).into()
        })
    }
}

fn audit(url: &Url, body: &str, status: Option<StatusCode>, response_body: String) -> AuditBlock {
    AuditBlock {
        request_url: url.to_string(),
        request_payload: body.to_string(),
        response_status: status.map(|s| s.as_u16()),
        response_body,
    }
}

fn issued_at(created: &InvoiceCreated) -> Option<DateTime<Utc>> {
    let from_metadata = created
        .metadata
        .as_ref()
        .and_then(|m| m.created.as_deref())
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    from_metadata.or_else(|| {
        let date = NaiveDate::parse_from_str(created.date.as_deref()?, "%Y-%m-%d").ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    })
}

/// Siigo `POST /v1/invoices` body for `payload`.
fn invoice_document(
    payload: &InvoicePayload,
    config: &SiigoConfig,
    requested_at: DateTime<Utc>,
) -> Result<Value> {
    let identification = payload.customer.identification.trim();
    if identification.is_empty() {
        return Err(OrderBridgeError::InvalidInput(format!(
            "order {} has no customer identification",
            payload.order_id
        )));
    }

    let date = requested_at.format("%Y-%m-%d").to_string();
    let items: Vec<Value> = if payload.items.is_empty() {
        let amount = if payload.subtotal > 0.0 { payload.subtotal } else { payload.total };
        vec![item_json(
            &InvoiceLineItem {
                code: payload.order_id.clone(),
                description: format!("Order {}", payload.order_id),
                quantity: 1.0,
                unit_price: amount,
                discount: payload.discount_total,
                tax_rate: 0.0,
            },
            config.tax_id,
        )]
    } else {
        payload.items.iter().map(|item| item_json(item, config.tax_id)).collect()
    };

    let mut customer = json!({ "identification": identification, "branch_office": 0 });
    if !payload.customer.identification_type.is_empty() {
        customer["id_type"] = json!(payload.customer.identification_type);
    }

    let mut document = json!({
        "document": { "id": config.document_id },
        "date": date,
        "customer": customer,
        "observations": format!("Order {}", payload.order_id),
        "items": items,
    });
    if let Some(seller) = config.seller_id {
        document["seller"] = json!(seller);
    }
    if let Some(payment_type) = config.payment_type_id {
        document["payments"] = json!([{ "id": payment_type, "value": payload.total, "due_date": date }]);
    }
    Ok(document)
}

fn item_json(item: &InvoiceLineItem, tax_id: Option<i64>) -> Value {
    let mut line = json!({
        "code": item.code,
        "description": item.description,
        "quantity": item.quantity,
        "price": item.unit_price,
        "discount": item.discount,
    });
    if let (Some(tax), true) = (tax_id, item.tax_rate > 0.0) {
        line["taxes"] = json!([{ "id": tax }]);
    }
    line
}

/// Builds [`SiigoProvider`]s for invoicing integrations.
pub struct SiigoProviderFactory {
    http: HttpClient,
    vault: Arc<dyn CredentialVault>,
    tokens: Arc<TokenLifecycleManager>,
}

impl SiigoProviderFactory {
    /// `http` should be a single-attempt client; see the module docs.
    #[must_use]
    pub fn new(http: HttpClient, vault: Arc<dyn CredentialVault>, tokens: Arc<TokenLifecycleManager>) -> Self {
        Self { http, vault, tokens }
    }

    /// Factory with a single-attempt client.
    ///
    /// # Errors
    /// Propagates HTTP client construction failures.
    pub fn with_defaults(vault: Arc<dyn CredentialVault>, tokens: Arc<TokenLifecycleManager>) -> Result<Self> {
        let http = HttpClient::builder()
            .retry_policy(RetryPolicy::SINGLE_ATTEMPT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self::new(http, vault, tokens))
    }
}

#[async_trait]
impl InvoiceProviderFactory for SiigoProviderFactory {
    async fn provider_for(
        &self,
        integration: &Integration,
        provider: &str,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Arc<dyn InvoiceProvider>> {
        if !provider.trim().eq_ignore_ascii_case(PROVIDER_NAME) {
            return Err(OrderBridgeError::Config(format!("unsupported invoicing provider '{provider}'")));
        }
        if integration.integration_type_id != SIIGO {
            return Err(OrderBridgeError::Config(format!(
                "integration {} (type {}) is not a Siigo integration",
                integration.id, integration.integration_type_id
            )));
        }

        let config = SiigoConfig::resolve(integration, self.vault.as_ref(), overrides).await?;
        Ok(Arc::new(SiigoProvider::new(self.http.clone(), config, Arc::clone(&self.tokens))))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use orderbridge_domain::InvoiceCustomer;

    use super::*;

    fn config() -> SiigoConfig {
        SiigoConfig {
            api_base: base_url("https://api.siigo.test").unwrap(),
            username: "api@store.co".into(),
            access_key: "key".into(),
            partner_id: "OrderBridge".into(),
            document_id: 24446,
            seller_id: Some(629),
            payment_type_id: Some(5636),
            tax_id: Some(13156),
        }
    }

    fn payload() -> InvoicePayload {
        InvoicePayload {
            customer: InvoiceCustomer {
                identification: "900123456".into(),
                identification_type: "31".into(),
                name: "Comercial SAS".into(),
                ..InvoiceCustomer::default()
            },
            items: vec![InvoiceLineItem {
                code: "SKU-1".into(),
                description: "Camiseta".into(),
                quantity: 2.0,
                unit_price: 42016.81,
                discount: 0.0,
                tax_rate: 19.0,
            }],
            subtotal: 84033.62,
            tax_total: 15966.38,
            total: 100000.0,
            currency: "COP".into(),
            order_id: "o-1".into(),
            ..InvoicePayload::default()
        }
    }

    #[test]
    fn document_carries_configured_ids() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let document = invoice_document(&payload(), &config(), at).unwrap();

        assert_eq!(document["document"]["id"], 24446);
        assert_eq!(document["date"], "2024-05-01");
        assert_eq!(document["seller"], 629);
        assert_eq!(document["customer"]["identification"], "900123456");
        assert_eq!(document["customer"]["id_type"], "31");
        assert_eq!(document["items"][0]["taxes"][0]["id"], 13156);
        assert_eq!(document["payments"][0]["value"], 100000.0);
    }

    #[test]
    fn payload_without_items_becomes_a_single_line() {
        let mut payload = payload();
        payload.items.clear();
        let document = invoice_document(&payload, &config(), Utc::now()).unwrap();

        let items = document["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["code"], "o-1");
        assert_eq!(items[0]["price"], 84033.62);
        assert!(items[0].get("taxes").is_none());
    }

    #[test]
    fn missing_identification_is_invalid_input() {
        let mut payload = payload();
        payload.customer.identification = "  ".into();
        let err = invoice_document(&payload, &config(), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn issued_at_prefers_metadata_timestamp() {
        let created: InvoiceCreated = serde_json::from_value(json!({
            "id": "ext-9", "name": "FE001", "date": "2024-05-01",
            "metadata": { "created": "2024-05-01T15:30:00Z" }
        }))
        .unwrap();
        assert_eq!(issued_at(&created), Some(Utc.with_ymd_and_hms(2024, 5, 1, 15, 30, 0).unwrap()));

        let date_only: InvoiceCreated =
            serde_json::from_value(json!({ "id": "ext-9", "name": "FE001", "date": "2024-05-01" })).unwrap();
        assert_eq!(issued_at(&date_only), Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
    }
}

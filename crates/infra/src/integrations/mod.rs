//! Vendor API clients
//!
//! Order sources for the e-commerce platforms and the Siigo invoicing
//! provider. Each client converts the integration's untyped config map into
//! a typed config once, at construction.

pub mod errors;
pub mod mercadolibre;
pub mod siigo;
pub mod vtex;
pub mod woocommerce;

use std::sync::Arc;
use std::time::Duration;

use orderbridge_common::TokenLifecycleManager;
use orderbridge_core::ports::{CredentialVault, OrderSource, PageCursor};
use orderbridge_core::{MapperRegistry, Platform};
use orderbridge_domain::{Integration, OrderBridgeError, Result, TokenConfig};
use serde_json::value::RawValue;
use url::Url;

pub use errors::classify_status;
pub use mercadolibre::{MercadoLibreConfig, MercadoLibreSource};
pub use siigo::{SiigoConfig, SiigoProvider, SiigoProviderFactory};
pub use vtex::{VtexConfig, VtexSource};
pub use woocommerce::{WooCommerceConfig, WooCommerceSource};

use crate::http::HttpClient;

/// Token cache shared by every vendor client, refreshing
/// `refresh_margin_secs` ahead of expiry.
#[must_use]
pub fn token_manager(config: &TokenConfig) -> Arc<TokenLifecycleManager> {
    Arc::new(TokenLifecycleManager::with_system_clock(Duration::from_secs(config.refresh_margin_secs)))
}

/// Builds the [`OrderSource`] for an e-commerce integration.
pub struct OrderSourceFactory {
    http: HttpClient,
    vault: Arc<dyn CredentialVault>,
    tokens: Arc<TokenLifecycleManager>,
    registry: MapperRegistry,
}

impl OrderSourceFactory {
    #[must_use]
    pub fn new(
        http: HttpClient,
        vault: Arc<dyn CredentialVault>,
        tokens: Arc<TokenLifecycleManager>,
    ) -> Self {
        Self { http, vault, tokens, registry: MapperRegistry::default() }
    }

    /// Factory with the default retrying client.
    ///
    /// # Errors
    /// Propagates HTTP client construction failures.
    pub fn with_defaults(
        vault: Arc<dyn CredentialVault>,
        tokens: Arc<TokenLifecycleManager>,
    ) -> Result<Self> {
        let http = HttpClient::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::new(http, vault, tokens))
    }

    /// # Errors
    /// `OrderBridgeError::Config` for an integration type without an order
    /// source, or missing config/credentials.
    pub async fn source_for(&self, integration: &Integration) -> Result<Arc<dyn OrderSource>> {
        let vault = self.vault.as_ref();
        let source: Arc<dyn OrderSource> =
            match self.registry.resolve(integration.integration_type_id)? {
                Platform::WooCommerce => Arc::new(WooCommerceSource::new(
                    self.http.clone(),
                    WooCommerceConfig::resolve(integration, vault).await?,
                )),
                Platform::MercadoLibre => Arc::new(MercadoLibreSource::new(
                    self.http.clone(),
                    integration.id.clone(),
                    MercadoLibreConfig::resolve(integration, vault).await?,
                    Arc::clone(&self.tokens),
                    Arc::clone(&self.vault),
                )),
                Platform::Vtex => Arc::new(VtexSource::new(
                    self.http.clone(),
                    VtexConfig::resolve(integration, vault).await?,
                )),
            };
        Ok(source)
    }
}

/// Parse a base URL so that [`Url::join`] appends instead of replacing the
/// last path segment.
pub(crate) fn base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized =
        if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };
    Url::parse(&normalized)
        .map_err(|err| OrderBridgeError::Config(format!("invalid base url '{trimmed}': {err}")))
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|err| OrderBridgeError::Internal(format!("cannot build url for '{path}': {err}")))
}

/// Page number and size for page-based APIs, whichever cursor shape the
/// caller holds.
pub(crate) fn page_number(cursor: &PageCursor, max_size: i64) -> (i64, i64) {
    match *cursor {
        PageCursor::Page { page, per_page } => (page.max(1), per_page.clamp(1, max_size)),
        PageCursor::Offset { offset, limit } => {
            let size = limit.clamp(1, max_size);
            (offset.max(0) / size + 1, size)
        }
    }
}

/// Offset and limit for offset-based APIs.
pub(crate) fn offset_limit(cursor: &PageCursor, max_size: i64) -> (i64, i64) {
    match *cursor {
        PageCursor::Offset { offset, limit } => (offset.max(0), limit.clamp(1, max_size)),
        PageCursor::Page { page, per_page } => {
            let size = per_page.clamp(1, max_size);
            ((page.max(1) - 1) * size, size)
        }
    }
}

/// Split a JSON array body into the vendor's own bytes for each element.
pub(crate) fn split_orders(body: &str) -> Result<Vec<Vec<u8>>> {
    let elements: Vec<Box<RawValue>> = serde_json::from_str(body).map_err(|err| {
        OrderBridgeError::Serialization(format!("expected a JSON array of orders: {err}"))
    })?;
    Ok(raw_documents(&elements))
}

pub(crate) fn raw_documents(elements: &[Box<RawValue>]) -> Vec<Vec<u8>> {
    elements.iter().map(|raw| raw.get().as_bytes().to_vec()).collect()
}

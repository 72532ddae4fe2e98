//! MercadoLibre order source
//!
//! Bearer tokens come from the OAuth refresh-token grant. MercadoLibre
//! rotates the refresh token on every grant, so the new one is written back
//! to the integration's config through the vault before it is used again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orderbridge_common::{IssuedToken, TokenKey, TokenLifecycleManager};
use orderbridge_core::ports::{CredentialVault, OrderPage, OrderSource, PageCursor, PageInfo, SyncParams};
use orderbridge_core::Platform;
use orderbridge_domain::{Integration, OrderBridgeError, Result};
use parking_lot::Mutex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, info, warn};
use url::Url;

use super::errors::read_json;
use super::{base_url, join, offset_limit, raw_documents};
use crate::http::HttpClient;

pub const DEFAULT_API_BASE: &str = "https://api.mercadolibre.com";

/// `/orders/search` rejects limits above 50.
const MAX_LIMIT: i64 = 50;

/// Typed view of a MercadoLibre integration.
#[derive(Clone)]
pub struct MercadoLibreConfig {
    pub api_base: Url,
    pub seller_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for MercadoLibreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoLibreConfig")
            .field("api_base", &self.api_base.as_str())
            .field("seller_id", &self.seller_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl MercadoLibreConfig {
    /// The refresh token is read from the config map first (where rotated
    /// tokens are persisted) and from the vault otherwise.
    ///
    /// # Errors
    /// `OrderBridgeError::Config` when a required field is missing.
    pub async fn resolve(integration: &Integration, vault: &dyn CredentialVault) -> Result<Self> {
        let api_base = base_url(
            &integration.optional_str("api_base_url").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )?;
        let seller_id = integration.require_str("seller_id")?;
        let client_id = integration.require_str("client_id")?;
        let client_secret = vault.decrypt_credential(&integration.id, "client_secret").await?;
        let refresh_token = match integration.optional_str("refresh_token") {
            Some(token) => token,
            None => vault.decrypt_credential(&integration.id, "refresh_token").await?,
        };
        Ok(Self { api_base, seller_id, client_id, client_secret, refresh_token })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

const fn default_expires_in() -> u64 {
    21_600
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Box<RawValue>>,
    paging: SearchPaging,
}

#[derive(Deserialize)]
struct SearchPaging {
    total: i64,
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
}

pub struct MercadoLibreSource {
    http: HttpClient,
    integration_id: String,
    config: MercadoLibreConfig,
    refresh_token: Mutex<String>,
    tokens: Arc<TokenLifecycleManager>,
    vault: Arc<dyn CredentialVault>,
}

impl MercadoLibreSource {
    #[must_use]
    pub fn new(
        http: HttpClient,
        integration_id: impl Into<String>,
        config: MercadoLibreConfig,
        tokens: Arc<TokenLifecycleManager>,
        vault: Arc<dyn CredentialVault>,
    ) -> Self {
        let refresh_token = Mutex::new(config.refresh_token.clone());
        Self { http, integration_id: integration_id.into(), config, refresh_token, tokens, vault }
    }

    fn token_key(&self) -> TokenKey {
        TokenKey::new(Platform::MercadoLibre.as_str(), &self.integration_id)
    }

    async fn refresh(&self) -> Result<IssuedToken> {
        let current = self.refresh_token.lock().clone();
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", current.as_str()),
        ];

        let request = self
            .http
            .request(Method::POST, join(&self.config.api_base, "oauth/token")?)
            .header("Accept", "application/json")
            .form(&form);
        let response = self.http.send(request).await?;
        let granted: TokenResponse = read_json(response).await.map_err(|err| match err {
            // A rejected refresh grant is terminal.
            OrderBridgeError::TokenExpired(msg) | OrderBridgeError::InvalidInput(msg) => {
                OrderBridgeError::Auth(format!("MercadoLibre refresh grant rejected: {msg}"))
            }
            other => other,
        })?;

        if let Some(rotated) = granted.refresh_token.filter(|t| !t.is_empty() && *t != current) {
            *self.refresh_token.lock() = rotated.clone();
            self.persist_refresh_token(rotated).await;
        }

        Ok(IssuedToken::new(granted.access_token, Duration::from_secs(granted.expires_in)))
    }

    /// The new access token is usable even if persisting fails, so a failed
    /// write is logged rather than surfaced.
    async fn persist_refresh_token(&self, refresh_token: String) {
        match self.write_refresh_token(refresh_token).await {
            Ok(()) => info!(integration_id = %self.integration_id, "persisted rotated refresh token"),
            Err(err) => warn!(
                integration_id = %self.integration_id,
                error = %err,
                "failed to persist rotated refresh token"
            ),
        }
    }

    async fn write_refresh_token(&self, refresh_token: String) -> Result<()> {
        let integration = self.vault.get_integration_by_id(&self.integration_id).await?;
        let updated = integration.with_config_value("refresh_token", refresh_token);
        self.vault.update_integration_config(&self.integration_id, updated.config).await
    }
}

#[async_trait]
impl OrderSource for MercadoLibreSource {
    fn platform(&self) -> Platform {
        Platform::MercadoLibre
    }

    async fn access_token(&self, force_refresh: bool) -> Result<String> {
        let key = self.token_key();
        if force_refresh {
            self.tokens.invalidate(&key);
        }
        self.tokens.ensure_valid(&key, || self.refresh()).await
    }

    fn first_cursor(&self, page_size: i64) -> PageCursor {
        PageCursor::Offset { offset: 0, limit: page_size.clamp(1, MAX_LIMIT) }
    }

    async fn fetch_page(
        &self,
        token: &str,
        cursor: &PageCursor,
        params: &SyncParams,
    ) -> Result<OrderPage> {
        let (offset, limit) = offset_limit(cursor, MAX_LIMIT);

        let mut query = vec![
            ("seller", self.config.seller_id.clone()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("sort", "date_asc".to_string()),
        ];
        if let Some(since) = params.updated_since {
            query.push(("order.date_last_updated.from", since.to_rfc3339()));
        }

        let request = self
            .http
            .request(Method::GET, join(&self.config.api_base, "orders/search")?)
            .bearer_auth(token)
            .query(&query);
        let response = self.http.send(request).await?;
        let search: SearchResponse = read_json(response).await?;

        let orders = raw_documents(&search.results);
        debug!(offset, limit, total = search.paging.total, count = orders.len(), "fetched MercadoLibre orders");

        Ok(OrderPage {
            orders,
            info: PageInfo::Offset {
                offset: search.paging.offset.unwrap_or(offset),
                limit: search.paging.limit.filter(|l| *l > 0).unwrap_or(limit),
                total: search.paging.total,
            },
        })
    }
}

//! VTEX OMS order source
//!
//! The list endpoint returns summaries only, so each listed order is fetched
//! again from the detail endpoint before it is handed to the mapper.

use async_trait::async_trait;
use chrono::Utc;
use orderbridge_core::ports::{CredentialVault, OrderPage, OrderSource, PageCursor, PageInfo, SyncParams};
use orderbridge_core::Platform;
use orderbridge_domain::{Integration, OrderBridgeError, Result};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{debug, warn};
use url::Url;

use super::errors::{classify_status, read_body, read_json};
use super::{base_url, join, page_number};
use crate::http::HttpClient;

const DEFAULT_ENVIRONMENT: &str = "vtexcommercestable";

/// OMS caps `per_page` at 100.
const MAX_PER_PAGE: i64 = 100;

/// Typed view of a VTEX integration.
#[derive(Clone)]
pub struct VtexConfig {
    pub base_url: Url,
    pub app_key: String,
    pub app_token: String,
}

impl std::fmt::Debug for VtexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VtexConfig").field("base_url", &self.base_url.as_str()).finish_non_exhaustive()
    }
}

impl VtexConfig {
    /// `base_url` wins when present; otherwise the store URL is derived from
    /// `account_name` and `environment`.
    ///
    /// # Errors
    /// `OrderBridgeError::Config` when neither `base_url` nor `account_name`
    /// is set, or a credential is missing.
    pub async fn resolve(integration: &Integration, vault: &dyn CredentialVault) -> Result<Self> {
        let base = match integration.optional_str("base_url") {
            Some(url) => url,
            None => {
                let account = integration.require_str("account_name")?;
                let environment = integration
                    .optional_str("environment")
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
                format!("https://{account}.{environment}.com.br")
            }
        };
        let app_key = vault.decrypt_credential(&integration.id, "app_key").await?;
        let app_token = vault.decrypt_credential(&integration.id, "app_token").await?;
        Ok(Self { base_url: base_url(&base)?, app_key, app_token })
    }
}

#[derive(Deserialize)]
struct OrderList {
    #[serde(default)]
    list: Vec<OrderSummary>,
    paging: ListPaging,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderSummary {
    order_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPaging {
    #[serde(default)]
    current_page: Option<i64>,
    #[serde(default)]
    per_page: Option<i64>,
    pages: i64,
}

pub struct VtexSource {
    http: HttpClient,
    config: VtexConfig,
}

impl VtexSource {
    #[must_use]
    pub const fn new(http: HttpClient, config: VtexConfig) -> Self {
        Self { http, config }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-VTEX-API-AppKey", &self.config.app_key)
            .header("X-VTEX-API-AppToken", &self.config.app_token)
            .header("Accept", "application/json")
    }

    /// Detail document exactly as the OMS sent it.
    async fn order_detail(&self, order_id: &str) -> Result<Vec<u8>> {
        let url = join(&self.config.base_url, &format!("api/oms/pvt/orders/{order_id}"))?;
        let response = self.http.send(self.authorized(self.http.request(Method::GET, url))).await?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }
        serde_json::from_str::<&RawValue>(&body).map_err(|err| {
            OrderBridgeError::Serialization(format!("order detail is not JSON: {err}"))
        })?;
        Ok(body.into_bytes())
    }
}

#[async_trait]
impl OrderSource for VtexSource {
    fn platform(&self) -> Platform {
        Platform::Vtex
    }

    /// App key/token pairs do not expire.
    async fn access_token(&self, _force_refresh: bool) -> Result<String> {
        Ok(self.config.app_key.clone())
    }

    fn first_cursor(&self, page_size: i64) -> PageCursor {
        PageCursor::Page { page: 1, per_page: page_size.clamp(1, MAX_PER_PAGE) }
    }

    async fn fetch_page(
        &self,
        _token: &str,
        cursor: &PageCursor,
        params: &SyncParams,
    ) -> Result<OrderPage> {
        let (page, per_page) = page_number(cursor, MAX_PER_PAGE);

        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("orderBy", "creationDate,asc".to_string()),
        ];
        if let Some(since) = params.updated_since {
            let range = format!(
                "creationDate:[{} TO {}]",
                since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            );
            query.push(("f_creationDate", range));
        }

        let url = join(&self.config.base_url, "api/oms/pvt/orders")?;
        let request = self.authorized(self.http.request(Method::GET, url)).query(&query);
        let response = self.http.send(request).await?;
        let listing: OrderList = read_json(response).await?;

        let mut orders = Vec::with_capacity(listing.list.len());
        for summary in &listing.list {
            match self.order_detail(&summary.order_id).await {
                Ok(detail) => orders.push(detail),
                Err(err @ (OrderBridgeError::Auth(_) | OrderBridgeError::TokenExpired(_))) => {
                    return Err(err);
                }
                Err(err) => {
                    warn!(order_id = %summary.order_id, error = %err, "listed VTEX order has no usable detail; skipping");
                }
            }
        }
        debug!(page, per_page, pages = listing.paging.pages, count = orders.len(), "fetched VTEX orders");

        Ok(OrderPage {
            orders,
            info: PageInfo::PageNumber {
                page: listing.paging.current_page.unwrap_or(page),
                per_page: listing.paging.per_page.filter(|p| *p > 0).unwrap_or(per_page),
                total_pages: listing.paging.pages,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn source(server: &MockServer) -> VtexSource {
        let http = HttpClient::builder().max_attempts(1).build().unwrap();
        VtexSource::new(
            http,
            VtexConfig {
                base_url: base_url(&server.uri()).unwrap(),
                app_key: "vtexappkey-store".into(),
                app_token: "token".into(),
            },
        )
    }

    #[tokio::test]
    async fn fetches_detail_for_every_listed_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders"))
            .and(query_param("page", "1"))
            .and(header("X-VTEX-API-AppKey", "vtexappkey-store"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{ "orderId": "v100-01" }, { "orderId": "v101-01" }],
                "paging": { "total": 3, "pages": 2, "currentPage": 1, "perPage": 2 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v100-01"))
            .and(header("X-VTEX-API-AppToken", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "orderId": "v100-01", "status": "invoiced", "value": 15990
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v101-01"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = source(&server);
        let page = source.fetch_page("ignored", &source.first_cursor(2), &SyncParams::default()).await.unwrap();

        assert_eq!(page.orders.len(), 1);
        let detail: serde_json::Value = serde_json::from_slice(&page.orders[0]).unwrap();
        assert_eq!(detail["status"], "invoiced");
        assert_eq!(page.info, PageInfo::PageNumber { page: 1, per_page: 2, total_pages: 2 });
        assert_eq!(page.info.next_cursor(), Some(PageCursor::Page { page: 2, per_page: 2 }));
    }

    #[tokio::test]
    async fn forbidden_listing_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_page("ignored", &PageCursor::Page { page: 1, per_page: 10 }, &SyncParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderBridgeError::Auth(_)));
    }

    #[tokio::test]
    async fn broken_detail_is_skipped_and_others_keep_vendor_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{ "orderId": "v1" }, { "orderId": "v2" }, { "orderId": "v3" }],
                "paging": { "total": 3, "pages": 1, "currentPage": 1, "perPage": 10 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status": "invoiced",  "orderId": "v2", "value": 15000}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let page = source(&server)
            .fetch_page("ignored", &PageCursor::Page { page: 1, per_page: 10 }, &SyncParams::default())
            .await
            .unwrap();

        assert_eq!(page.orders, vec![br#"{"status": "invoiced",  "orderId": "v2", "value": 15000}"#.to_vec()]);
    }

    #[tokio::test]
    async fn forbidden_detail_aborts_the_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{ "orderId": "v1" }],
                "paging": { "total": 1, "pages": 1 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oms/pvt/orders/v1"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_page("ignored", &PageCursor::Page { page: 1, per_page: 10 }, &SyncParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderBridgeError::Auth(_)));
    }
}

//! Paginated sync engine
//!
//! A run walks a vendor's order listing page by page, maps every order and
//! publishes it. Runs are detached tokio tasks: [`PaginatedSyncEngine::start`]
//! returns as soon as the first token has been obtained, and the caller can
//! stop the run through its [`CancellationToken`].
//!
//! Failure policy:
//! - a single order that fails to map or publish is logged and skipped
//! - a page rejected with an expired token is refetched once with a fresh
//!   token; a second rejection abandons the run
//! - any other page failure abandons the run, keeping what was published

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use orderbridge_domain::{Integration, OrderBridgeError, Result, SyncConfig};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::mapping::{MapperRegistry, Platform};
use crate::orders::OrderPublisher;
use crate::ports::orders::effective_page_size;
use crate::ports::{OrderPage, OrderSource, PageCursor, SyncParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEngineConfig {
    /// Delay before every page after the first.
    pub inter_page_delay: Duration,
    /// Used when the caller asks for a non-positive page size.
    pub default_page_size: i64,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncEngineConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            inter_page_delay: Duration::from_millis(config.inter_page_delay_ms),
            default_page_size: effective_page_size(config.default_page_size),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    Cancelled,
    Aborted(OrderBridgeError),
}

/// Counters for a finished run. Observability only; nothing reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub integration_id: String,
    pub pages_fetched: u32,
    pub published: u64,
    pub failed: u64,
    pub outcome: SyncOutcome,
}

/// Handle to a detached run.
#[derive(Debug)]
pub struct SyncHandle {
    pub run_id: Uuid,
    pub join: JoinHandle<SyncReport>,
}

#[derive(Clone)]
pub struct PaginatedSyncEngine {
    registry: MapperRegistry,
    publisher: OrderPublisher,
    config: SyncEngineConfig,
}

impl PaginatedSyncEngine {
    #[must_use]
    pub fn new(
        registry: MapperRegistry,
        publisher: OrderPublisher,
        config: SyncEngineConfig,
    ) -> Self {
        Self { registry, publisher, config }
    }

    /// Validate the run, fetch the initial token and spawn the page loop.
    ///
    /// # Errors
    /// `InvalidInput` for an empty integration id, `Config` when the source
    /// does not serve the integration's platform, and whatever the initial
    /// token request returns.
    #[instrument(skip_all, fields(integration_id = %integration.id, platform = %source.platform()))]
    pub async fn start(
        &self,
        cancel: CancellationToken,
        source: Arc<dyn OrderSource>,
        integration: Integration,
        params: SyncParams,
    ) -> Result<SyncHandle> {
        if integration.id.trim().is_empty() {
            return Err(OrderBridgeError::InvalidInput("sync requires an integration id".into()));
        }
        let platform = self.registry.resolve(integration.integration_type_id)?;
        if platform != source.platform() {
            return Err(OrderBridgeError::Config(format!(
                "integration {} is a {} integration but the source serves {}",
                integration.id,
                platform,
                source.platform()
            )));
        }

        let token = source.access_token(false).await?;
        let run_id = Uuid::new_v4();
        let page_size = if params.page_size > 0 {
            params.page_size
        } else {
            self.config.default_page_size
        };
        let run = SyncRun {
            run_id,
            platform,
            integration,
            params: SyncParams { page_size, ..params },
            source,
            publisher: self.publisher.clone(),
            delay: self.config.inter_page_delay,
            cancel,
        };

        info!(%run_id, page_size, "sync run started");
        let join = tokio::spawn(run.execute(token));
        Ok(SyncHandle { run_id, join })
    }
}

struct SyncRun {
    run_id: Uuid,
    platform: Platform,
    integration: Integration,
    params: SyncParams,
    source: Arc<dyn OrderSource>,
    publisher: OrderPublisher,
    delay: Duration,
    cancel: CancellationToken,
}

struct Counters {
    pages_fetched: u32,
    published: u64,
    failed: u64,
}

impl SyncRun {
    async fn execute(self, token: String) -> SyncReport {
        let mut counters = Counters { pages_fetched: 0, published: 0, failed: 0 };
        let outcome = self.page_loop(token, &mut counters).await;

        match &outcome {
            SyncOutcome::Completed => info!(
                run_id = %self.run_id,
                integration_id = %self.integration.id,
                pages = counters.pages_fetched,
                published = counters.published,
                failed = counters.failed,
                "sync run completed"
            ),
            SyncOutcome::Cancelled => info!(
                run_id = %self.run_id,
                integration_id = %self.integration.id,
                pages = counters.pages_fetched,
                published = counters.published,
                "sync run cancelled"
            ),
            SyncOutcome::Aborted(err) => error!(
                run_id = %self.run_id,
                integration_id = %self.integration.id,
                pages = counters.pages_fetched,
                published = counters.published,
                error_label = err.label(),
                error = %err,
                "sync run aborted"
            ),
        }

        SyncReport {
            run_id: self.run_id,
            integration_id: self.integration.id.clone(),
            pages_fetched: counters.pages_fetched,
            published: counters.published,
            failed: counters.failed,
            outcome,
        }
    }

    async fn page_loop(&self, mut token: String, counters: &mut Counters) -> SyncOutcome {
        let mut cursor = self.source.first_cursor(self.params.page_size);
        let mut first_page = true;

        loop {
            if self.cancel.is_cancelled() {
                return SyncOutcome::Cancelled;
            }
            if !first_page {
                tokio::select! {
                    () = self.cancel.cancelled() => return SyncOutcome::Cancelled,
                    () = tokio::time::sleep(self.delay) => {}
                }
            }
            first_page = false;

            let page = tokio::select! {
                () = self.cancel.cancelled() => return SyncOutcome::Cancelled,
                page = self.fetch_with_refresh(&mut token, &cursor) => page,
            };
            let page = match page {
                Ok(page) => page,
                Err(err) => return SyncOutcome::Aborted(err),
            };
            counters.pages_fetched += 1;
            debug!(run_id = %self.run_id, ?cursor, orders = page.orders.len(), "page fetched");

            for raw in &page.orders {
                match self.publish_one(raw).await {
                    Ok(()) => counters.published += 1,
                    Err(err) => {
                        counters.failed += 1;
                        warn!(
                            run_id = %self.run_id,
                            integration_id = %self.integration.id,
                            error_label = err.label(),
                            error = %err,
                            "skipping order that could not be mapped or published"
                        );
                    }
                }
            }

            match page.info.next_cursor() {
                Some(next) => cursor = next,
                None => return SyncOutcome::Completed,
            }
        }
    }

    /// Fetch `cursor`; on an expired token refresh once and refetch the same
    /// cursor.
    async fn fetch_with_refresh(
        &self,
        token: &mut String,
        cursor: &PageCursor,
    ) -> Result<OrderPage> {
        match self.source.fetch_page(token, cursor, &self.params).await {
            Err(err) if err.is_auth_expired() => {
                warn!(run_id = %self.run_id, ?cursor, "access token rejected, refreshing once");
                *token = self.source.access_token(true).await?;
                self.source.fetch_page(token, cursor, &self.params).await
            }
            other => other,
        }
    }

    async fn publish_one(&self, raw: &[u8]) -> Result<()> {
        let order = self.platform.map_raw(raw)?.enrich(
            &self.integration.id,
            self.integration.tenant_id.as_deref(),
            Utc::now(),
        );
        if order.status.is_passthrough() {
            debug!(external_id = %order.external_id, status = %order.status, "vendor status has no canonical mapping");
        }
        self.publisher.publish(&order).await
    }
}

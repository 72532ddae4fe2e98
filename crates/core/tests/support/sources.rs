//! Scripted order source.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orderbridge_core::{OrderPage, OrderSource, PageCursor, PageInfo, Platform, SyncParams};
use orderbridge_domain::{OrderBridgeError, Result};
use parking_lot::Mutex;

/// Serves a fixed list of raw orders with offset paging and a reported
/// total. Errors can be queued per cursor.
pub struct ScriptedSource {
    platform: Platform,
    orders: Vec<Vec<u8>>,
    reported_total: i64,
    token_counter: AtomicUsize,
    token_requests: Mutex<Vec<bool>>,
    fetches: Mutex<Vec<(String, PageCursor)>>,
    failures: Mutex<HashMap<PageCursor, VecDeque<OrderBridgeError>>>,
    token_failure: Mutex<Option<OrderBridgeError>>,
}

impl ScriptedSource {
    pub fn new(platform: Platform, orders: Vec<Vec<u8>>) -> Self {
        let reported_total = i64::try_from(orders.len()).unwrap();
        Self {
            platform,
            orders,
            reported_total,
            token_counter: AtomicUsize::new(0),
            token_requests: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            token_failure: Mutex::new(None),
        }
    }

    /// Report `total` to the engine regardless of how many orders exist.
    pub fn with_reported_total(mut self, total: i64) -> Self {
        self.reported_total = total;
        self
    }

    /// Fail the next fetch of `cursor` with `error`.
    pub fn fail_at(self, cursor: PageCursor, error: OrderBridgeError) -> Self {
        self.failures.lock().entry(cursor).or_default().push_back(error);
        self
    }

    pub fn fail_token_requests(self, error: OrderBridgeError) -> Self {
        *self.token_failure.lock() = Some(error);
        self
    }

    pub fn fetches(&self) -> Vec<(String, PageCursor)> {
        self.fetches.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }

    /// `force_refresh` flag of every token request, in order.
    pub fn token_requests(&self) -> Vec<bool> {
        self.token_requests.lock().clone()
    }
}

#[async_trait]
impl OrderSource for ScriptedSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn access_token(&self, force_refresh: bool) -> Result<String> {
        self.token_requests.lock().push(force_refresh);
        if let Some(err) = self.token_failure.lock().clone() {
            return Err(err);
        }
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }

    async fn fetch_page(
        &self,
        token: &str,
        cursor: &PageCursor,
        _params: &SyncParams,
    ) -> Result<OrderPage> {
        self.fetches.lock().push((token.to_string(), *cursor));
        if let Some(err) = self.failures.lock().get_mut(cursor).and_then(VecDeque::pop_front) {
            return Err(err);
        }

        let PageCursor::Offset { offset, limit } = *cursor else {
            return Err(OrderBridgeError::InvalidInput("scripted source pages by offset".into()));
        };
        let start = usize::try_from(offset).unwrap().min(self.orders.len());
        let end = start.saturating_add(usize::try_from(limit).unwrap()).min(self.orders.len());
        Ok(OrderPage {
            orders: self.orders[start..end].to_vec(),
            info: PageInfo::Offset { offset, limit, total: self.reported_total },
        })
    }
}

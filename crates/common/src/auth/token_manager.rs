//! Token cache with proactive refresh
//!
//! The map lock is only taken to read or replace an entry. The refresh
//! future runs with the lock released, so two concurrent callers that both
//! observe a stale entry may each refresh; the last store wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::types::{CachedToken, IssuedToken, TokenKey};
use crate::time::{Clock, SystemClock};

/// Default proactive refresh margin (5 minutes).
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Per-(provider, endpoint) bearer token cache.
///
/// Failures are never cached: a failed refresh leaves any previous entry in
/// place and the next call tries again.
#[derive(Debug)]
pub struct TokenLifecycleManager {
    entries: Mutex<HashMap<TokenKey, CachedToken>>,
    refresh_margin: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenLifecycleManager {
    #[must_use]
    pub fn new(refresh_margin: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), refresh_margin, clock }
    }

    /// Manager backed by the real clock.
    #[must_use]
    pub fn with_system_clock(refresh_margin: Duration) -> Self {
        Self::new(refresh_margin, Arc::new(SystemClock))
    }

    #[must_use]
    pub const fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    /// Return a usable token for `key`, calling `refresh` when the cached
    /// one is missing or inside the refresh margin.
    ///
    /// # Errors
    /// Returns whatever `refresh` returns on failure.
    pub async fn ensure_valid<F, Fut, E>(&self, key: &TokenKey, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IssuedToken, E>>,
    {
        if let Some(token) = self.get(key) {
            return Ok(token);
        }

        debug!(token_key = %key, "refreshing access token");
        match refresh().await {
            Ok(issued) => Ok(self.store(key.clone(), issued)),
            Err(err) => {
                warn!(token_key = %key, "access token refresh failed");
                Err(err)
            }
        }
    }

    /// Cached token if it is still usable.
    #[must_use]
    pub fn get(&self, key: &TokenKey) -> Option<String> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|cached| cached.is_usable(now, self.refresh_margin))
            .map(|cached| cached.access_token.clone())
    }

    /// Replace the entry for `key` and return its access token.
    pub fn store(&self, key: TokenKey, issued: IssuedToken) -> String {
        let cached = CachedToken::from_issued(issued, self.clock.now());
        let token = cached.access_token.clone();
        self.entries.lock().insert(key, cached);
        token
    }

    /// Drop the entry for `key` so the next [`Self::ensure_valid`] refreshes.
    /// Returns whether an entry was present.
    pub fn invalidate(&self, key: &TokenKey) -> bool {
        let removed = self.entries.lock().remove(key).is_some();
        if removed {
            debug!(token_key = %key, "access token invalidated");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for TokenLifecycleManager {
    fn default() -> Self {
        Self::with_system_clock(DEFAULT_REFRESH_MARGIN)
    }
}

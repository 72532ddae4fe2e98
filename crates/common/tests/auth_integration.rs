//! Integration tests for the token lifecycle manager
//!
//! Exercises the cache the way vendor clients use it: one manager shared by
//! several providers, each refreshing through its own async grant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orderbridge_common::auth::{IssuedToken, TokenKey, TokenLifecycleManager};
use orderbridge_common::time::MockClock;

#[derive(Debug, PartialEq, Eq)]
enum GrantError {
    Rejected(&'static str),
}

/// Stand-in for a vendor token endpoint that numbers every token it issues.
#[derive(Default)]
struct TokenEndpoint {
    issued: AtomicUsize,
}

impl TokenEndpoint {
    async fn grant(&self, prefix: &str, lifetime: Duration) -> Result<IssuedToken, GrantError> {
        tokio::task::yield_now().await;
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedToken::new(format!("{prefix}-{n}"), lifetime))
    }

    fn calls(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

fn manager_with_clock(margin: Duration) -> (TokenLifecycleManager, MockClock) {
    let clock = MockClock::new();
    (TokenLifecycleManager::new(margin, Arc::new(clock.clone())), clock)
}

/// A day-long invoicing token and a six-hour marketplace token share one
/// manager; each refreshes on its own schedule.
#[tokio::test]
async fn providers_refresh_on_independent_schedules() {
    let (manager, clock) = manager_with_clock(Duration::from_secs(300));
    let invoicing = TokenEndpoint::default();
    let marketplace = TokenEndpoint::default();
    let siigo = TokenKey::new("siigo", "https://api.siigo.test#api@store.co");
    let meli = TokenKey::new("mercadolibre", "int-42");

    let day = Duration::from_secs(24 * 3600);
    let six_hours = Duration::from_secs(6 * 3600);

    let first_siigo = manager.ensure_valid(&siigo, || invoicing.grant("siigo", day)).await;
    let first_meli = manager.ensure_valid(&meli, || marketplace.grant("meli", six_hours)).await;
    assert_eq!(first_siigo, Ok("siigo-1".to_string()));
    assert_eq!(first_meli, Ok("meli-1".to_string()));

    // Inside the marketplace token's margin, well before the invoicing one's.
    clock.advance(six_hours - Duration::from_secs(200));

    let siigo_again = manager.ensure_valid(&siigo, || invoicing.grant("siigo", day)).await;
    let meli_again = manager.ensure_valid(&meli, || marketplace.grant("meli", six_hours)).await;
    assert_eq!(siigo_again, Ok("siigo-1".to_string()));
    assert_eq!(meli_again, Ok("meli-2".to_string()));

    assert_eq!(invoicing.calls(), 1);
    assert_eq!(marketplace.calls(), 2);
    assert_eq!(manager.len(), 2);
}

#[tokio::test]
async fn rejected_grant_surfaces_caller_error_and_retries_next_time() {
    let (manager, _clock) = manager_with_clock(Duration::from_secs(60));
    let key = TokenKey::new("siigo", "https://api.siigo.test#ops@store.co");

    let failed: Result<String, GrantError> =
        manager.ensure_valid(&key, || async { Err(GrantError::Rejected("invalid access key")) }).await;
    assert_eq!(failed, Err(GrantError::Rejected("invalid access key")));
    assert!(manager.is_empty());

    let endpoint = TokenEndpoint::default();
    let token = manager.ensure_valid(&key, || endpoint.grant("siigo", Duration::from_secs(3600))).await;
    assert_eq!(token, Ok("siigo-1".to_string()));
}

/// Replaying after a 401: the client drops the entry and the next call
/// fetches a new token even though the old one had not expired.
#[tokio::test]
async fn invalidation_after_unauthorized_forces_new_grant() {
    let manager = TokenLifecycleManager::default();
    let endpoint = TokenEndpoint::default();
    let key = TokenKey::new("siigo", "https://api.siigo.test#api@store.co");
    let lifetime = Duration::from_secs(24 * 3600);

    let first = manager.ensure_valid(&key, || endpoint.grant("siigo", lifetime)).await;
    assert_eq!(first, Ok("siigo-1".to_string()));

    assert!(manager.invalidate(&key));
    assert!(!manager.invalidate(&key));

    let replay = manager.ensure_valid(&key, || endpoint.grant("siigo", lifetime)).await;
    assert_eq!(replay, Ok("siigo-2".to_string()));
    assert_eq!(manager.get(&key).as_deref(), Some("siigo-2"));
}

#[tokio::test]
async fn token_shorter_than_margin_is_refreshed_on_every_call() {
    let (manager, _clock) = manager_with_clock(Duration::from_secs(300));
    let endpoint = TokenEndpoint::default();
    let key = TokenKey::new("vtex", "https://store.vtexcommercestable.com.br");

    for expected in 1..=3 {
        let token = manager.ensure_valid(&key, || endpoint.grant("short", Duration::from_secs(60))).await;
        assert_eq!(token, Ok(format!("short-{expected}")));
    }
    assert_eq!(endpoint.calls(), 3);
}

#[test]
fn stored_token_is_readable_until_margin() {
    let (manager, clock) = manager_with_clock(Duration::from_secs(10));
    let key = TokenKey::new("woocommerce", "https://shop.test");

    let stored = manager.store(key.clone(), IssuedToken::new("ck_live", Duration::from_secs(100)));
    assert_eq!(stored, "ck_live");
    assert_eq!(manager.get(&key).as_deref(), Some("ck_live"));

    clock.advance(Duration::from_secs(90));
    assert_eq!(manager.get(&key), None);
}

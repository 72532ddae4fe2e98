//! Token cache value types

use std::fmt;
use std::time::{Duration, Instant};

/// Cache key: one token per provider and endpoint/account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey {
    pub provider: String,
    pub endpoint: String,
}

impl TokenKey {
    pub fn new(provider: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self { provider: provider.into(), endpoint: endpoint.into() }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.endpoint)
    }
}

/// Token as returned by an authentication endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime relative to the moment the token was received.
    pub expires_in: Duration,
}

impl IssuedToken {
    pub fn new(access_token: impl Into<String>, expires_in: Duration) -> Self {
        Self { access_token: access_token.into(), expires_in }
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Token held in the cache with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    /// Anchor `issued` at `now`.
    #[must_use]
    pub fn from_issued(issued: IssuedToken, now: Instant) -> Self {
        let expires_at = now.checked_add(issued.expires_in).unwrap_or(now);
        Self { access_token: issued.access_token, expires_at }
    }

    /// A token is usable while `now < expires_at - margin`.
    #[must_use]
    pub fn is_usable(&self, now: Instant, margin: Duration) -> bool {
        now.checked_add(margin).is_some_and(|deadline| deadline < self.expires_at)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_strictly_before_margin() {
        let now = Instant::now();
        let token = CachedToken::from_issued(
            IssuedToken::new("abc", Duration::from_secs(3600)),
            now,
        );
        let margin = Duration::from_secs(300);

        assert!(token.is_usable(now, margin));
        assert!(token.is_usable(now + Duration::from_secs(3299), margin));
        assert!(!token.is_usable(now + Duration::from_secs(3300), margin));
    }

    #[test]
    fn token_shorter_than_margin_is_never_usable() {
        let now = Instant::now();
        let token =
            CachedToken::from_issued(IssuedToken::new("abc", Duration::from_secs(60)), now);
        assert!(!token.is_usable(now, Duration::from_secs(300)));
    }

    #[test]
    fn debug_output_hides_token() {
        let issued = IssuedToken::new("secret-value", Duration::from_secs(1));
        assert!(!format!("{issued:?}").contains("secret-value"));
    }
}

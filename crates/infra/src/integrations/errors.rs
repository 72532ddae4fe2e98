//! HTTP status classification shared by all vendor clients
//!
//! Vendor APIs disagree on error bodies but agree on status codes, so the
//! status alone decides the error variant; the body only enriches the
//! message.

use orderbridge_domain::OrderBridgeError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Longest body excerpt carried in an error message.
const BODY_EXCERPT_LIMIT: usize = 512;

/// Map a non-success vendor response onto the domain taxonomy.
///
/// | status | error |
/// |--------|-------|
/// | 401 | `TokenExpired` |
/// | 403 | `Auth` |
/// | 404 | `NotFound` |
/// | 429 | `RateLimited` |
/// | 5xx | `Network` |
/// | other 4xx | `InvalidInput` |
#[must_use]
pub fn classify_status(status: StatusCode, body: &str) -> OrderBridgeError {
    let message = format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status"),
        excerpt(body)
    );

    match status.as_u16() {
        401 => OrderBridgeError::TokenExpired(message),
        403 => OrderBridgeError::Auth(message),
        404 => OrderBridgeError::NotFound(message),
        429 => OrderBridgeError::RateLimited(message),
        400..=499 => OrderBridgeError::InvalidInput(message),
        _ => OrderBridgeError::Network(message),
    }
}

/// Read `response` as JSON, classifying non-success statuses.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, OrderBridgeError> {
    let (status, body) = read_body(response).await?;
    if !status.is_success() {
        return Err(classify_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|err| {
        OrderBridgeError::Serialization(format!("unexpected response shape: {err}"))
    })
}

/// Status and raw body text.
pub(crate) async fn read_body(response: Response) -> Result<(StatusCode, String), OrderBridgeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| OrderBridgeError::Network(format!("failed to read response body: {err}")))?;
    Ok((status, body))
}

fn excerpt(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LIMIT {
        return trimmed;
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_status_family() {
        let cases = [
            (401, "TOKEN_EXPIRED"),
            (403, "AUTHENTICATION_FAILED"),
            (404, "RESOURCE_NOT_FOUND"),
            (429, "RATE_LIMITED"),
            (400, "INVALID_INPUT"),
            (422, "INVALID_INPUT"),
            (500, "NETWORK_ERROR"),
            (503, "NETWORK_ERROR"),
        ];

        for (code, expected) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify_status(status, "").error_code(), expected, "status {code}");
        }
    }

    #[test]
    fn only_401_triggers_refresh() {
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_auth_expired());
        assert!(!classify_status(StatusCode::FORBIDDEN, "").is_auth_expired());
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "ñ".repeat(BODY_EXCERPT_LIMIT);
        let err = classify_status(StatusCode::BAD_REQUEST, &body);
        let message = err.to_string();
        assert!(message.len() < body.len());
        assert!(message.contains("HTTP 400 Bad Request"));
    }
}

//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for OrderBridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OrderBridgeError {
    /// Missing or invalid configuration/credential field. Never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote rejected a bearer token that was previously accepted.
    #[error("Token expired: {0}")]
    TokenExpired(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderBridgeError {
    /// Stable machine-readable code, used in invoice error responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::Auth(_) => "AUTHENTICATION_FAILED",
            Self::TokenExpired(_) => "TOKEN_EXPIRED",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::NotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Network(_) => "NETWORK_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Queue(_) => "QUEUE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when a token refresh followed by one retry may succeed.
    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::TokenExpired(_))
    }

    /// Lowercase label suitable for structured log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::TokenExpired(_) => "token_expired",
            Self::RateLimited(_) => "rate_limited",
            Self::NotFound(_) => "not_found",
            Self::Network(_) => "network",
            Self::InvalidInput(_) => "invalid_input",
            Self::Queue(_) => "queue",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for OrderBridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for OrderBridge operations
pub type Result<T> = std::result::Result<T, OrderBridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_token_expired_is_auth_expired() {
        assert!(OrderBridgeError::TokenExpired("401".into()).is_auth_expired());
        assert!(!OrderBridgeError::Auth("403".into()).is_auth_expired());
        assert!(!OrderBridgeError::Network("reset".into()).is_auth_expired());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(OrderBridgeError::RateLimited("slow down".into())).unwrap();
        assert_eq!(json["type"], "RateLimited");
        assert_eq!(json["message"], "slow down");
    }

    #[test]
    fn error_codes_are_screaming_snake_case() {
        let err = OrderBridgeError::NotFound("invoice".into());
        assert_eq!(err.error_code(), "RESOURCE_NOT_FOUND");
        assert_eq!(err.label(), "not_found");
    }
}

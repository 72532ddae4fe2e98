//! Conversions from external infrastructure errors into domain errors.

use orderbridge_domain::OrderBridgeError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub OrderBridgeError);

impl From<InfraError> for OrderBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<OrderBridgeError> for InfraError {
    fn from(value: OrderBridgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoOrderBridgeError {
    fn into_orderbridge(self) -> OrderBridgeError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → OrderBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoOrderBridgeError for HttpError {
    fn into_orderbridge(self) -> OrderBridgeError {
        if self.is_timeout() {
            return OrderBridgeError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return OrderBridgeError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return OrderBridgeError::Serialization(format!("HTTP body could not be decoded: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => OrderBridgeError::TokenExpired(message),
                403 => OrderBridgeError::Auth(message),
                404 => OrderBridgeError::NotFound(message),
                429 => OrderBridgeError::RateLimited(message),
                400..=499 => OrderBridgeError::InvalidInput(message),
                _ => OrderBridgeError::Network(message),
            };
        }

        OrderBridgeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_orderbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → OrderBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoOrderBridgeError for JsonError {
    fn into_orderbridge(self) -> OrderBridgeError {
        if self.is_io() {
            return OrderBridgeError::Internal(format!("JSON stream failure: {self}"));
        }
        OrderBridgeError::Serialization(format!(
            "invalid JSON at line {} column {}: {}",
            self.line(),
            self.column(),
            self
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_orderbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn status_error(status: StatusCode) -> HttpError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err()
    }

    #[tokio::test]
    async fn http_status_401_maps_to_token_expired() {
        let mapped: OrderBridgeError =
            InfraError::from(status_error(StatusCode::UNAUTHORIZED).await).into();
        match mapped {
            OrderBridgeError::TokenExpired(msg) => assert!(msg.contains("401")),
            other => panic!("expected token expired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_status_429_maps_to_rate_limited() {
        let mapped: OrderBridgeError =
            InfraError::from(status_error(StatusCode::TOO_MANY_REQUESTS).await).into();
        assert!(matches!(mapped, OrderBridgeError::RateLimited(_)));
    }

    #[test]
    fn json_syntax_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{ \"open\": ").unwrap_err();
        let mapped: OrderBridgeError = InfraError::from(err).into();
        match mapped {
            OrderBridgeError::Serialization(msg) => assert!(msg.contains("line 1")),
            other => panic!("expected serialization error, got {other:?}"),
        }
    }
}

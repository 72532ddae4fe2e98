use std::time::Duration;

use orderbridge_domain::OrderBridgeError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Backoff schedule for transient vendor failures.
///
/// Only gateway-side failures are retried: 5xx answers and requests that
/// never got one (connect errors, timeouts). Rate limiting is surfaced to the
/// caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// One attempt, no backoff. For non-idempotent calls such as invoice
    /// creation.
    pub const SINGLE_ATTEMPT: Self =
        Self { max_attempts: 1, base_backoff: Duration::ZERO, max_backoff: Duration::ZERO };

    /// Delay before retry number `retry` (1-based), doubling up to
    /// `max_backoff`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1 << exponent).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

enum Attempt {
    Done(Response),
    Transient(String),
    Failed(OrderBridgeError),
}

/// Shared reqwest client for all vendor adapters.
///
/// Callers build requests with [`HttpClient::request`] and hand them back to
/// [`HttpClient::send`]; the response is returned whatever its status, and
/// mapping the status to an error is left to the vendor client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// # Errors
    /// Returns `OrderBridgeError::Network` when the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, OrderBridgeError> {
        Self::builder().build()
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, retrying transient failures per the client's
    /// [`RetryPolicy`].
    ///
    /// # Errors
    /// The mapped transport error of the last attempt, or `Internal` when a
    /// retry is needed but the body is a stream that cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, OrderBridgeError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if attempt >= attempts {
                return match self.attempt(builder, attempt, true).await {
                    Attempt::Done(response) => Ok(response),
                    Attempt::Failed(err) => Err(err),
                    Attempt::Transient(reason) => Err(OrderBridgeError::Network(reason)),
                };
            }

            let current = builder.try_clone().ok_or_else(|| {
                OrderBridgeError::Internal("streaming request body cannot be retried".into())
            })?;
            match self.attempt(current, attempt, false).await {
                Attempt::Done(response) => return Ok(response),
                Attempt::Failed(err) => return Err(err),
                Attempt::Transient(reason) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, max_attempts = attempts, ?delay, %reason, "retrying vendor request");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, builder: RequestBuilder, attempt: u32, is_last: bool) -> Attempt {
        let request = match builder.build() {
            Ok(request) => request,
            Err(err) => return Attempt::Failed(InfraError::from(err).into()),
        };
        let method = request.method().clone();
        let host = request.url().host_str().unwrap_or_default().to_string();
        let path = request.url().path().to_string();

        match self.inner.execute(request).await {
            Ok(response) if response.status().is_server_error() && !is_last => {
                Attempt::Transient(format!("{} from {host}", response.status()))
            }
            Ok(response) => {
                debug!(attempt, %method, %host, %path, status = %response.status(), "vendor response");
                Attempt::Done(response)
            }
            Err(err) if !is_last && is_transient(&err) => Attempt::Transient(err.to_string()),
            Err(err) => {
                debug!(attempt, %method, %host, %path, error = %err, "vendor request failed");
                Attempt::Failed(InfraError::from(err).into())
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    retry: RetryPolicy,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            user_agent: concat!("orderbridge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// Returns `OrderBridgeError::Network` when reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient, OrderBridgeError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout.min(self.timeout))
            .user_agent(self.user_agent)
            .build()
            .map_err(InfraError::from)?;

        let retry = RetryPolicy { max_attempts: self.retry.max_attempts.max(1), ..self.retry };
        Ok(HttpClient { inner, retry })
    }
}

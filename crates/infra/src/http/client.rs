//! Retrying HTTP transport
//!
//! Each attempt is bounded by the configured timeout on its own, so a slow
//! first attempt still leaves room for the retries behind it. Whether an
//! attempt is retried is decided by [`ApiError::should_retry`] on the error it
//! would have produced, and only for idempotent methods.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use sitegpt_domain::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT_SECS};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::errors::transport_error;

const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// How many times a request may be sent and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` sends in total (at least one)
    #[must_use]
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Send once, never retry
    #[must_use]
    pub fn single_attempt() -> Self {
        Self::new(1)
    }

    /// Delay before the first retry; later retries double it up to the cap
    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max.max(base);
        self
    }

    /// Total sends allowed for idempotent requests
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Attempts allowed for `method`. Non-idempotent requests are sent once.
    fn attempts_for(&self, method: &Method) -> usize {
        if method.is_idempotent() {
            self.max_attempts
        } else {
            1
        }
    }

    /// Wait before retry number `retry` (1-based)
    fn backoff(&self, retry: usize) -> Duration {
        let shift = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.base_backoff.saturating_mul(1u32 << shift).min(self.max_backoff)
    }
}

/// HTTP transport with per-attempt timeouts and policy-driven retries
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    attempt_timeout: Duration,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Start building a new HTTP client.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Timeout applied to every single attempt
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Send the request, retrying transient failures per the [`RetryPolicy`]
    ///
    /// A response is returned as-is unless its status is one
    /// [`ApiError::should_retry`] accepts and attempts remain; in that case it
    /// is discarded and the request sent again. Bodies that cannot be cloned
    /// are sent once.
    ///
    /// # Errors
    /// Returns the [`ApiError`] of the last attempt if none produced a
    /// response
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request =
            builder.build().map_err(|err| transport_error(&err, self.attempt_timeout))?;
        let attempts = self.policy.attempts_for(request.method());
        let method = request.method().clone();
        let url = request.url().clone();

        let mut next = Some(request);
        let mut attempt = 0;
        while let Some(current) = next.take() {
            attempt += 1;
            if attempt < attempts {
                next = current.try_clone();
            }
            let last = next.is_none();

            debug!(attempt, %method, %url, "Sending HTTP request");
            match self.attempt(current).await {
                Ok(response) => {
                    let status = response.status();
                    let transient = !status.is_success()
                        && ApiError::from_status(status, String::new()).should_retry();
                    if last || !transient {
                        debug!(attempt, %method, %url, %status, "Received HTTP response");
                        return Ok(response);
                    }
                    warn!(attempt, %method, %url, %status, "Transient HTTP status, retrying");
                }
                Err(err) => {
                    if last || !err.should_retry() {
                        debug!(attempt, %method, %url, error = %err, "HTTP request failed");
                        return Err(err);
                    }
                    warn!(attempt, %method, %url, error = %err, "HTTP request failed, retrying");
                }
            }

            let delay = self.policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(ApiError::Config(format!("No HTTP attempt was made for {method} {url}")))
    }

    async fn attempt(&self, request: Request) -> Result<Response, ApiError> {
        self.client.execute(request).await.map_err(|err| transport_error(&err, self.attempt_timeout))
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    attempt_timeout: Duration,
    policy: RetryPolicy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            policy: RetryPolicy::default(),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Bound on one attempt, from connect until the body is read
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Retry behaviour for idempotent requests
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `User-Agent` header sent with every request
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns [`ApiError::Config`] if the TLS backend cannot be initialised
    pub fn build(self) -> Result<HttpClient, ApiError> {
        let mut builder = ReqwestClient::builder().timeout(self.attempt_timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, attempt_timeout: self.attempt_timeout, policy: self.policy })
    }
}

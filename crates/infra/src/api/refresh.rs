//! Refresh transport
//!
//! Calls the refresh endpoint on a dedicated single-attempt HTTP client, so
//! the call never carries a bearer token and a 401 from it is never fed back
//! into session recovery.

use async_trait::async_trait;
use reqwest::Method;
use sitegpt_common::auth::{CredentialPair, RefreshError, TokenRefresher};
use sitegpt_domain::{AuthResponse, Config, RefreshRequest};
use tracing::{debug, instrument};

use super::client::{error_message, normalize_base_url};
use super::envelope::parse_body;
use super::errors::ApiError;
use crate::errors::transport_error;
use crate::http::{HttpClient, RetryPolicy};

/// [`TokenRefresher`] that talks to `POST {base_url}{refresh_path}`
#[derive(Clone)]
pub struct RefreshClient {
    http_client: HttpClient,
    url: String,
}

impl RefreshClient {
    /// Create a refresh transport for a fully qualified endpoint URL
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Result<Self, ApiError> {
        let url = url.into();
        url::Url::parse(&url)
            .map_err(|e| ApiError::Config(format!("Invalid refresh URL '{url}': {e}")))?;

        let http_client = HttpClient::builder()
            .attempt_timeout(timeout)
            .retry_policy(RetryPolicy::single_attempt())
            .build()?;

        Ok(Self { http_client, url })
    }

    /// Refresh transport for `{api.base_url}{session.refresh_path}`, bounded
    /// by the session refresh timeout
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if the configured base URL is invalid
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.api.base_url)?;
        Self::new(
            format!("{base_url}{}", config.session.refresh_path),
            config.session.refresh_timeout(),
        )
    }

    /// Fully qualified refresh endpoint
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenRefresher for RefreshClient {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        let body = RefreshRequest { refresh_token: refresh_token.to_string() };
        let request = self.http_client.request(Method::POST, &self.url).json(&body);

        let response = self.http_client.send(request).await.map_err(transport_failure)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(transport_error(&e, self.http_client.attempt_timeout())))?;

        if !status.is_success() {
            debug!(%status, "Refresh endpoint rejected the refresh token");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: error_message(status, &self.url, &bytes),
            });
        }

        let payload = parse_body(&bytes)
            .map_err(|e| RefreshError::InvalidResponse(format!("Invalid JSON: {e}")))?;
        let tokens: AuthResponse = serde_json::from_value(payload)
            .map_err(|e| RefreshError::InvalidResponse(format!("Missing token pair: {e}")))?;

        Ok(CredentialPair::from(tokens))
    }
}

fn transport_failure(err: ApiError) -> RefreshError {
    match err {
        ApiError::Timeout(timeout) => RefreshError::Timeout(timeout),
        other => RefreshError::Transport(other.to_string()),
    }
}

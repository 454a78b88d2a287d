//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use reqwest::StatusCode;
use sitegpt_common::auth::{CredentialStoreError, RefreshError};
use sitegpt_domain::SiteGptError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403) and failed session recovery
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration, storage and local failures - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered 401. Returned as-is for opted-out and already
    /// retried requests, and when there was no refresh token to recover with.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The server answered 403
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The server answered 429
    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    /// Any 5xx response
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other 4xx response
    #[error("Client error {status}: {message}")]
    Client { status: u16, message: String },

    /// No response: connection refused, reset or unreadable body
    #[error("Network error: {0}")]
    Network(String),

    /// The payload did not match the expected type
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Invalid base URL, request or client setup
    #[error("Configuration error: {0}")]
    Config(String),

    /// A transport attempt ran past its timeout
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The credential store could not be read or written
    #[error(transparent)]
    Storage(#[from] CredentialStoreError),

    /// Session recovery failed; credentials were cleared and the login
    /// redirect was issued.
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),
}

impl ApiError {
    /// Build the error for a non-success HTTP response
    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { message },
            StatusCode::FORBIDDEN => Self::Forbidden { message },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit { message },
            s if s.is_server_error() => Self::Server { status: s.as_u16(), message },
            s => Self::Client { status: s.as_u16(), message },
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::Refresh(_) => {
                ApiErrorCategory::Authentication
            }
            Self::RateLimit { .. } => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } | Self::Decode(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Storage(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if the caller may retry this request later
    ///
    /// Authentication failures are final here: recovery already happened
    /// inside the client.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// HTTP status of the response that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::RateLimit { .. } => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the raw 401 of the original request
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<SiteGptError> for ApiError {
    fn from(err: SiteGptError) -> Self {
        match err {
            SiteGptError::Network(message) => Self::Network(message),
            SiteGptError::Auth(message) => Self::Unauthorized { message },
            SiteGptError::Config(message) => Self::Config(message),
            SiteGptError::InvalidInput(message) => Self::Client { status: 400, message },
            SiteGptError::Storage(message) => {
                Self::Storage(CredentialStoreError::AccessFailed(message))
            }
            SiteGptError::Internal(message) => Self::Config(message),
        }
    }
}

impl From<ApiError> for SiteGptError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. } => {
                Self::Auth(err.to_string())
            }
            ApiError::Refresh(inner) => inner.into(),
            ApiError::Storage(inner) => inner.into(),
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::Server { .. } => {
                Self::Network(err.to_string())
            }
            ApiError::RateLimit { .. } | ApiError::Client { .. } | ApiError::Decode(_) => {
                Self::InvalidInput(err.to_string())
            }
            ApiError::Config(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, String::new()).is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad email".into()),
            ApiError::Client { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            ApiError::Server { status: 502, .. }
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()).status(),
            Some(429)
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ApiError::Unauthorized { message: "test".into() }.category(),
            ApiErrorCategory::Authentication
        );
        assert_eq!(
            ApiError::Refresh(RefreshError::MissingRefreshToken).category(),
            ApiErrorCategory::Authentication
        );
        assert_eq!(
            ApiError::RateLimit { message: "test".into() }.category(),
            ApiErrorCategory::RateLimit
        );
        assert_eq!(ApiError::Decode("test".into()).category(), ApiErrorCategory::Client);
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(1)).category(),
            ApiErrorCategory::Network
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::RateLimit { message: "test".into() }.should_retry());
        assert!(ApiError::Server { status: 503, message: "test".into() }.should_retry());
        assert!(ApiError::Network("test".into()).should_retry());
        assert!(!ApiError::Unauthorized { message: "test".into() }.should_retry());
        assert!(!ApiError::Client { status: 404, message: "test".into() }.should_retry());
        assert!(!ApiError::Config("test".into()).should_retry());
    }

    #[test]
    fn test_domain_conversion() {
        let err: SiteGptError = ApiError::Refresh(RefreshError::Transport("reset".into())).into();
        assert!(matches!(err, SiteGptError::Network(_)));

        let err: ApiError = SiteGptError::Network("connection refused".into()).into();
        assert!(matches!(err, ApiError::Network(_)));
    }
}

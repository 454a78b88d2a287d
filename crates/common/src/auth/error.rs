//! Session error types

use std::time::Duration;

use sitegpt_domain::SiteGptError;
use thiserror::Error;

/// Failure reading or writing the persisted credential entries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    #[error("Credential store access failed: {0}")]
    AccessFailed(String),

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

impl From<CredentialStoreError> for SiteGptError {
    fn from(err: CredentialStoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Outcome of a failed refresh attempt
///
/// Cloneable because a single refresh outcome is delivered to every request
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh credential was stored when the refresh started
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status
    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The refresh call never produced a response
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// The refresh endpoint answered but the body had no credential pair
    #[error("Refresh response invalid: {0}")]
    InvalidResponse(String),

    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Storage(#[from] CredentialStoreError),
}

impl RefreshError {
    /// Whether the backend explicitly refused the refresh credential
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<RefreshError> for SiteGptError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Transport(message) => Self::Network(message),
            RefreshError::Timeout(timeout) => {
                Self::Network(format!("refresh timed out after {timeout:?}"))
            }
            RefreshError::Storage(inner) => inner.into(),
            other => Self::Auth(other.to_string()),
        }
    }
}

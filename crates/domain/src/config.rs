//! Configuration structures
//!
//! Every field has a serde default so partial JSON/TOML files and
//! environment-only setups both produce a usable [`Config`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, LOGIN_ROUTE, REFRESH_PATH,
};

/// Root configuration for the dashboard API client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Total transport attempts (initial try + retries) for network errors
    /// and 5xx responses
    pub max_attempts: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    /// Per-attempt request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the credential pair is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Process memory only; credentials are lost on exit
    #[default]
    Memory,
    /// Platform keychain (macOS Keychain, Windows Credential Manager, Secret
    /// Service)
    Keychain,
}

impl std::str::FromStr for CredentialBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "keychain" => Ok(Self::Keychain),
            other => Err(format!("unknown credential backend: {other}")),
        }
    }
}

/// Session and token refresh behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the refresh endpoint, relative to the API base URL
    pub refresh_path: String,
    /// Upper bound on a single refresh call, in seconds
    pub refresh_timeout_secs: u64,
    /// Route handed to the navigator when the session cannot be restored
    pub login_route: String,
    pub credential_backend: CredentialBackend,
    /// Keychain service name used by [`CredentialBackend::Keychain`]
    pub keychain_service: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_path: REFRESH_PATH.to_string(),
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            login_route: LOGIN_ROUTE.to_string(),
            credential_backend: CredentialBackend::default(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl SessionConfig {
    /// Upper bound on one refresh call
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

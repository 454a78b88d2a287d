//! Session credential types

use std::fmt;

use serde::{Deserialize, Serialize};
use sitegpt_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use sitegpt_domain::AuthResponse;

/// Access and refresh credentials issued by the backend
///
/// Both values are opaque to the client. `Debug` redacts them so the pair
/// can be logged as part of larger structures.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived token sent as `Authorization: Bearer <token>`
    pub access_token: String,

    /// Longer-lived token used only against the refresh endpoint
    pub refresh_token: String,
}

impl CredentialPair {
    /// Pair from an access and a refresh token
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl From<AuthResponse> for CredentialPair {
    fn from(response: AuthResponse) -> Self {
        Self::new(response.access_token, response.refresh_token)
    }
}

/// Fixed keys of the persisted credential entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
}

impl CredentialKey {
    pub const ALL: [Self; 2] = [Self::AccessToken, Self::RefreshToken];

    /// Storage key as written to the backing store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => ACCESS_TOKEN_KEY,
            Self::RefreshToken => REFRESH_TOKEN_KEY,
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications published to the application's router/session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh succeeded and new credentials were persisted
    Refreshed,
    /// The session could not be restored; navigate to `route`
    LoginRequired { route: String },
}

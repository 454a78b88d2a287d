//! Traits for credential storage, token refresh and navigation
//!
//! These traits are the seams the session manager is built on. Production
//! code plugs in the keychain store, the HTTP refresh transport and a
//! broadcast navigator; tests plug in the in-memory doubles from
//! `crate::testing`.

use async_trait::async_trait;

use super::error::{CredentialStoreError, RefreshError};
use super::types::{CredentialKey, CredentialPair};

/// Key-value persistence for the credential pair
///
/// Mirrors the browser's local storage: two string entries under fixed keys.
/// Implementations must treat removal of a missing entry as success.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read one entry
    ///
    /// # Returns
    /// `None` when the entry has never been written or was removed
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError>;

    /// Write one entry, replacing any previous value
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written
    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError>;

    /// Remove one entry (idempotent)
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written
    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError>;

    /// Persist both entries of a credential pair
    ///
    /// # Errors
    /// Returns error if either entry cannot be written
    async fn store_pair(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        self.set(CredentialKey::AccessToken, &pair.access_token).await?;
        self.set(CredentialKey::RefreshToken, &pair.refresh_token).await
    }

    /// Remove both entries
    ///
    /// Attempts both removals even if the first fails and reports the first
    /// failure.
    ///
    /// # Errors
    /// Returns error if either entry cannot be removed
    async fn clear(&self) -> Result<(), CredentialStoreError> {
        let access = self.remove(CredentialKey::AccessToken).await;
        let refresh = self.remove(CredentialKey::RefreshToken).await;
        access.and(refresh)
    }
}

/// Exchange a refresh credential for a new credential pair
///
/// Implementations must not route through the authenticated client: the
/// refresh call is neither given a bearer token nor subject to 401 recovery.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Call the refresh endpoint
    ///
    /// # Errors
    /// Returns error if the call fails, is rejected, or the response carries
    /// no credential pair
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError>;
}

/// Navigation side effects of the session lifecycle
///
/// Invoked after the stored credentials have been cleared. Must be safe to
/// call more than once.
pub trait LoginNavigator: Send + Sync {
    fn redirect_to_login(&self);

    /// Called after a refresh persisted new credentials
    fn session_refreshed(&self) {}
}

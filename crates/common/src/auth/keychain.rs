//! Platform keychain credential backend
//!
//! Stores the two credential entries as separate keychain items under one
//! service name (macOS Keychain, Windows Credential Manager, Secret Service
//! on Linux). The item names are the same fixed keys the in-memory store
//! uses, so switching backends does not change the storage contract.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::error::CredentialStoreError;
use super::traits::CredentialStore;
use super::types::CredentialKey;

/// Credential store backed by the platform keychain
pub struct KeychainCredentialStore {
    service_name: String,
}

impl KeychainCredentialStore {
    /// Create a store for a specific keychain service
    ///
    /// # Examples
    /// ```
    /// use sitegpt_common::auth::KeychainCredentialStore;
    ///
    /// let store = KeychainCredentialStore::new("TR-SiteGPT");
    /// assert_eq!(store.service_name(), "TR-SiteGPT");
    /// ```
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Keychain service the entries live under
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: CredentialKey) -> Result<Entry, CredentialStoreError> {
        Entry::new(&self.service_name, key.as_str()).map_err(|e| {
            CredentialStoreError::Unavailable(format!("Failed to open keychain entry {key}: {e}"))
        })
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Reading credential from keychain");

        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialStoreError::AccessFailed(format!(
                "Failed to read {key} from keychain: {e}"
            ))),
        }
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Writing credential to keychain");

        self.entry(key)?.set_password(value).map_err(|e| {
            CredentialStoreError::AccessFailed(format!("Failed to write {key} to keychain: {e}"))
        })
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Removing credential from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialStoreError::AccessFailed(format!(
                "Failed to remove {key} from keychain: {e}"
            ))),
        }
    }
}

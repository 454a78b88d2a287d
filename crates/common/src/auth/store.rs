//! In-memory credential store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::CredentialStoreError;
use super::traits::CredentialStore;
use super::types::{CredentialKey, CredentialPair};

/// Process-local credential store
///
/// The default backend: credentials live as long as the process. Cheap to
/// construct, so tests create one per case.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential pair
    #[must_use]
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let store = Self::new();
        {
            let mut entries = store.entries.write();
            entries.insert(CredentialKey::AccessToken, pair.access_token.clone());
            entries.insert(CredentialKey::RefreshToken, pair.refresh_token.clone());
        }
        store
    }

    /// Synchronous read, for assertions and diagnostics
    #[must_use]
    pub fn snapshot(&self, key: CredentialKey) -> Option<String> {
        self.entries.read().get(&key).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.entries.read().get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        self.entries.write().insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        self.entries.write().remove(&key);
        Ok(())
    }
}

//! Mock implementations of the session traits

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{
    CredentialKey, CredentialPair, CredentialStore, CredentialStoreError, LoginNavigator,
    MemoryCredentialStore, RefreshError, TokenRefresher,
};

/// Memory-backed credential store with call accounting
///
/// # Examples
///
/// ```
/// use sitegpt_common::auth::{CredentialKey, CredentialStore};
/// use sitegpt_common::testing::MockCredentialStore;
///
/// # tokio_test::block_on(async {
/// let store = MockCredentialStore::new();
/// store.set(CredentialKey::AccessToken, "a1").await.unwrap();
/// store.clear().await.unwrap();
/// assert_eq!(store.clear_calls(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockCredentialStore {
    inner: MemoryCredentialStore,
    clear_calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pair(pair: &CredentialPair) -> Self {
        Self { inner: MemoryCredentialStore::with_pair(pair), ..Self::default() }
    }

    /// Make every subsequent operation fail with `AccessFailed`.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.fail.store(should_fail, Ordering::SeqCst);
    }

    /// How many times `clear` ran.
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn snapshot(&self, key: CredentialKey) -> Option<String> {
        self.inner.snapshot(key)
    }

    fn check(&self) -> Result<(), CredentialStoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CredentialStoreError::AccessFailed("mock store failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), CredentialStoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.clear().await
    }
}

/// Refresh transport double with a scripted outcome
#[derive(Debug)]
pub struct MockTokenRefresher {
    outcome: Mutex<Result<CredentialPair, RefreshError>>,
    delay: Duration,
    received: Mutex<Vec<String>>,
}

impl MockTokenRefresher {
    /// Every refresh returns `pair`.
    #[must_use]
    pub fn succeeding(pair: CredentialPair) -> Self {
        Self::with_outcome(Ok(pair))
    }

    /// Every refresh fails with `error`.
    #[must_use]
    pub fn failing(error: RefreshError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<CredentialPair, RefreshError>) -> Self {
        Self { outcome: Mutex::new(outcome), delay: Duration::ZERO, received: Mutex::new(Vec::new()) }
    }

    /// Sleep this long before answering, to keep a refresh in flight.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the scripted outcome.
    pub fn set_outcome(&self, outcome: Result<CredentialPair, RefreshError>) {
        *self.outcome.lock() = outcome;
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.received.lock().len()
    }

    /// Refresh tokens passed to each call, in order.
    #[must_use]
    pub fn received_tokens(&self) -> Vec<String> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        self.received.lock().push(refresh_token.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.outcome.lock().clone()
    }
}

/// Navigator that counts the side effects it was asked to perform
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
    refreshes: AtomicUsize,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl LoginNavigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }

    fn session_refreshed(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

//! Session manager with single-flight token refresh
//!
//! Owns the refresh lock that keeps concurrent 401 recoveries down to one
//! refresh call:
//! - The first caller spawns the refresh as its own task and parks a
//!   [`Shared`] handle to it in the lock slot
//! - Callers arriving while it runs clone the same handle and await it
//! - The task settles even if every caller is dropped; a guard inside it
//!   empties the slot on success, failure or panic
//! - A failed cycle clears stored credentials and redirects once, however
//!   many callers were waiting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::{CredentialStoreError, RefreshError};
use super::traits::{CredentialStore, LoginNavigator, TokenRefresher};
use super::types::{CredentialKey, CredentialPair};

type RefreshOutcome = Result<String, RefreshError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct RefreshState {
    /// Bumped every time a refresh starts
    generation: u64,
    in_flight: Option<SharedRefresh>,
}

/// Empties the lock slot when the refresh it belongs to finishes
struct RefreshRelease {
    state: Arc<Mutex<RefreshState>>,
    generation: u64,
}

impl Drop for RefreshRelease {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.in_flight = None;
        }
    }
}

/// Coordinates credential persistence, refresh and logout for one session
///
/// Construct one per API client. All clones of the client share it through
/// an `Arc`; tests build a fresh one per case.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    navigator: Arc<dyn LoginNavigator>,
    refresh_timeout: Duration,
    state: Arc<Mutex<RefreshState>>,
    refresh_attempts: AtomicU64,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    /// * `store` - Where the credential pair is persisted
    /// * `refresher` - Refresh transport (must bypass the authenticated
    ///   client)
    /// * `navigator` - Redirect-to-login side effect
    /// * `refresh_timeout` - Upper bound on one refresh call; exceeding it
    ///   counts as a failed refresh
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        navigator: Arc<dyn LoginNavigator>,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            store,
            refresher,
            navigator,
            refresh_timeout,
            state: Arc::new(Mutex::new(RefreshState::default())),
            refresh_attempts: AtomicU64::new(0),
        }
    }

    /// The backing credential store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Current access token, if any
    ///
    /// # Errors
    /// Returns error if the credential store cannot be read
    pub async fn access_token(&self) -> Result<Option<String>, CredentialStoreError> {
        self.store.get(CredentialKey::AccessToken).await
    }

    /// Whether an access token is stored
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.access_token().await, Ok(Some(_)))
    }

    /// Persist credentials obtained from a login
    ///
    /// # Errors
    /// Returns error if the credential store cannot be written
    pub async fn establish(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        self.store.store_pair(pair).await?;
        info!("Session credentials stored");
        Ok(())
    }

    /// Clear stored credentials and redirect to login
    ///
    /// Safe to call repeatedly.
    pub async fn logout(&self) {
        end_session(&*self.store, &*self.navigator).await;
    }

    /// Whether a refresh call is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Number of refresh cycles started by this manager
    #[must_use]
    pub fn refresh_attempts(&self) -> u64 {
        self.refresh_attempts.load(Ordering::SeqCst)
    }

    /// Obtain a usable access token after a request was rejected with 401
    ///
    /// Joins the in-flight refresh if there is one. Otherwise, if the store
    /// already holds a different access token than the rejected request
    /// carried, that token is returned without another refresh. Otherwise a
    /// new refresh starts.
    ///
    /// Dropping the returned future does not cancel the refresh.
    ///
    /// # Arguments
    /// * `rejected_token` - Access token the failed request was sent with
    ///
    /// # Returns
    /// The access token to retry with
    ///
    /// # Errors
    /// Returns the refresh failure shared by every caller of this cycle.
    /// [`RefreshError::MissingRefreshToken`] means no network call was made.
    #[instrument(skip_all)]
    pub async fn refresh_credentials(&self, rejected_token: Option<&str>) -> RefreshOutcome {
        let joined = self.state.lock().in_flight.clone();
        if let Some(in_flight) = joined {
            debug!("Joining in-flight token refresh");
            return in_flight.await;
        }

        // An unreadable store falls through to a refresh, which reports it.
        let stored = match self.store.get(CredentialKey::AccessToken).await {
            Ok(stored) => stored,
            Err(err) => {
                debug!(error = %err, "Could not read stored access token");
                None
            }
        };

        let refresh = {
            let mut state = self.state.lock();
            if let Some(in_flight) = state.in_flight.clone() {
                debug!(generation = state.generation, "Joining in-flight token refresh");
                in_flight
            } else {
                let superseded = stored.filter(|current| Some(current.as_str()) != rejected_token);
                if let Some(current) = superseded {
                    debug!("Rejected request carried a superseded token, reusing stored token");
                    return Ok(current);
                }

                state.generation = state.generation.wrapping_add(1);
                let refresh = self.start_refresh(state.generation);
                state.in_flight = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    fn start_refresh(&self, generation: u64) -> SharedRefresh {
        self.refresh_attempts.fetch_add(1, Ordering::SeqCst);
        debug!(generation, "Starting token refresh");

        let store = Arc::clone(&self.store);
        let refresher = Arc::clone(&self.refresher);
        let navigator = Arc::clone(&self.navigator);
        let state = Arc::clone(&self.state);
        let timeout = self.refresh_timeout;

        let task = tokio::spawn(async move {
            let _release = RefreshRelease { state, generation };

            let outcome = run_refresh(&*store, &*refresher, timeout).await;
            match &outcome {
                Ok(_) => {
                    info!(generation, "Access token refreshed");
                    navigator.session_refreshed();
                }
                Err(err) => {
                    warn!(generation, error = %err, "Token refresh failed, ending session");
                    end_session(&*store, &*navigator).await;
                }
            }
            outcome
        });

        async move {
            task.await.unwrap_or_else(|err| {
                Err(RefreshError::Transport(format!("Refresh task did not complete: {err}")))
            })
        }
        .boxed()
        .shared()
    }
}

async fn run_refresh(
    store: &dyn CredentialStore,
    refresher: &dyn TokenRefresher,
    timeout: Duration,
) -> RefreshOutcome {
    let Some(refresh_token) = store.get(CredentialKey::RefreshToken).await? else {
        debug!("No refresh token stored, skipping refresh call");
        return Err(RefreshError::MissingRefreshToken);
    };

    let pair = tokio::time::timeout(timeout, refresher.refresh(&refresh_token))
        .await
        .map_err(|_| RefreshError::Timeout(timeout))??;

    store.store_pair(&pair).await?;
    Ok(pair.access_token)
}

async fn end_session(store: &dyn CredentialStore, navigator: &dyn LoginNavigator) {
    if let Err(err) = store.clear().await {
        warn!(error = %err, "Failed to clear stored credentials");
    }
    navigator.redirect_to_login();
}

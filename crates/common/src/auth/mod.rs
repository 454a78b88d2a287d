//! Bearer-token session management
//!
//! This module owns everything the authenticated API client needs to keep a
//! dashboard session alive: where the credential pair lives, how a refresh
//! is coordinated across concurrent requests, and how the rest of the
//! application learns that the user has to sign in again.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  SessionManager  │  Refresh lock + broadcast completion
//! └────────┬─────────┘
//!          │
//!          ├──► CredentialStore   (access_token / refresh_token entries)
//!          │         ├──► MemoryCredentialStore
//!          │         └──► KeychainCredentialStore  (platform feature)
//!          │
//!          ├──► TokenRefresher    (POST /auth/refresh, outside the
//!          │                       interceptor chain)
//!          │
//!          └──► LoginNavigator    (redirect-to-login side effect)
//!                    └──► BroadcastNavigator → SessionEvent subscribers
//! ```
//!
//! # Refresh coordination
//!
//! At most one refresh call is in flight per [`SessionManager`]. The first
//! request that needs a refresh starts it; every request that fails while it
//! is running joins the same shared future and receives the same outcome.
//! When the refresh fails (or there is no refresh credential to use) the
//! stored credentials are cleared and the navigator is told to show the
//! login route, once per failed cycle.
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use sitegpt_common::auth::{
//!     BroadcastNavigator, CredentialPair, MemoryCredentialStore, SessionManager, TokenRefresher,
//! };
//!
//! async fn example(refresher: Arc<dyn TokenRefresher>) -> Result<(), Box<dyn std::error::Error>> {
//!     let navigator = Arc::new(BroadcastNavigator::new("/login"));
//!     let mut events = navigator.subscribe();
//!
//!     let session = SessionManager::new(
//!         Arc::new(MemoryCredentialStore::new()),
//!         refresher,
//!         navigator,
//!         Duration::from_secs(10),
//!     );
//!
//!     session.establish(&CredentialPair::new("a1", "r1")).await?;
//!
//!     // After a 401 for a request that carried "a1":
//!     let fresh = session.refresh_credentials(Some("a1")).await?;
//!     println!("retrying with {} chars of token", fresh.len());
//!
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("session event: {event:?}");
//!         }
//!     });
//!     Ok(())
//! }
//! ```

mod error;
#[cfg(feature = "platform")]
mod keychain;
pub mod navigator;
pub mod session;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{CredentialStoreError, RefreshError};
#[cfg(feature = "platform")]
pub use keychain::KeychainCredentialStore;
pub use navigator::BroadcastNavigator;
pub use session::SessionManager;
pub use store::MemoryCredentialStore;
pub use traits::{CredentialStore, LoginNavigator, TokenRefresher};
pub use types::{CredentialKey, CredentialPair, SessionEvent};

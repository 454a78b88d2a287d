//! Testing utilities and helpers
//!
//! In-memory doubles for the session seams:
//! - **[`mocks::MockCredentialStore`]**: memory store that counts clears and
//!   can be switched into a failing mode
//! - **[`mocks::MockTokenRefresher`]**: scripted refresh outcome with an
//!   optional delay, recording every call
//! - **[`mocks::RecordingNavigator`]**: counts redirect-to-login calls
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use sitegpt_common::auth::{CredentialPair, SessionManager};
//! use sitegpt_common::testing::{MockCredentialStore, MockTokenRefresher, RecordingNavigator};
//!
//! let navigator = Arc::new(RecordingNavigator::new());
//! let session = SessionManager::new(
//!     Arc::new(MockCredentialStore::new()),
//!     Arc::new(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))),
//!     navigator.clone(),
//!     Duration::from_secs(1),
//! );
//! assert!(!session.is_refreshing());
//! assert_eq!(navigator.redirects(), 0);
//! ```

pub mod mocks;

pub use mocks::{MockCredentialStore, MockTokenRefresher, RecordingNavigator};

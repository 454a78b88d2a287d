//! Session plumbing shared across SiteGPT crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: credential types and errors
//! - `runtime`: credential stores, session manager, navigation events
//!   (default)
//! - `platform`: platform keychain credential backend
//! - `test-utils`: mock refreshers, navigators and stores for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::KeychainCredentialStore;
#[cfg(feature = "runtime")]
pub use auth::{
    BroadcastNavigator, CredentialKey, CredentialPair, CredentialStore, CredentialStoreError,
    LoginNavigator, MemoryCredentialStore, RefreshError, SessionEvent, SessionManager,
    TokenRefresher,
};

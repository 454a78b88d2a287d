//! Dashboard API client for SiteGPT
//!
//! This module provides the authenticated HTTP client every dashboard call
//! goes through, the refresh transport it recovers sessions with, and the
//! session endpoints built on top of it.
//!
//! # Architecture
//!
//! - Uses the retrying [`HttpClient`](crate::http::HttpClient) (no direct
//!   reqwest at call sites)
//! - Bearer token attached from the session's credential store
//! - `{ data, status }` envelopes unwrapped before deserialization
//! - 401 recovery delegated to `SessionManager` (single-flight refresh)
//! - Refresh transport on its own client, outside the recovery path

pub mod auth;
pub mod client;
pub mod envelope;
pub mod errors;
pub mod refresh;
pub mod request;

pub use auth::AuthApi;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use envelope::unwrap_envelope;
pub use errors::{ApiError, ApiErrorCategory};
pub use refresh::RefreshClient;
pub use request::ApiRequest;

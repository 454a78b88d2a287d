//! # SiteGPT Infrastructure
//!
//! I/O side of the dashboard session client.
//!
//! This crate contains:
//! - The retrying HTTP transport
//! - The authenticated API client (bearer token, envelope unwrap, 401
//!   recovery) and the session endpoints
//! - The refresh transport implementing `TokenRefresher`
//! - Configuration loading and the tracing bootstrap
//!
//! ## Architecture
//! - Implements traits defined in `sitegpt-common`
//! - Depends on `sitegpt-domain` for errors, configuration and wire types
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sitegpt_common::auth::BroadcastNavigator;
//! use sitegpt_domain::LoginRequest;
//! use sitegpt_infra::api::{ApiClient, AuthApi};
//! use sitegpt_infra::{config, observability};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! observability::init_tracing(observability::LogFormat::from_env())?;
//! let config = config::load()?;
//!
//! let navigator = Arc::new(BroadcastNavigator::new(config.session.login_route.clone()));
//! let mut events = navigator.subscribe();
//! let client = ApiClient::from_config(&config, navigator)?;
//!
//! let auth = AuthApi::new(client.clone());
//! auth.login(&LoginRequest { email: "owner@example.com".into(), password: "secret".into() })
//!     .await?;
//!
//! let bots: serde_json::Value = client.get("/bots").await?;
//! println!("{bots}");
//! # let _ = events.try_recv();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiError, ApiRequest, AuthApi, RefreshClient};
pub use http::{HttpClient, HttpClientBuilder, RetryPolicy};

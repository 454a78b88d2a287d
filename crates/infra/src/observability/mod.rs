//! Tracing bootstrap
//!
//! Library code only emits `tracing` events; binaries and integration tests
//! call [`init_tracing`] once to install a subscriber. Filtering follows
//! `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Access and refresh tokens
//! are never recorded as fields.

use sitegpt_domain::{Result, SiteGptError};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info,sitegpt_common=info,sitegpt_infra=info,reqwest=warn";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event
    #[default]
    Compact,
    /// One JSON object per event, for log shippers
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON output; anything else is compact
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Install the global tracing subscriber
///
/// # Errors
/// Returns `SiteGptError::Internal` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Compact => {
            registry.with(tracing_subscriber::fmt::layer().compact().with_target(true)).try_init()
        }
    };

    installed.map_err(|e| SiteGptError::Internal(format!("Failed to install tracing subscriber: {e}")))
}

//! Conversions from external infrastructure errors into API errors.

use std::time::Duration;

use reqwest::Error as HttpError;

use crate::api::ApiError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

/// Classify a transport failure
///
/// `timeout` is the per-attempt bound the request ran under; reqwest does not
/// report which limit fired.
pub(crate) fn transport_error(err: &HttpError, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout(timeout);
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return ApiError::Network(format!("HTTP connection failure: {err}"));
    }

    if err.is_builder() {
        return ApiError::Config(format!("Invalid HTTP request: {err}"));
    }

    if err.is_decode() || err.is_body() {
        return ApiError::Network(format!("HTTP response body could not be read: {err}"));
    }

    if let Some(status) = err.status() {
        return ApiError::from_status(status, err.to_string());
    }

    ApiError::Network(format!("HTTP request failed: {err}"))
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

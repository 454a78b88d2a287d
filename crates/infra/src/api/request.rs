//! Request descriptor for the authenticated client

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// One logical API request
///
/// Carries the per-request markers the response handling consults:
/// `skip_auth_redirect` surfaces a 401 to the caller untouched, and
/// `retried` marks a request that was already replayed after a refresh.
///
/// # Examples
///
/// ```
/// use sitegpt_infra::api::ApiRequest;
///
/// let request = ApiRequest::get("/bots").query("page", "2").skip_auth_redirect();
/// assert_eq!(request.path, "/bots");
/// assert!(request.skip_auth_redirect);
/// assert!(!request.is_retry());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/bots`
    pub path: String,
    /// Query string pairs, appended in order
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Surface a 401 to the caller instead of refreshing
    pub skip_auth_redirect: bool,
    pub(crate) retried: bool,
}

impl ApiRequest {
    /// Request with no query, body or markers
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            skip_auth_redirect: false,
            retried: false,
        }
    }

    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] if `body` cannot be serialized
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append a query string pair
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Surface a 401 directly instead of refreshing and redirecting
    #[must_use]
    pub fn skip_auth_redirect(mut self) -> Self {
        self.skip_auth_redirect = true;
        self
    }

    /// Whether this request was already replayed after a refresh
    #[must_use]
    pub fn is_retry(&self) -> bool {
        self.retried
    }
}

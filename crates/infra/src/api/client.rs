//! Authenticated API client
//!
//! Every request goes through the same two stages:
//! - **Outbound**: the stored access token, if any, is attached as
//!   `Authorization: Bearer <token>`
//! - **Inbound**: success bodies are unwrapped from the `{ data, status }`
//!   envelope; a 401 hands control to the [`SessionManager`], which refreshes
//!   once for all concurrent failures, and the request is replayed once with
//!   the new token

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sitegpt_common::auth::{
    CredentialStore, KeychainCredentialStore, LoginNavigator, MemoryCredentialStore, RefreshError,
    SessionManager,
};
use sitegpt_domain::{ApiConfig, Config, CredentialBackend};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::envelope::parse_body;
use super::errors::ApiError;
use super::refresh::RefreshClient;
use super::request::ApiRequest;
use crate::errors::transport_error;
use crate::http::{HttpClient, RetryPolicy};

const USER_AGENT: &str = concat!("sitegpt-infra/", env!("CARGO_PKG_VERSION"));

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "http://localhost:8000/api/v1")
    pub base_url: String,
    /// Timeout for each transport attempt
    pub timeout: Duration,
    /// Transport attempts per request (initial try + retries)
    pub max_attempts: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
        }
    }
}

/// API client with bearer authentication and coordinated token refresh
///
/// Cheap to clone; clones share the transport and the session.
#[derive(Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    session: Arc<SessionManager>,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `session` - Session manager owning credentials and the refresh lock
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created
    pub fn new(config: ApiClientConfig, session: Arc<SessionManager>) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)?;

        let http_client = HttpClient::builder()
            .attempt_timeout(config.timeout)
            .retry_policy(RetryPolicy::new(config.max_attempts))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http_client, session, base_url })
    }

    /// Wire a client from loaded configuration
    ///
    /// Picks the credential backend, builds the refresh transport and the
    /// session manager. `navigator` receives the redirect-to-login side
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns error if either HTTP client cannot be built
    pub fn from_config(
        config: &Config,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Result<Self, ApiError> {
        let store: Arc<dyn CredentialStore> = match config.session.credential_backend {
            CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
            CredentialBackend::Keychain => {
                Arc::new(KeychainCredentialStore::new(&config.session.keychain_service))
            }
        };
        let refresher = Arc::new(RefreshClient::from_config(config)?);

        let session = Arc::new(SessionManager::new(
            store,
            refresher,
            navigator,
            config.session.refresh_timeout(),
        ));

        info!(
            base_url = %config.api.base_url,
            backend = ?config.session.credential_backend,
            "API client configured"
        );
        Self::new(ApiClientConfig::from(&config.api), session)
    }

    /// Create a builder for fluent configuration
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Session shared by every clone of this client
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Execute a request and deserialize the unwrapped payload
    ///
    /// # Errors
    ///
    /// Returns error if request fails or the payload does not match `T`
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let value = self.execute_value(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Execute a request and return the unwrapped payload as JSON
    ///
    /// A 401 is recovered from at most once per request, and only when the
    /// request did not opt out with `skip_auth_redirect`. If there was no
    /// refresh token to recover with, the original 401 is returned after
    /// the session was ended.
    ///
    /// # Errors
    ///
    /// Returns the response error, or [`ApiError::Refresh`] if recovery
    /// failed
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute_value(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
        let token = self.session.access_token().await?;

        match self.dispatch(&request, token.as_deref()).await {
            Err(err) if err.is_unauthorized() && !request.skip_auth_redirect && !request.retried => {
                request.retried = true;
                debug!("Request unauthorized, recovering session");

                match self.session.refresh_credentials(token.as_deref()).await {
                    Ok(fresh) => {
                        debug!("Replaying request with refreshed token");
                        self.dispatch(&request, Some(&fresh)).await
                    }
                    Err(RefreshError::MissingRefreshToken) => Err(err),
                    Err(refresh_err) => Err(ApiError::Refresh(refresh_err)),
                }
            }
            other => other,
        }
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.http_client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.http_client.send(builder).await?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e, self.http_client.attempt_timeout()))?;

        if !status.is_success() {
            let message = error_message(status, &url, &bytes);
            if status.is_server_error() {
                warn!(%status, "Server returned error");
            } else {
                debug!(%status, "Request rejected");
            }
            return Err(ApiError::from_status(status, message));
        }

        parse_body(&bytes).map_err(|e| ApiError::Decode(format!("Invalid JSON response: {e}")))
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    session: Option<Arc<SessionManager>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    #[must_use]
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session manager
    #[must_use]
    pub fn session(mut self, session: Arc<SessionManager>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session =
            self.session.ok_or_else(|| ApiError::Config("Session manager not set".to_string()))?;

        ApiClient::new(config, session)
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> Result<String, ApiError> {
    Url::parse(base_url)
        .map_err(|e| ApiError::Config(format!("Invalid base URL '{base_url}': {e}")))?;
    Ok(base_url.trim_end_matches('/').to_string())
}

/// Prefer the backend's `detail`/`message` field over the raw body
pub(crate) fn error_message(status: StatusCode, url: &str, body: &[u8]) -> String {
    let parsed = serde_json::from_slice::<Value>(body).ok();
    let detail = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error"].iter().find_map(|key| v.get(key)?.as_str())
    });

    match detail {
        Some(detail) => detail.to_string(),
        None if body.is_empty() => format!("{url} returned status {status}"),
        None => format!("{url} returned status {status}: {}", String::from_utf8_lossy(body)),
    }
}

#[cfg(test)]
mod tests {
    use sitegpt_common::auth::{CredentialKey, CredentialPair};
    use sitegpt_common::testing::{MockCredentialStore, MockTokenRefresher, RecordingNavigator};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct Fixture {
        server: MockServer,
        store: Arc<MockCredentialStore>,
        refresher: Arc<MockTokenRefresher>,
        navigator: Arc<RecordingNavigator>,
        client: ApiClient,
    }

    async fn fixture(refresher: MockTokenRefresher) -> Fixture {
        fixture_with(refresher, |_| {}).await
    }

    async fn fixture_with(
        refresher: MockTokenRefresher,
        tune: impl FnOnce(&mut ApiClientConfig),
    ) -> Fixture {
        let server = MockServer::start().await;
        let store = Arc::new(MockCredentialStore::with_pair(&CredentialPair::new("a1", "r1")));
        let refresher = Arc::new(refresher);
        let navigator = Arc::new(RecordingNavigator::new());
        let session = Arc::new(SessionManager::new(
            store.clone(),
            refresher.clone(),
            navigator.clone(),
            Duration::from_secs(5),
        ));
        let mut config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        tune(&mut config);
        let client = ApiClient::new(config, session).unwrap();

        Fixture { server, store, refresher, navigator, client }
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Bot {
        id: u32,
    }

    #[tokio::test]
    async fn test_attaches_bearer_token_and_unwraps_envelope() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("GET"))
            .and(path("/bots"))
            .and(header("Authorization", "Bearer a1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": [{ "id": 1 }], "status": "success" })),
            )
            .mount(&f.server)
            .await;

        let bots: Vec<Bot> = f.client.get("/bots").await.unwrap();
        assert_eq!(bots, vec![Bot { id: 1 }]);
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization_header() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;
        f.store.clear().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 7 })))
            .mount(&f.server)
            .await;

        let bot: Bot = f.client.get("/public").await.unwrap();
        assert_eq!(bot, Bot { id: 7 });

        let requests = f.server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_query_parameters_are_sent() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("POST"))
            .and(path("/ingest/file"))
            .and(query_param("bot_id", "42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&f.server)
            .await;

        let request = ApiRequest::post("/ingest/file").query("bot_id", "42");
        f.client.execute::<()>(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_401_refreshes_and_replays() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("GET"))
            .and(path("/bots"))
            .and(header("Authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&f.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bots"))
            .and(header("Authorization", "Bearer a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&f.server)
            .await;

        let bots: Vec<Bot> = f.client.get("/bots").await.unwrap();

        assert!(bots.is_empty());
        assert_eq!(f.refresher.calls(), 1);
        assert_eq!(f.store.snapshot(CredentialKey::AccessToken).as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_skip_auth_redirect_surfaces_401() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "detail": "Incorrect email or password" })),
            )
            .mount(&f.server)
            .await;

        let request = ApiRequest::post("/auth/login").skip_auth_redirect();
        let err = f.client.execute::<Value>(request).await.unwrap_err();

        match err {
            ApiError::Unauthorized { message } => {
                assert_eq!(message, "Incorrect email or password");
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
        assert_eq!(f.refresher.calls(), 0);
        assert_eq!(f.navigator.redirects(), 0);
        assert_eq!(f.store.snapshot(CredentialKey::AccessToken).as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_refreshed_again() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("GET"))
            .and(path("/bots"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&f.server)
            .await;

        let err = f.client.get::<Value>("/bots").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(f.refresher.calls(), 1);
        assert_eq!(f.navigator.redirects(), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_returns_original_401() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;
        f.store.remove(CredentialKey::RefreshToken).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/bots"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&f.server)
            .await;

        let err = f.client.get::<Value>("/bots").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(f.refresher.calls(), 0);
        assert_eq!(f.navigator.redirects(), 1);
        assert_eq!(f.store.snapshot(CredentialKey::AccessToken), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_returns_refresh_error() {
        let f = fixture(MockTokenRefresher::failing(RefreshError::Rejected {
            status: 401,
            message: "expired".into(),
        }))
        .await;

        Mock::given(method("GET"))
            .and(path("/bots"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&f.server)
            .await;

        let err = f.client.get::<Value>("/bots").await.unwrap_err();

        assert!(matches!(err, ApiError::Refresh(RefreshError::Rejected { status: 401, .. })));
        assert_eq!(f.navigator.redirects(), 1);
        assert_eq!(f.store.snapshot(CredentialKey::RefreshToken), None);
    }

    #[tokio::test]
    async fn test_non_auth_errors_are_classified() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
            .mount(&f.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&f.server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/bots/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({ "detail": "Bot not found" })))
            .mount(&f.server)
            .await;

        assert!(matches!(
            f.client.get::<Value>("/limited").await.unwrap_err(),
            ApiError::RateLimit { .. }
        ));
        assert!(matches!(
            f.client.get::<Value>("/error").await.unwrap_err(),
            ApiError::Server { status: 500, .. }
        ));
        match f.client.delete::<Value>("/bots/9").await.unwrap_err() {
            ApiError::Client { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Bot not found");
            }
            other => panic!("expected client error, got {other:?}"),
        }
        assert_eq!(f.refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_retried() {
        let f = fixture_with(
            MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2")),
            |config| {
                config.timeout = Duration::from_millis(200);
                config.max_attempts = 3;
            },
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/bots"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": [{ "id": 1 }] }))
                    .set_delay(Duration::from_millis(400)),
            )
            .up_to_n_times(1)
            .mount(&f.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bots"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [{ "id": 2 }] })),
            )
            .mount(&f.server)
            .await;

        let bots: Vec<Bot> = f.client.get("/bots").await.unwrap();

        assert_eq!(bots, vec![Bot { id: 2 }]);
        assert_eq!(f.server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_timeout_is_reported() {
        let f = fixture_with(
            MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2")),
            |config| config.timeout = Duration::from_millis(100),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
            .mount(&f.server)
            .await;

        let err = f.client.get::<Value>("/slow").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(t) if t == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_payload_shape_mismatch_is_decode_error() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;

        Mock::given(method("GET"))
            .and(path("/bots/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": "nope" })))
            .mount(&f.server)
            .await;

        assert!(matches!(f.client.get::<Bot>("/bots/1").await.unwrap_err(), ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced() {
        let f = fixture(MockTokenRefresher::succeeding(CredentialPair::new("a2", "r2"))).await;
        f.store.set_should_fail(true);

        let err = f.client.get::<Value>("/bots").await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }

    #[test]
    fn test_builder_missing_session() {
        assert!(matches!(ApiClient::builder().build(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(normalize_base_url("not a url"), Err(ApiError::Config(_))));
        assert_eq!(
            normalize_base_url("http://localhost:8000/api/v1/").unwrap(),
            "http://localhost:8000/api/v1"
        );
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let msg = error_message(StatusCode::BAD_REQUEST, "http://x/y", br#"{"detail":"bad"}"#);
        assert_eq!(msg, "bad");

        let msg = error_message(StatusCode::BAD_REQUEST, "http://x/y", b"");
        assert_eq!(msg, "http://x/y returned status 400 Bad Request");
    }
}

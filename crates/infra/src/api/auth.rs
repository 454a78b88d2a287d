//! Session endpoints
//!
//! Login, registration and account calls, all routed through the
//! authenticated [`ApiClient`] so they share its token handling.

use sitegpt_common::auth::CredentialPair;
use sitegpt_domain::constants::{CURRENT_USER_PATH, LOGIN_PATH, REGISTER_PATH};
use sitegpt_domain::{AuthResponse, LoginRequest, RegisterRequest, UpdateUserRequest, User};
use tracing::{info, instrument};

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::ApiRequest;

/// Account and session operations
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    /// Session endpoints on top of `client`
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange email and password for a credential pair and persist it
    ///
    /// Sent with `skip_auth_redirect`: wrong credentials come back as
    /// [`ApiError::Unauthorized`] instead of ending the session.
    ///
    /// # Errors
    /// Returns error if the backend rejects the login or the pair cannot be
    /// stored
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self
            .client
            .execute(ApiRequest::post(LOGIN_PATH).json(request)?.skip_auth_redirect())
            .await?;

        self.client.session().establish(&CredentialPair::from(response.clone())).await?;
        info!("Logged in");
        Ok(response)
    }

    /// Create an account. No credentials are issued; log in afterwards.
    ///
    /// # Errors
    /// Returns error if the backend rejects the registration
    #[instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.client.post(REGISTER_PATH, request).await
    }

    /// Fetch the signed-in user (`GET /users/me`)
    ///
    /// # Errors
    /// Returns error if the request fails
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get(CURRENT_USER_PATH).await
    }

    /// Update the signed-in user (`PATCH /users/me`)
    ///
    /// # Errors
    /// Returns error if the request fails
    pub async fn update_user(&self, update: &UpdateUserRequest) -> Result<User, ApiError> {
        self.client.patch(CURRENT_USER_PATH, update).await
    }

    /// Clear stored credentials and redirect to login
    pub async fn logout(&self) {
        self.client.session().logout().await;
        info!("Logged out");
    }

    /// Whether an access token is stored
    pub async fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated().await
    }
}

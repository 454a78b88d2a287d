//! Application constants
//!
//! Storage keys and endpoint paths shared by the session client and its
//! collaborators (login screen, router).

// Persisted credential keys
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

// Endpoints
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const CURRENT_USER_PATH: &str = "/users/me";

// Navigation
pub const LOGIN_ROUTE: &str = "/login";

// Transport defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

// Keychain service used by the platform credential backend
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "TR-SiteGPT";

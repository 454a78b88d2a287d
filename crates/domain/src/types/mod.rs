//! Wire types exchanged with the dashboard backend

pub mod auth;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use user::{UpdateUserRequest, User};

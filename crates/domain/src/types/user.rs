//! Dashboard account types

use serde::{Deserialize, Serialize};

/// Account returned by `GET /users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub plan_type: String,
    pub created_at: String,
}

/// Body of `PATCH /users/me`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

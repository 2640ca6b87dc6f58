//! Admin user model.

use serde::{Deserialize, Serialize};

use super::PermissionMatrix;

/// Id of the root admin. It always holds every permission and is excluded from
/// permission edits and deletion.
pub const ROOT_USER_ID: i64 = 1;

/// An admin dashboard user. The password hash never leaves the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub permissions: PermissionMatrix,
    pub created_at: String,
}

impl User {
    pub fn is_root(&self) -> bool {
        self.id == ROOT_USER_ID
    }
}

/// Request body for `POST /api/users/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
}

/// Response body for `GET /api/users/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Request body for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub permissions: PermissionMatrix,
}

/// Request body for `PUT /api/users/updatePassword/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Request body for `PUT /api/users/updateUserPermissions/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub permissions: PermissionMatrix,
}

/// Plain acknowledgement returned by actions without a domain object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

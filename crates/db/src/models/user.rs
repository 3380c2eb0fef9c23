//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unilib_core::error::CoreError;
use unilib_core::roles::Role;
use unilib_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub university_id: String,
    pub phone: String,
    pub address: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Parsed role. The CHECK constraint makes failure an internal error.
    pub fn role(&self) -> Result<Role, CoreError> {
        self.role
            .parse()
            .map_err(|_| CoreError::Internal(format!("user {} has unknown role", self.id)))
    }

    /// "First Last", falling back to the username when both are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub university_id: String,
    pub phone: String,
    pub address: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            university_id: user.university_id.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. The password is already hashed.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub university_id: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// DTO for updating an existing user. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub university_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Minimal contact info used by the notifier.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserContact {
    pub id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl UserContact {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

impl From<&User> for UserContact {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name(),
            role: user.role.clone(),
        }
    }
}

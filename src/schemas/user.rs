use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RegisterRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub(crate) username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters long"))]
    pub(crate) password: String,
}

/// Login accepts either an email or a username in the same field.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1, message = "email or username is required"))]
    pub(crate) identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminUserCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) username: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters long"))]
    pub(crate) password: String,
    #[serde(default = "default_user_role")]
    pub(crate) role: UserRole,
}

impl AdminUserCreate {
    /// Explicit username, or the local part of the email.
    pub(crate) fn resolved_username(&self) -> String {
        match self.username.as_deref().map(str::trim) {
            Some(username) if !username.is_empty() => username.to_string(),
            _ => self.email.split('@').next().unwrap_or_default().trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) created_by_admin: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: crate::db::models::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
            created_by_admin: user.created_by_admin,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) message: String,
    pub(crate) role: UserRole,
    pub(crate) user: UserResponse,
}

fn default_user_role() -> UserRole {
    UserRole::Student
}

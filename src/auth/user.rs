//! User domain models and data structures.
//!
//! The stored account, its cache snapshot, and the request/response DTOs of the
//! auth endpoints. The password hash never leaves the process: `UserResponse`
//! is the only serialized view of an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::models::Role;

/// Database identifier of a user
pub type UserId = i64;

/// Stored representation of a user account.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("is_verified", &self.is_verified)
            .field("avatar_url", &self.avatar_url)
            .field("role", &self.role)
            .finish()
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// New user creation payload. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Snapshot of a user as held in the user cache.
///
/// Built only from a [`User`] and turned back into one; there is no other way
/// in or out, so the cached shape cannot drift from the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachedUser {
    id: UserId,
    email: String,
    username: String,
    password_hash: String,
    is_verified: bool,
    avatar_url: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CachedUser {
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&User> for CachedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            is_verified: user.is_verified,
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<CachedUser> for User {
    fn from(cached: CachedUser) -> Self {
        Self {
            id: cached.id,
            email: cached.email,
            username: cached.username,
            password_hash: cached.password_hash,
            is_verified: cached.is_verified,
            avatar_url: cached.avatar_url,
            role: cached.role,
            created_at: cached.created_at,
            updated_at: cached.updated_at,
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_verified: user.is_verified,
            avatar_url: user.avatar_url.clone(),
            role: user.role,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// Request to create a new account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// OAuth2-style password form. `username` carries the email address.
/// Malformed credentials fail like wrong ones, so the form is not validated.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer".to_string() }
    }
}

/// Request a password reset link. Unknown and malformed addresses get the
/// same answer as registered ones.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResetRequest {
    pub email: String,
}

/// Redeem a reset token for a new password.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Change another user's role. The raw string is parsed into [`Role`] by the handler.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleUpdateRequest {
    pub role: String,
}

/// Generic confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

/// Result of an avatar upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvatarResponse {
    pub avatar_url: String,
}

#[cfg(test)]
pub(crate) fn sample_user(id: UserId, email: &str) -> User {
    let now = Utc::now();
    User {
        id,
        email: email.to_string(),
        username: "sample".to_string(),
        password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
        is_verified: false,
        avatar_url: None,
        role: Role::User,
        created_at: now,
        updated_at: now,
    }
}

//! Authentication and account management.
//!
//! Password hashing, bearer tokens, the user cache, password reset tokens and
//! the gateway that ties them to the user directory.

pub mod authorization;
pub mod gateway;
pub mod hashing;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod reset_ledger;
pub mod user;
pub mod user_cache;

pub use authorization::{require_admin, require_admin_or_self};
pub use gateway::{AuthGateway, UserPage};
pub use hashing::PasswordHasher;
pub use jwt::{Claims, TokenCodec};
pub use middleware::{authenticate, bearer_token, AuthGatewayState};
pub use models::{AuthContext, Role, RoleParseError};
pub use reset_ledger::ResetLedger;
pub use user::{
    AvatarResponse, CachedUser, LoginForm, MessageResponse, NewUser, ResetPasswordRequest,
    ResetRequest, RoleUpdateRequest, SignupRequest, TokenResponse, User, UserId, UserResponse,
};
pub use user_cache::UserCache;

//! Account endpoints: signup, login, email verification, password reset and
//! the current user.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Form, Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::auth::models::AuthContext;
use crate::auth::user::{
    LoginForm, MessageResponse, ResetPasswordRequest, ResetRequest, SignupRequest, TokenResponse,
    UserResponse,
};

/// Sent for every reset request, registered email or not
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct VerifyQuery {
    pub token: String,
}

/// Register a new account
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
))]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn signup_handler(
    State(state): State<ApiState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.auth.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange form credentials for a bearer token
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/login",
    request_body(content_type = "application/x-www-form-urlencoded", description = "username=<email>&password=<password>"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
))]
#[instrument(skip(state, form), fields(email = %form.username))]
pub async fn login_handler(
    State(state): State<ApiState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    Ok(Json(state.auth.login(form).await?))
}

/// Confirm an email address
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
))]
#[instrument(skip(state, query))]
pub async fn verify_email_handler(
    State(state): State<ApiState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.verify_email(&query.token).await?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// The authenticated account
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 429, description = "Rate limit exceeded")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
))]
pub async fn me_handler(Extension(context): Extension<AuthContext>) -> Json<UserResponse> {
    Json(UserResponse::from(&context.user))
}

/// Start a password reset
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/request-reset",
    request_body = ResetRequest,
    responses((status = 200, description = "Request accepted", body = MessageResponse)),
    tag = "auth"
))]
#[instrument(skip(state, payload))]
pub async fn request_reset_handler(
    State(state): State<ApiState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.request_password_reset(payload.email.trim()).await?;
    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

/// Redeem a reset token
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
))]
#[instrument(skip(state, payload))]
pub async fn reset_password_handler(
    State(state): State<ApiState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.reset_password(payload).await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}

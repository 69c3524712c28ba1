//! Axum middleware for bearer authentication.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{warn, Instrument};

use crate::api::error::ApiError;
use crate::auth::gateway::AuthGateway;
use crate::auth::models::AuthContext;
use crate::errors::{AuthErrorType, ContactbookError};

pub type AuthGatewayState = Arc<AuthGateway>;

/// Token from an `Authorization: Bearer <token>` header. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Middleware entry point that resolves the bearer token to an [`AuthContext`].
pub async fn authenticate(
    State(gateway): State<AuthGatewayState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let span = crate::request_span!(request.method(), request.uri().path());

    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return Err(ContactbookError::auth(AuthErrorType::MissingToken).into());
    };

    let user = match gateway.current_user(&token).instrument(span.clone()).await {
        Ok(user) => user,
        Err(err) => {
            span.in_scope(|| warn!(error = %err, "authentication failed"));
            return Err(err.into());
        }
    };

    span.record("user_id", user.id);
    request.extensions_mut().insert(AuthContext::new(user));
    Ok(next.run(request).instrument(span).await)
}

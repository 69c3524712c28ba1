use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::errors::ContactbookError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    TooManyRequests { message: String, retry_after: Option<u64> },
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_kind = match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::TooManyRequests { .. } => "rate_limited",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        };

        let (message, retry_after) = match self {
            ApiError::TooManyRequests { message, retry_after } => (message, retry_after),
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => (msg, None),
        };

        let mut response = (status, Json(ErrorBody { error: error_kind, message })).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(secs) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<ContactbookError> for ApiError {
    fn from(err: ContactbookError) -> Self {
        if err.is_unique_violation() {
            return ApiError::Conflict("Resource already exists".to_string());
        }

        match err {
            ContactbookError::Validation { message, .. } => ApiError::BadRequest(message),
            ContactbookError::Upload { message } => ApiError::BadRequest(message),
            ContactbookError::Serialization { context, .. } => ApiError::BadRequest(context),
            ContactbookError::Auth { message, error_type } => match error_type {
                crate::errors::AuthErrorType::InvalidResetToken => ApiError::BadRequest(message),
                _ => ApiError::Unauthorized(message),
            },
            ContactbookError::Forbidden { message } => ApiError::Forbidden(message),
            ContactbookError::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} not found", capitalize(&resource_type)))
            }
            ContactbookError::Conflict { message, .. } => ApiError::Conflict(message),
            ContactbookError::RateLimit { message, retry_after } => {
                ApiError::TooManyRequests { message, retry_after }
            }
            other @ (ContactbookError::Config { .. }
            | ContactbookError::Database { .. }
            | ContactbookError::Storage { .. }
            | ContactbookError::Io { .. }
            | ContactbookError::Internal { .. }) => {
                error!(error = %other, source = ?std::error::Error::source(&other), "Request failed");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn service_unavailable<S: Into<String>>(msg: S) -> Self {
        ApiError::ServiceUnavailable(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        ApiError::Forbidden(msg.into())
    }
}

//! Liveness and health endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::api::routes::ApiState;
use crate::auth::user::MessageResponse;
use crate::observability::health::{check_all, HealthReport};

/// Root liveness message
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service is running", body = MessageResponse))
))]
pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Contacts API is running"))
}

/// Health check endpoint
///
/// 200 while the database answers, even if the cache backend is down;
/// 503 when the database is unreachable.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy or degraded"),
        (status = 503, description = "Database unreachable")
    )
))]
pub async fn health_handler(State(state): State<ApiState>) -> (StatusCode, Json<HealthReport>) {
    let report = check_all(&state.pool, &state.store).await;
    let status =
        if report.is_operational() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(report))
}

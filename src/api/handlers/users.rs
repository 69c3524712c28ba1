//! User directory endpoints: admin listing, lookup, role changes and avatar upload.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::handlers::pagination::{PaginatedResponse, PaginationQuery, MAX_PAGE_SIZE};
use crate::api::routes::ApiState;
use crate::auth::models::AuthContext;
use crate::auth::user::{AvatarResponse, RoleUpdateRequest, UserId, UserResponse};
use crate::errors::ContactbookError;

/// Multipart field carrying the avatar image
pub const AVATAR_FIELD: &str = "file";

/// List users (admin only)
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/users/",
    params(PaginationQuery),
    responses(
        (status = 200, description = "One page of users"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
))]
#[instrument(skip(state, context), fields(actor_id = context.user_id()))]
pub async fn list_users_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let (limit, offset) = query.clamp(MAX_PAGE_SIZE);
    let page = state.auth.list_users(&context.user, limit, offset).await?;

    let items = page.users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page.total, limit, offset)))
}

/// Get a user by ID (admin or self)
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
))]
#[instrument(skip(state, context), fields(actor_id = context.user_id()))]
pub async fn get_user_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth.get_user(&context.user, id).await?;
    Ok(Json(user.into()))
}

/// Change a user's role (admin only)
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/users/{id}/role",
    params(("id" = i64, Path, description = "User ID")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
))]
#[instrument(skip(state, context, payload), fields(actor_id = context.user_id(), role = %payload.role))]
pub async fn update_role_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<UserId>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth.update_role(&context.user, id, &payload.role).await?;
    Ok(Json(user.into()))
}

/// Upload a new avatar for the caller
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/users/avatar",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Missing, empty or non-image file")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
))]
#[instrument(skip(state, context, multipart), fields(actor_id = context.user_id()))]
pub async fn upload_avatar_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let avatar_url = state
            .media
            .upload(filename.as_deref(), content_type.as_deref(), &bytes)
            .await
            .map_err(ContactbookError::from)?;

        state.auth.update_avatar(&context.user, &avatar_url).await?;
        return Ok(Json(AvatarResponse { avatar_url }));
    }

    Err(ApiError::bad_request(format!("Missing multipart field '{}'", AVATAR_FIELD)))
}

//! Contact endpoints. Every handler is scoped to the authenticated owner.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::auth::models::AuthContext;
use crate::domain::{Contact, ContactId, ContactSearch, ContactUpdate, NewContact, BIRTHDAY_WINDOW_DAYS};

/// Longest birthday look-ahead a client may ask for
pub const MAX_BIRTHDAY_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SearchQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<SearchQuery> for ContactSearch {
    fn from(query: SearchQuery) -> Self {
        ContactSearch { first_name: query.first_name, last_name: query.last_name, email: query.email }
    }
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct BirthdayQuery {
    /// Days to look ahead (default: 7)
    pub days: Option<u32>,
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/contacts/",
    request_body = NewContact,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context, payload), fields(owner_id = context.user_id()))]
pub async fn create_contact_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let contact = state.contacts.create(context.user_id(), payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/contacts/",
    responses((status = 200, description = "All contacts of the caller", body = [Contact])),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context), fields(owner_id = context.user_id()))]
pub async fn list_contacts_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.contacts.list(context.user_id()).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/contacts/search",
    params(SearchQuery),
    responses((status = 200, description = "Matching contacts", body = [Contact])),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context), fields(owner_id = context.user_id()))]
pub async fn search_contacts_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.contacts.search(context.user_id(), query.into()).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/contacts/birthdays",
    params(BirthdayQuery),
    responses((status = 200, description = "Contacts with an upcoming birthday", body = [Contact])),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context), fields(owner_id = context.user_id()))]
pub async fn upcoming_birthdays_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Query(query): Query<BirthdayQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let days = query.days.unwrap_or(BIRTHDAY_WINDOW_DAYS).min(MAX_BIRTHDAY_WINDOW_DAYS);
    Ok(Json(state.contacts.upcoming_birthdays_from_today(context.user_id(), days).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact found", body = Contact),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context), fields(owner_id = context.user_id()))]
pub async fn get_contact_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.contacts.get(context.user_id(), id).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact ID")),
    request_body = ContactUpdate,
    responses(
        (status = 200, description = "Contact updated", body = Contact),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context, payload), fields(owner_id = context.user_id()))]
pub async fn update_contact_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<ContactId>,
    Json(payload): Json<ContactUpdate>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.contacts.update(context.user_id(), id, payload).await?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/contacts/{id}",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
))]
#[instrument(skip(state, context), fields(owner_id = context.user_id()))]
pub async fn delete_contact_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<ContactId>,
) -> Result<StatusCode, ApiError> {
    state.contacts.delete(context.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

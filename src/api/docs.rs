//! OpenAPI document, served at `/api-docs/openapi.json` when the `openapi`
//! feature is enabled.

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::models::Role;
use crate::auth::user::{
    AvatarResponse, MessageResponse, ResetPasswordRequest, ResetRequest, RoleUpdateRequest,
    SignupRequest, TokenResponse, UserResponse,
};
use crate::domain::{Contact, ContactUpdate, NewContact};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::root_handler,
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::signup_handler,
        crate::api::handlers::auth::login_handler,
        crate::api::handlers::auth::verify_email_handler,
        crate::api::handlers::auth::me_handler,
        crate::api::handlers::auth::request_reset_handler,
        crate::api::handlers::auth::reset_password_handler,
        crate::api::handlers::users::list_users_handler,
        crate::api::handlers::users::get_user_handler,
        crate::api::handlers::users::update_role_handler,
        crate::api::handlers::users::upload_avatar_handler,
        crate::api::handlers::contacts::create_contact_handler,
        crate::api::handlers::contacts::list_contacts_handler,
        crate::api::handlers::contacts::search_contacts_handler,
        crate::api::handlers::contacts::upcoming_birthdays_handler,
        crate::api::handlers::contacts::get_contact_handler,
        crate::api::handlers::contacts::update_contact_handler,
        crate::api::handlers::contacts::delete_contact_handler,
    ),
    components(schemas(
        Role,
        UserResponse,
        SignupRequest,
        TokenResponse,
        ResetRequest,
        ResetPasswordRequest,
        RoleUpdateRequest,
        MessageResponse,
        AvatarResponse,
        Contact,
        NewContact,
        ContactUpdate,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and health"),
        (name = "auth", description = "Accounts and tokens"),
        (name = "users", description = "User directory"),
        (name = "contacts", description = "Address book")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

pub fn docs_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

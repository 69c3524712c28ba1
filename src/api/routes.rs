use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::gateway::AuthGateway;
use crate::auth::middleware::authenticate;
use crate::config::AppConfig;
use crate::observability::track_http_requests;
use crate::services::{ContactService, MediaStore};
use crate::storage::{DbPool, SharedStore};

use super::{
    handlers::{
        create_contact_handler, delete_contact_handler, get_contact_handler, get_user_handler,
        health_handler, list_contacts_handler, list_users_handler, login_handler, me_handler,
        request_reset_handler, reset_password_handler, root_handler, search_contacts_handler,
        signup_handler, upcoming_birthdays_handler, update_contact_handler, update_role_handler,
        upload_avatar_handler, verify_email_handler,
    },
    rate_limit::{enforce_rate_limit, RateLimiter},
};

/// Headroom for multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthGateway>,
    pub contacts: ContactService,
    pub media: Arc<dyn MediaStore>,
    pub pool: DbPool,
    pub store: SharedStore,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.server.cors_origins;
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(parsed)
}

pub fn build_router(state: ApiState, config: &AppConfig) -> Router {
    let auth_layer = middleware::from_fn_with_state(state.auth.clone(), authenticate);
    let me_limiter = RateLimiter::per_minute("/auth/me", config.rate_limit.me_per_minute);

    let public_api = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/verify", get(verify_email_handler))
        .route("/auth/request-reset", post(request_reset_handler))
        .route("/auth/reset-password", post(reset_password_handler));

    let me_api = Router::new()
        .route("/auth/me", get(me_handler))
        .route_layer(auth_layer.clone())
        .route_layer(middleware::from_fn_with_state(me_limiter, enforce_rate_limit));

    let secured_api = Router::new()
        .route("/users/", get(list_users_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/users/{id}/role", put(update_role_handler))
        .route(
            "/users/avatar",
            post(upload_avatar_handler).layer(DefaultBodyLimit::max(
                config.media.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/contacts/", get(list_contacts_handler).post(create_contact_handler))
        .route("/contacts/search", get(search_contacts_handler))
        .route("/contacts/birthdays", get(upcoming_birthdays_handler))
        .route(
            "/contacts/{id}",
            get(get_contact_handler).put(update_contact_handler).delete(delete_contact_handler),
        )
        .route_layer(auth_layer);

    let mut router = Router::new()
        .merge(public_api)
        .merge(me_api)
        .merge(secured_api)
        .with_state(state)
        .nest_service("/media", ServeDir::new(&config.media.upload_dir));

    #[cfg(feature = "openapi")]
    {
        router = router.merge(super::docs::docs_router());
    }

    router = router.layer(middleware::from_fn(track_http_requests)).layer(TraceLayer::new_for_http());

    if config.server.enable_cors {
        router = router.layer(cors_layer(config));
    }

    router
}

//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{ContactbookError, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level. Calling this twice
/// returns a configuration error instead of panicking.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logging {
        registry.with(tracing_subscriber::fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| {
        ContactbookError::config_with_source("Failed to install tracing subscriber", Box::new(e))
    })
}

/// Create a tracing span for request tracking.
///
/// ```rust,ignore
/// let span = request_span!("GET", "/contacts", user_id = 7);
/// ```
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            user_id = tracing::field::Empty
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for database operations.
///
/// ```rust,ignore
/// let span = db_span!("insert_contact", owner_id = 7);
/// ```
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    let kv_backend = if config.cache.redis_url.is_some() { "redis" } else { "memory" };
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_type = "sqlite",
        kv_backend,
        token_expiry_seconds = config.auth.token_expiry_seconds,
        me_rate_limit_per_minute = config.rate_limit.me_per_minute,
        metrics_enabled = %config.observability.enable_metrics,
        "Contactbook configuration"
    );
}

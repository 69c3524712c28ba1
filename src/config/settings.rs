//! # Configuration Settings
//!
//! Defines the configuration structure for the contactbook service.

use crate::errors::{ContactbookError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[validate(nested)]
    pub auth: AuthConfig,

    /// User cache and reset ledger backing store
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Outgoing email configuration
    #[validate(nested)]
    pub email: EmailConfig,

    /// Avatar upload configuration
    #[validate(nested)]
    pub media: MediaConfig,

    /// Per-IP rate limits
    #[validate(nested)]
    pub rate_limit: RateLimitConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(ContactbookError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks that span more than one field or need string parsing
    fn validate_custom(&self) -> Result<()> {
        if !self.database.is_sqlite() {
            return Err(ContactbookError::validation_field(
                "Database URL must start with 'sqlite:'",
                "database.url",
            ));
        }

        if let Some(redis_url) = &self.cache.redis_url {
            if !redis_url.starts_with("redis://") && !redis_url.starts_with("rediss://") {
                return Err(ContactbookError::validation_field(
                    "Redis URL must start with 'redis://' or 'rediss://'",
                    "cache.redis_url",
                ));
            }
        }

        if url::Url::parse(&self.email.app_url).is_err() {
            return Err(ContactbookError::validation_field(
                "App URL must be an absolute URL",
                "email.app_url",
            ));
        }

        if self.observability.enable_metrics && self.observability.metrics_port == self.server.port
        {
            return Err(ContactbookError::validation(
                "Server and metrics ports cannot be the same",
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            cors_origins: vec![],
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/contactbook.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}

/// Development signing secret used when none is configured
pub const DEFAULT_JWT_SECRET: &str = "contactbook-default-secret-please-change-in-production";

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret for HS256 token signing/verification
    #[validate(length(min = 32, message = "JWT secret must be at least 32 characters long"))]
    pub jwt_secret: String,

    /// Access token expiry in seconds
    #[validate(range(
        min = 60,
        max = 86400,
        message = "Token expiry must be between 1 minute and 24 hours"
    ))]
    pub token_expiry_seconds: u64,

    /// bcrypt work factor
    #[validate(range(min = 4, max = 31, message = "bcrypt cost must be between 4 and 31"))]
    pub bcrypt_cost: u32,

    /// Lifetime of a password reset token in seconds
    #[validate(range(
        min = 60,
        max = 86400,
        message = "Reset token TTL must be between 1 minute and 24 hours"
    ))]
    pub reset_token_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_expiry_seconds: 3600, // 1 hour
            bcrypt_cost: bcrypt::DEFAULT_COST,
            reset_token_ttl_seconds: 3600,
        }
    }
}

impl AuthConfig {
    /// Whether tokens are signed with the built-in development secret
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Get token expiry as Duration
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_seconds)
    }

    /// Get reset token lifetime as Duration
    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_seconds)
    }
}

/// Backing store for the user cache and reset ledger
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL; the in-process store is used when unset
    pub redis_url: Option<String>,

    /// Lifetime of a cached user snapshot in seconds
    #[validate(range(min = 1, max = 86400, message = "User TTL must be between 1 and 86400 seconds"))]
    pub user_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { redis_url: None, user_ttl_seconds: 3600 }
    }
}

impl CacheConfig {
    /// Get user snapshot lifetime as Duration
    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_seconds)
    }
}

/// Outgoing email configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EmailConfig {
    /// Public base URL used to build verification and reset links
    #[validate(length(min = 1, message = "App URL cannot be empty"))]
    pub app_url: String,

    /// Sender address
    #[validate(email(message = "Mail sender must be a valid email address"))]
    pub mail_from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:8000".to_string(),
            mail_from: "noreply@contactbook.local".to_string(),
        }
    }
}

impl EmailConfig {
    /// Link a user follows to verify their email address
    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/auth/verify?token={}", self.app_url.trim_end_matches('/'), token)
    }

    /// Link a user follows to reset their password
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/auth/reset-password?token={}", self.app_url.trim_end_matches('/'), token)
    }
}

/// Avatar upload configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory uploaded files are written to
    #[validate(length(min = 1, message = "Upload directory cannot be empty"))]
    pub upload_dir: String,

    /// Base URL uploaded files are served from
    #[validate(length(min = 1, message = "Public base URL cannot be empty"))]
    pub public_base_url: String,

    /// Maximum accepted upload size in bytes
    #[validate(range(min = 1024, message = "Max upload size must be at least 1KB"))]
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: "./data/media".to_string(),
            public_base_url: "http://localhost:8000/media".to_string(),
            max_upload_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Per-IP rate limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per minute allowed on `/auth/me`
    #[validate(range(min = 1, max = 10000, message = "Rate must be between 1 and 10000"))]
    pub me_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { me_per_minute: 5 }
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "contactbook".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

//! # Configuration Management
//!
//! Layered configuration: built-in defaults, then an optional `contactbook.toml`,
//! then `CONTACTBOOK_<SECTION>__<KEY>` environment variables.

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, EmailConfig, MediaConfig,
    ObservabilityConfig, RateLimitConfig, ServerConfig,
};

use std::path::Path;

use crate::errors::Result;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "contactbook";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CONTACTBOOK";

impl AppConfig {
    /// Load configuration from defaults, the optional default file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file when given
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.apply_env_shortcuts();
        app_config.validate()?;

        Ok(app_config)
    }

    /// Honor the conventional un-prefixed variables
    fn apply_env_shortcuts(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            self.cache.redis_url = Some(redis_url);
        }
    }
}

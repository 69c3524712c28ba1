//! Startup wiring: turns a loaded [`AppConfig`] into the shared API state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiState;
use crate::auth::AuthGateway;
use crate::config::AppConfig;
use crate::errors::{ContactbookError, Result};
use crate::services::{ContactService, EmailSender, LocalMediaStore, LogEmailSender};
use crate::storage::{connect_store, create_pool, DbPool, SharedStore};

/// Assemble the API state over an existing pool and store
pub fn assemble_state(
    config: &AppConfig,
    pool: DbPool,
    store: SharedStore,
    mailer: Arc<dyn EmailSender>,
) -> ApiState {
    let auth = Arc::new(AuthGateway::from_config(config, pool.clone(), store.clone(), mailer));

    ApiState {
        auth,
        contacts: ContactService::with_sqlx(pool.clone()),
        media: Arc::new(LocalMediaStore::from_config(&config.media)),
        pool,
        store,
    }
}

/// Connect the database and the key-value store, then assemble the API state
pub async fn build_state(config: &AppConfig) -> Result<ApiState> {
    if config.auth.uses_default_secret() {
        warn!("Using the built-in default JWT secret; set CONTACTBOOK_AUTH__JWT_SECRET or JWT_SECRET");
    }

    info!("Creating database connection pool");
    let pool = create_pool(&config.database).await?;

    let store = connect_store(config.cache.redis_url.as_deref())
        .await
        .map_err(|e| ContactbookError::storage(e, "Failed to connect key-value store"))?;

    let mailer: Arc<dyn EmailSender> = Arc::new(LogEmailSender::new(&config.email.mail_from));

    Ok(assemble_state(config, pool, store, mailer))
}

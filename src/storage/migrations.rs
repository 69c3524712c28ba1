//! # Database Migration Management
//!
//! Schema migrations are embedded in the binary from `./migrations` and applied
//! on startup when `auto_migrate` is enabled.

use crate::errors::{ContactbookError, Result};
use crate::storage::DbPool;
use sqlx::migrate::Migrator;
use tracing::{error, info, Instrument};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every pending migration
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).instrument(crate::db_span!("run_migrations")).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        ContactbookError::from(e)
    })?;

    info!("Database migrations completed");
    Ok(())
}

/// Highest applied migration version, if any
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    let version: Option<(i64,)> = sqlx::query_as(
        "SELECT version FROM _sqlx_migrations WHERE success = TRUE ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| ContactbookError::database(e, "Failed to read migration version"))?;

    Ok(version.map(|(v,)| v))
}

//! # Storage and Persistence
//!
//! SQLite persistence for users and contacts, plus the expiring key-value
//! store that backs the user cache and the reset ledger.

pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use crate::config::DatabaseConfig;

pub use kv::{connect_store, BestEffort, InMemoryStore, KeyValueStore, RedisStore, SharedStore, StoreError};
pub use migrations::get_migration_version;
pub use pool::{create_pool, get_pool_stats, DbPool, PoolStats};
pub use repositories::{
    ContactRepository, SqlxContactRepository, SqlxUserRepository, UserRepository,
};

use crate::errors::{ContactbookError, Result};

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    migrations::run_migrations(pool).await
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| ContactbookError::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_connection() {
        let pool = test_helpers::memory_pool().await;
        assert!(check_connection(&pool).await.is_ok());
    }
}

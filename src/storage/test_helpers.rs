//! Test database utilities for in-library tests.
//!
//! Each pool is a private in-memory SQLite database with every migration
//! applied. A single connection that never idles out keeps the database alive
//! for the whole test.
//!
//! This module is only available in test builds (`#[cfg(test)]`).

use crate::config::DatabaseConfig;
use crate::storage::{create_pool, DbPool};

/// Configuration for an isolated, migrated in-memory database
pub fn memory_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        idle_timeout_seconds: 0,
        auto_migrate: true,
        ..Default::default()
    }
}

/// Fresh migrated in-memory pool
pub async fn memory_pool() -> DbPool {
    create_pool(&memory_config()).await.expect("create in-memory test pool")
}

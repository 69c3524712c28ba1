//! Manual migration runner for the SQLite user directory
//!
//! Connects to the configured database and applies all pending migrations.
//! Usage: cargo run --bin run_migrations
//!
//! Set CONTACTBOOK_DATABASE__URL to specify the target database.
//! Defaults to sqlite://./data/contactbook.db

use contactbook::{
    config::DatabaseConfig,
    storage::{create_pool, get_migration_version, run_migrations},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let db_config = DatabaseConfig {
        url: std::env::var("CONTACTBOOK_DATABASE__URL")
            .unwrap_or_else(|_| "sqlite://./data/contactbook.db".to_string()),
        max_connections: 1,
        auto_migrate: false, // applied explicitly below
        ..Default::default()
    };

    let pool = create_pool(&db_config).await?;
    info!("Connected to database");

    run_migrations(&pool).await?;

    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;
    info!("Tables in database: {:?}", tables);

    match get_migration_version(&pool).await? {
        Some(version) => info!(version, "Migration completed successfully"),
        None => info!("No migrations recorded"),
    }

    Ok(())
}

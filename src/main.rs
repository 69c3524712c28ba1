use anyhow::Context;
use contactbook::{
    api::start_api_server,
    config::AppConfig,
    observability::{init_observability, log_config_info},
    startup::build_state,
    APP_NAME, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before any configuration is read from the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::load().context("failed to load configuration")?;
    init_observability(&config.observability).await.context("failed to initialize observability")?;

    info!(app_name = APP_NAME, version = VERSION, "Starting contactbook");
    log_config_info(&config);

    let state = build_state(&config).await.context("failed to initialize application state")?;
    start_api_server(&config, state).await.context("API server failed")?;

    info!("Contactbook shutdown completed");
    Ok(())
}

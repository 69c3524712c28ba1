use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{ContactbookError, Result};

use super::routes::{build_router, ApiState};

/// Bind the configured address and serve until Ctrl-C
pub async fn start_api_server(config: &AppConfig, state: ApiState) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .map_err(|e| ContactbookError::config(format!("Invalid API address: {}", e)))?;

    let router: Router = build_router(state, config);

    let listener = TcpListener::bind(addr).await.map_err(|e| ContactbookError::Io {
        source: e,
        context: format!("Failed to bind API server to {}", addr),
    })?;

    info!(address = %addr, "Starting HTTP API server");
    run_http_server(listener, router).await?;

    info!("API server shutdown completed");
    Ok(())
}

async fn run_http_server(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| ContactbookError::Io { source: e, context: "API server error".to_string() })
}

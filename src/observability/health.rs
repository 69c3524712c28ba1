//! # Health Checking
//!
//! Probes the database and the key-value store. The database is required; the
//! store only backs best-effort caching, so a failing store degrades the
//! service without making it unhealthy.

use serde::Serialize;

use crate::storage::{check_connection, DbPool, SharedStore};

/// Health status for a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is healthy and operational
    Healthy,
    /// Component is degraded but still functional
    Degraded { message: String },
    /// Component is unhealthy and not functional
    Unhealthy { message: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Healthy or degraded
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded { .. } => "degraded",
            HealthStatus::Unhealthy { .. } => "unhealthy",
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub component: &'static str,
    #[serde(flatten)]
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    pub last_check: chrono::DateTime<chrono::Utc>,
}

impl HealthCheck {
    pub fn new(component: &'static str, status: HealthStatus) -> Self {
        Self { component, status, backend: None, last_check: chrono::Utc::now() }
    }

    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }
}

/// Overall report served by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub components: Vec<HealthCheck>,
}

impl HealthReport {
    /// Worst component status wins
    pub fn from_checks(components: Vec<HealthCheck>) -> Self {
        let status = if components.iter().any(|c| !c.status.is_operational()) {
            "unhealthy"
        } else if components.iter().any(|c| !c.status.is_healthy()) {
            "degraded"
        } else {
            "healthy"
        };
        Self { status, version: env!("CARGO_PKG_VERSION"), components }
    }

    pub fn is_operational(&self) -> bool {
        self.status != "unhealthy"
    }
}

pub async fn check_database(pool: &DbPool) -> HealthCheck {
    let status = match check_connection(pool).await {
        Ok(()) => HealthStatus::Healthy,
        Err(err) => {
            tracing::error!(error = %err, "Database health check failed");
            HealthStatus::Unhealthy { message: "database unreachable".to_string() }
        }
    };
    HealthCheck::new("database", status).with_backend("sqlite")
}

pub async fn check_store(store: &SharedStore) -> HealthCheck {
    let status = match store.ping().await {
        Ok(()) => HealthStatus::Healthy,
        Err(err) => {
            tracing::warn!(error = %err, "Key-value store health check failed");
            HealthStatus::Degraded { message: "cache unavailable".to_string() }
        }
    };
    HealthCheck::new("cache", status).with_backend(store.backend())
}

/// Probe every component
pub async fn check_all(pool: &DbPool, store: &SharedStore) -> HealthReport {
    let (database, cache) = tokio::join!(check_database(pool), check_store(store));
    HealthReport::from_checks(vec![database, cache])
}

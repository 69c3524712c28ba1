//! # Metrics Collection
//!
//! Prometheus counters for authentication, cache and contact activity.

use crate::config::ObservabilityConfig;
use crate::errors::{ContactbookError, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, method: &str, path: &str, status: u16) {
        let labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status", status.to_string()),
        ];
        counter!("http_requests_total", &labels).increment(1);
    }

    /// Record authentication attempt outcome
    pub fn record_authentication(&self, status: &str) {
        counter!("auth_authentications_total").increment(1);
        let labels = [("status", status.to_string())];
        counter!("auth_authentications_total", &labels).increment(1);
    }

    /// Record a completed signup
    pub fn record_signup(&self) {
        counter!("auth_signups_total").increment(1);
    }

    /// Record a password reset lifecycle event
    pub fn record_password_reset(&self, stage: &str) {
        let labels = [("stage", stage.to_string())];
        counter!("auth_password_resets_total", &labels).increment(1);
    }

    /// Record a user cache lookup
    pub fn record_cache_lookup(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("user_cache_lookups_total", &labels).increment(1);
    }

    /// Record a rejected request from the per-IP rate limiter
    pub fn record_rate_limited(&self, route: &str) {
        let labels = [("route", route.to_string())];
        counter!("rate_limited_requests_total", &labels).increment(1);
    }

    /// Describe authentication metrics
    pub fn register_auth_metrics(&self) {
        describe_counter!(
            "auth_authentications_total",
            Unit::Count,
            "Authentication attempts grouped by outcome"
        );
        describe_counter!("auth_signups_total", Unit::Count, "Number of accounts created");
        describe_counter!(
            "auth_password_resets_total",
            Unit::Count,
            "Password reset requests and completions"
        );
        describe_counter!(
            "user_cache_lookups_total",
            Unit::Count,
            "User cache lookups grouped by hit, miss or unavailable"
        );
        describe_counter!(
            "rate_limited_requests_total",
            Unit::Count,
            "Requests rejected by the per-IP rate limiter"
        );
        describe_counter!("http_requests_total", Unit::Count, "HTTP requests served");
    }
}

static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        ContactbookError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            ContactbookError::config(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }

    recorder.register_auth_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

/// Record an HTTP request using the global metrics recorder
pub async fn record_http_request(method: &str, path: &str, status: u16) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_http_request(method, path, status);
    }
}

/// Record authentication attempt outcome via the global recorder
pub async fn record_authentication(status: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_authentication(status);
    }
}

/// Record a completed signup via the global recorder
pub async fn record_signup() {
    if let Some(metrics) = get_metrics().await {
        metrics.record_signup();
    }
}

/// Record a password reset lifecycle event via the global recorder
pub async fn record_password_reset(stage: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_password_reset(stage);
    }
}

/// Record a user cache lookup via the global recorder
pub async fn record_cache_lookup(outcome: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_cache_lookup(outcome);
    }
}

/// Record a rate-limited request via the global recorder
pub async fn record_rate_limited(route: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_rate_limited(route);
    }
}

//! # HTTP Request Metrics Middleware
//!
//! Records a counter and a latency histogram per request, labelled by the
//! matched route template.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use ::metrics::histogram;
use std::time::Instant;

use crate::observability::metrics;

/// Route label for a request: the matched template, or "unmatched"
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Axum middleware that records request count and latency
pub async fn track_http_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = route_label(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();

    tracing::debug!(
        method = %method,
        route = %route,
        status,
        elapsed_ms = elapsed.as_millis() as u64,
        "HTTP request completed"
    );

    metrics::record_http_request(&method, &route, status).await;
    let labels = [("method", method), ("path", route)];
    histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    response
}

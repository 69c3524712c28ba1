//! Per-client rate limiting for API endpoints.
//!
//! Token buckets keyed by client IP. The client IP is the peer address when
//! the server was started with connect info, otherwise the first hop of
//! `X-Forwarded-For`, otherwise a shared "unknown" bucket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::errors::ContactbookError;
use crate::observability::metrics;

/// Token bucket for rate limiting.
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens available
    tokens: f64,
    /// Maximum tokens in the bucket
    max_tokens: f64,
    /// Time of last token refill
    last_refill: Instant,
    /// Token refill rate (tokens per second)
    refill_rate_per_sec: f64,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_period: Duration) -> Self {
        let refill_rate_per_sec = max_tokens as f64 / refill_period.as_secs_f64();
        Self {
            tokens: max_tokens as f64,
            max_tokens: max_tokens as f64,
            last_refill: Instant::now(),
            refill_rate_per_sec,
        }
    }

    /// Untouched for a whole refill period, so indistinguishable from a fresh bucket
    fn is_idle(&self, now: Instant, refill_period: Duration) -> bool {
        now.duration_since(self.last_refill) >= refill_period
    }

    /// Take one token, or return the whole seconds until one is available.
    fn try_consume(&mut self) -> Result<(), u64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate_per_sec).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let seconds_until_refill = (1.0 - self.tokens) / self.refill_rate_per_sec;
            Err((seconds_until_refill.ceil() as u64).max(1))
        }
    }
}

/// Buckets per client plus the time idle ones were last dropped
#[derive(Debug)]
struct BucketTable {
    buckets: HashMap<String, TokenBucket>,
    last_prune: Instant,
}

impl BucketTable {
    /// Drop idle buckets at most once per refill period
    fn prune_idle(&mut self, now: Instant, refill_period: Duration) {
        if now.duration_since(self.last_prune) < refill_period {
            return;
        }
        self.buckets.retain(|_, bucket| !bucket.is_idle(now, refill_period));
        self.last_prune = now;
    }
}

/// Rate limiter using token bucket algorithm.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    route: &'static str,
    table: Arc<Mutex<BucketTable>>,
    max_tokens: u32,
    refill_period: Duration,
}

impl RateLimiter {
    /// `max_tokens` requests per `refill_period`, per key
    pub fn new(route: &'static str, max_tokens: u32, refill_period: Duration) -> Self {
        Self {
            route,
            table: Arc::new(Mutex::new(BucketTable {
                buckets: HashMap::new(),
                last_prune: Instant::now(),
            })),
            max_tokens: max_tokens.max(1),
            refill_period,
        }
    }

    pub fn per_minute(route: &'static str, max_tokens: u32) -> Self {
        Self::new(route, max_tokens, Duration::from_secs(60))
    }

    /// `Err(retry_after_secs)` when `key` is out of tokens
    pub async fn check_rate_limit(&self, key: &str) -> Result<(), u64> {
        let mut table = self.table.lock().await;
        table.prune_idle(Instant::now(), self.refill_period);

        let bucket = table
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens, self.refill_period));

        match bucket.try_consume() {
            Ok(()) => {
                debug!(
                    route = self.route,
                    key = %key,
                    remaining_tokens = bucket.tokens as u32,
                    "Rate limit check passed"
                );
                Ok(())
            }
            Err(retry_after) => {
                warn!(
                    route = self.route,
                    key = %key,
                    retry_after_seconds = retry_after,
                    "Rate limit exceeded"
                );
                Err(retry_after)
            }
        }
    }
}

/// Client address used as the bucket key
pub fn client_key(request: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware that rejects requests over the limiter's budget with 429
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);

    if let Err(retry_after) = limiter.check_rate_limit(&key).await {
        metrics::record_rate_limited(limiter.route).await;
        return Err(ContactbookError::rate_limit(
            format!("Too many requests, retry in {} seconds", retry_after),
            Some(retry_after),
        )
        .into());
    }

    Ok(next.run(request).await)
}

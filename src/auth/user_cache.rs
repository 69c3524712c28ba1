//! Read-through cache of user snapshots keyed by email.
//!
//! The cache is never the source of truth. Every operation is best effort:
//! backend failures are logged and reported as [`BestEffort::Unavailable`],
//! never as errors. Writers that change a cached field must call
//! [`UserCache::invalidate`] after the directory write.

use std::time::Duration;

use tracing::{debug, warn};

use crate::auth::user::{CachedUser, User};
use crate::observability::metrics;
use crate::storage::kv::{BestEffort, SharedStore};

const KEY_PREFIX: &str = "user:";

#[derive(Clone)]
pub struct UserCache {
    store: SharedStore,
    ttl: Duration,
}

impl std::fmt::Debug for UserCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCache")
            .field("backend", &self.store.backend())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl UserCache {
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn key(email: &str) -> String {
        format!("{}{}", KEY_PREFIX, email)
    }

    /// Cached snapshot for `email`. A corrupt entry reads as a miss.
    pub async fn get(&self, email: &str) -> BestEffort<Option<CachedUser>> {
        let raw = match self.store.get(&Self::key(email)).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, backend = self.store.backend(), "User cache read failed");
                metrics::record_cache_lookup("unavailable").await;
                return BestEffort::Unavailable(err);
            }
        };

        let Some(raw) = raw else {
            metrics::record_cache_lookup("miss").await;
            return BestEffort::Done(None);
        };

        match serde_json::from_str::<CachedUser>(&raw) {
            Ok(snapshot) => {
                metrics::record_cache_lookup("hit").await;
                BestEffort::Done(Some(snapshot))
            }
            Err(err) => {
                debug!(error = %err, "Discarding undecodable user cache entry");
                metrics::record_cache_lookup("miss").await;
                BestEffort::Done(None)
            }
        }
    }

    /// Store a snapshot of `user` with the configured TTL
    pub async fn put(&self, user: &User) -> BestEffort<()> {
        self.put_with_ttl(user, self.ttl).await
    }

    /// Store a snapshot of `user` for `ttl`
    pub async fn put_with_ttl(&self, user: &User, ttl: Duration) -> BestEffort<()> {
        let encoded = match serde_json::to_string(&CachedUser::from(user)) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "Failed to encode user snapshot");
                return BestEffort::Done(());
            }
        };

        let result = self.store.set_ex(&Self::key(&user.email), &encoded, ttl).await;
        if let Err(err) = &result {
            warn!(error = %err, backend = self.store.backend(), "User cache write failed");
        }
        BestEffort::from_result(result)
    }

    /// Drop the cached snapshot for `email`
    pub async fn invalidate(&self, email: &str) -> BestEffort<()> {
        let result = self.store.delete(&Self::key(email)).await;
        if let Err(err) = &result {
            warn!(error = %err, backend = self.store.backend(), "User cache invalidation failed");
        }
        BestEffort::from_result(result)
    }
}

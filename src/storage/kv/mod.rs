//! # Expiring Key-Value Store
//!
//! The port behind the user cache and the password reset ledger. Two backends
//! ship with the crate: an in-process [`InMemoryStore`] and a [`RedisStore`].

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Errors raised by a key-value backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the command
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),

    /// Redis protocol or connection failure
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

impl StoreError {
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Expiring string store shared by every request task
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a live value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key` for `ttl`. A zero TTL removes the key.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically fetch and remove `key`
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Round-trip to the backend
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Shared handle injected into the cache and ledger
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Connect to Redis when a URL is configured, otherwise use the in-process store
pub async fn connect_store(redis_url: Option<&str>) -> Result<SharedStore, StoreError> {
    match redis_url {
        Some(url) => {
            let store = RedisStore::connect(url).await?;
            tracing::info!(backend = store.backend(), "Connected key-value store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!(backend = "memory", "Using in-process key-value store");
            let store: SharedStore = InMemoryStore::with_sweeper(memory::SWEEP_INTERVAL);
            Ok(store)
        }
    }
}

/// Outcome of an operation whose backend failures are absorbed rather than propagated.
///
/// `Unavailable` carries the swallowed error so callers can log or count it,
/// but it is never turned into a request failure.
#[derive(Debug)]
#[must_use]
pub enum BestEffort<T> {
    Done(T),
    Unavailable(StoreError),
}

impl<T> BestEffort<T> {
    /// Absorb a backend result
    pub fn from_result(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(value) => BestEffort::Done(value),
            Err(err) => BestEffort::Unavailable(err),
        }
    }

    /// The value when the backend answered
    pub fn done(self) -> Option<T> {
        match self {
            BestEffort::Done(value) => Some(value),
            BestEffort::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, BestEffort::Unavailable(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            BestEffort::Done(value) => BestEffort::Done(f(value)),
            BestEffort::Unavailable(err) => BestEffort::Unavailable(err),
        }
    }
}

impl<T> BestEffort<Option<T>> {
    /// Collapse "absent" and "backend unavailable" into a single miss
    pub fn flatten(self) -> Option<T> {
        self.done().flatten()
    }
}

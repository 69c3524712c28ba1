//! Password hashing with bcrypt.
//!
//! Passwords longer than bcrypt's 72-byte input limit are rejected instead of
//! being silently truncated.

use std::sync::Arc;

use crate::errors::{ContactbookError, Result};

/// bcrypt reads at most this many bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Used when the dummy hash cannot be computed; verification against it simply fails.
const FALLBACK_DUMMY_HASH: &str = "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Salted, slow one-way password hashing
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").field("cost", &self.cost).finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost.
    ///
    /// Precomputes a dummy hash at the same cost so that logins for unknown
    /// accounts spend as long in verification as real ones.
    pub fn new(cost: u32) -> Self {
        let dummy_hash = bcrypt::non_truncating_hash("contactbook-dummy-password", cost)
            .unwrap_or_else(|_| FALLBACK_DUMMY_HASH.to_string());
        Self { cost, dummy_hash: Arc::from(dummy_hash) }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password. Fails for inputs longer than 72 bytes.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ContactbookError::validation_field(
                format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES),
                "password",
            ));
        }

        bcrypt::non_truncating_hash(password, self.cost).map_err(|e| {
            ContactbookError::internal_with_source("Failed to hash password", Box::new(e))
        })
    }

    /// Check a password against a stored hash. A malformed hash verifies as false.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::non_truncating_verify(password, hash).unwrap_or(false)
    }

    /// Burn one verification's worth of time against the dummy hash
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(&self, password: &str) -> Result<String> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ContactbookError::internal_with_source("Password hashing task failed", Box::new(e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(&self, password: &str, hash: &str) -> bool {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await.unwrap_or(false)
    }

    /// [`verify_dummy`](Self::verify_dummy) on the blocking pool
    pub async fn verify_dummy_blocking(&self, password: &str) {
        let hasher = self.clone();
        let password = password.to_string();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await;
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

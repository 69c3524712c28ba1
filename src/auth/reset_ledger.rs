//! Single-use, expiring password reset tokens.
//!
//! Each token maps to the email it was issued for under `reset:{token}`.
//! Several tokens may be outstanding for one email; issuing a new one does
//! not revoke the others.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{instrument, warn};

use crate::errors::{ContactbookError, Result};
use crate::storage::kv::{BestEffort, SharedStore};

const KEY_PREFIX: &str = "reset:";

/// Random bytes per token before encoding
pub const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct ResetLedger {
    store: SharedStore,
    ttl: Duration,
}

impl std::fmt::Debug for ResetLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetLedger")
            .field("backend", &self.store.backend())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// URL-safe opaque token from OS entropy
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl ResetLedger {
    pub fn new(store: SharedStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(token: &str) -> String {
        format!("{}{}", KEY_PREFIX, token)
    }

    /// Issue a token for `email`. Store failures propagate.
    #[instrument(skip(self, email), name = "reset_ledger_create")]
    pub async fn create_token(&self, email: &str) -> Result<String> {
        let token = generate_token();
        self.store.set_ex(&Self::key(&token), email, self.ttl).await.map_err(|err| {
            ContactbookError::storage(err, "Failed to store password reset token")
        })?;
        Ok(token)
    }

    /// Email for a live token. Unknown, expired and unreachable all read as None.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        match self.store.get(&Self::key(token)).await {
            Ok(email) => email,
            Err(err) => {
                warn!(error = %err, backend = self.store.backend(), "Reset ledger read failed");
                None
            }
        }
    }

    /// Delete a token
    pub async fn consume(&self, token: &str) -> BestEffort<()> {
        let result = self.store.delete(&Self::key(token)).await;
        if let Err(err) = &result {
            warn!(error = %err, backend = self.store.backend(), "Reset token deletion failed");
        }
        BestEffort::from_result(result)
    }

    /// Resolve and delete in one atomic step; at most one caller gets the email
    pub async fn redeem(&self, token: &str) -> Option<String> {
        match self.store.take(&Self::key(token)).await {
            Ok(email) => email,
            Err(err) => {
                warn!(error = %err, backend = self.store.backend(), "Reset token redemption failed");
                None
            }
        }
    }
}

//! Bearer token codec: HS256 JWTs carrying the account email as subject.
//!
//! Tokens are stateless. Validity depends only on the signature and the expiry
//! at verification time; there is no revocation list.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::{AuthErrorType, ContactbookError, Result};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the account email
    pub sub: String,
    /// Expiration, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    #[serde(default)]
    pub iat: i64,
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("default_ttl", &self.default_ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec for the given secret and default token lifetime
    pub fn new(secret: &[u8], default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `subject`, expiring after `ttl` or the default lifetime
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String> {
        if subject.is_empty() {
            return Err(ContactbookError::validation_field("Token subject cannot be empty", "sub"));
        }

        let now = Utc::now().timestamp();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let claims = Claims {
            sub: subject.to_string(),
            exp: now.saturating_add(ttl.as_secs() as i64),
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            ContactbookError::internal_with_source("Failed to sign token", Box::new(e))
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Every failure (bad signature, malformed payload, expired, missing or
    /// empty subject) collapses into the same `InvalidToken` error.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                ContactbookError::auth(AuthErrorType::InvalidToken)
            })?
            .claims;

        if claims.exp <= Utc::now().timestamp() {
            debug!("Token rejected: expired");
            return Err(ContactbookError::auth(AuthErrorType::InvalidToken));
        }

        if claims.sub.is_empty() {
            debug!("Token rejected: empty subject");
            return Err(ContactbookError::auth(AuthErrorType::InvalidToken));
        }

        Ok(claims)
    }
}

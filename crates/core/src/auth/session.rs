//! Opaque session tokens.
//!
//! The raw token only ever lives in the client's cookie. The database keeps
//! its SHA-256 digest, so a leaked sessions table cannot be replayed.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// A freshly issued session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Value placed in the cookie.
    pub raw: String,
    /// Digest stored server-side.
    pub hash: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Issues a new token valid for `ttl` from `now`.
    #[must_use]
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let bytes: [u8; 32] = rand::random();
        let raw = base64_url::encode(&bytes);
        let hash = hash_token(&raw);

        Self {
            raw,
            hash,
            expires_at: now + ttl,
        }
    }
}

/// Hashes a raw session token for storage and lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

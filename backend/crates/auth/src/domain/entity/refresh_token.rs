//! Refresh Token Record Entity
//!
//! Ledger entry for an issued refresh token. Single-use: rotation revokes
//! the row atomically, and a second presentation of the same token is
//! treated as reuse.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::account_id::AccountId;

/// Refresh token ledger entry
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    /// Hex SHA-256 digest of the token string (unique)
    pub token_hash: String,
    /// Coarse device description from the User-Agent header
    pub device_info: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(account_id: AccountId, token_hash: String, device_info: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token_hash,
            device_info,
            expires_at: now + ttl,
            revoked: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Active means rotatable: not revoked and not expired
    pub fn is_active(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

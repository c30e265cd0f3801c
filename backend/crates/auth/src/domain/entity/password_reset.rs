//! Password Reset Entity
//!
//! One-time reset token record. Same single-active invariant as email
//! verification, but over a high-entropy URL-safe token instead of a
//! short numeric code.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::account_id::AccountId;

/// Password reset entity
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub id: Uuid,
    pub account_id: AccountId,
    /// Hex SHA-256 digest of the reset token
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn new(account_id: AccountId, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            token_hash,
            expires_at: now + ttl,
            consumed: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_active(&self) -> bool {
        !self.consumed && !self.is_expired()
    }
}

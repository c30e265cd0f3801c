//! Email Verification Entity
//!
//! One-time OTP record for confirming an email address. The raw code is
//! never stored; only its SHA-256 digest. At most one active (unconsumed,
//! unexpired) record exists per account.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::account_id::AccountId;

/// Email verification entity
#[derive(Debug, Clone)]
pub struct EmailVerification {
    pub id: Uuid,
    pub account_id: AccountId,
    /// Hex SHA-256 digest of the numeric OTP
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn new(account_id: AccountId, otp_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            otp_hash,
            expires_at: now + ttl,
            consumed: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Active means usable: not consumed and not expired
    pub fn is_active(&self) -> bool {
        !self.consumed && !self.is_expired()
    }
}

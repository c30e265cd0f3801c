//! OTP Verifier
//!
//! Issues and consumes numeric email verification codes. Throttling is
//! structural: the storage-level conditional insert admits at most one
//! active record per account, so a second issue while one is pending
//! fails with `TooManyRequests`.

use std::sync::Arc;

use chrono::Duration;

use crate::application::config::AuthConfig;
use crate::domain::entity::email_verification::EmailVerification;
use crate::domain::repository::EmailVerificationRepository;
use crate::domain::value_object::account_id::AccountId;
use crate::error::{AuthError, AuthResult};

pub struct OtpVerifier<V>
where
    V: EmailVerificationRepository,
{
    repo: Arc<V>,
    config: Arc<AuthConfig>,
}

impl<V> OtpVerifier<V>
where
    V: EmailVerificationRepository,
{
    pub fn new(repo: Arc<V>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Issue a fresh OTP for the account, returning the raw code
    ///
    /// Fails with `TooManyRequests` while an earlier code is still
    /// active.
    pub async fn issue(&self, account_id: &AccountId) -> AuthResult<String> {
        let code = platform::crypto::generate_numeric_code(self.config.otp_length);
        let ttl = Duration::from_std(self.config.otp_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = EmailVerification::new(
            *account_id,
            platform::crypto::hash_secret(&code),
            ttl,
        );

        if !self.repo.insert_if_none_active(&record).await? {
            tracing::debug!(account_id = %account_id, "OTP already sent");
            return Err(AuthError::TooManyRequests);
        }

        Ok(code)
    }

    /// Consume the account's active OTP
    ///
    /// Missing, expired, and mismatched codes all answer `InvalidOtp`
    /// so the response does not reveal which check failed.
    pub async fn consume(&self, account_id: &AccountId, code: &str) -> AuthResult<()> {
        let record = self
            .repo
            .find_active_by_account(account_id)
            .await?
            .ok_or(AuthError::InvalidOtp)?;

        if !platform::crypto::secret_matches(code, &record.otp_hash) {
            return Err(AuthError::InvalidOtp);
        }

        self.repo.mark_consumed(record.id).await?;
        Ok(())
    }
}

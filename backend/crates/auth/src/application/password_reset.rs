//! Password Reset Flow
//!
//! Same single-active shape as the OTP verifier, but over a high-entropy
//! URL-safe token presented back without account context. Consumption
//! only burns the record; the caller replaces the password and bumps the
//! token version.

use std::sync::Arc;

use chrono::Duration;

use crate::application::config::AuthConfig;
use crate::domain::entity::password_reset::PasswordReset;
use crate::domain::repository::PasswordResetRepository;
use crate::domain::value_object::account_id::AccountId;
use crate::error::{AuthError, AuthResult};

/// Entropy of the reset token before base64url encoding
const RESET_TOKEN_BYTES: usize = 32;

pub struct PasswordResetFlow<R>
where
    R: PasswordResetRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> PasswordResetFlow<R>
where
    R: PasswordResetRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Issue a reset token for the account, returning the raw token
    pub async fn issue(&self, account_id: &AccountId) -> AuthResult<String> {
        let token = platform::crypto::generate_url_safe_token(RESET_TOKEN_BYTES);
        let ttl = Duration::from_std(self.config.reset_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = PasswordReset::new(
            *account_id,
            platform::crypto::hash_secret(&token),
            ttl,
        );

        if !self.repo.insert_if_none_active(&record).await? {
            tracing::debug!(account_id = %account_id, "Reset token already issued");
            return Err(AuthError::TooManyRequests);
        }

        Ok(token)
    }

    /// Consume a presented token, returning the burned record
    ///
    /// Unknown, revoked, and expired tokens all answer `InvalidToken`.
    pub async fn consume(&self, token: &str) -> AuthResult<PasswordReset> {
        let hash = platform::crypto::hash_secret(token);

        let record = self
            .repo
            .find_active_by_token_hash(&hash)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.repo.mark_consumed(record.id).await?;
        Ok(record)
    }
}

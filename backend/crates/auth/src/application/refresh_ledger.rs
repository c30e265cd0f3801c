//! Refresh Token Ledger
//!
//! Single-use accounting for refresh tokens. Rotation rides on the
//! storage-level atomic claim: of two concurrent presentations of the
//! same token exactly one revokes-and-returns the row, and the loser
//! lands on the reuse-detection path, which revokes the whole family.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::refresh_token::RefreshTokenRecord;
use crate::domain::repository::RefreshTokenRepository;
use crate::domain::value_object::account_id::AccountId;
use crate::error::{AuthError, AuthResult};

pub struct RefreshTokenLedger<R>
where
    R: RefreshTokenRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> RefreshTokenLedger<R>
where
    R: RefreshTokenRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Record a freshly issued token
    pub async fn issue(
        &self,
        account_id: &AccountId,
        token: &str,
        device_info: String,
    ) -> AuthResult<()> {
        let ttl = Duration::from_std(self.config.refresh_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = RefreshTokenRecord::new(
            *account_id,
            platform::crypto::hash_secret(token),
            device_info,
            ttl,
        );

        self.repo.create(&record).await
    }

    /// Rotate a presented token, returning the burned record
    ///
    /// A token that exists but is no longer active means the client (or
    /// an attacker) replayed it: every token for that account is revoked
    /// and the caller gets `SessionCompromised`. A token with no ledger
    /// row at all is merely `InvalidToken`.
    pub async fn rotate(&self, token: &str) -> AuthResult<RefreshTokenRecord> {
        let hash = platform::crypto::hash_secret(token);

        if let Some(record) = self.repo.claim_active(&hash).await? {
            return Ok(record);
        }

        match self.repo.find_by_token_hash(&hash).await? {
            Some(record) => {
                let revoked = self.repo.revoke_all_for_account(&record.account_id).await?;
                tracing::warn!(
                    account_id = %record.account_id,
                    tokens_revoked = revoked,
                    "Refresh token reuse detected, session family revoked"
                );
                Err(AuthError::SessionCompromised)
            }
            None => Err(AuthError::InvalidToken),
        }
    }

    /// Look up the ledger entry for a presented token, any state
    pub async fn find(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let hash = platform::crypto::hash_secret(token);
        self.repo.find_by_token_hash(&hash).await
    }

    /// Revoke a single token (idempotent; unknown tokens are a no-op)
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        let hash = platform::crypto::hash_secret(token);
        self.repo.revoke_by_token_hash(&hash).await
    }

    /// Revoke every token for the account except the presented one
    pub async fn revoke_all_except(&self, account_id: &AccountId, token: &str) -> AuthResult<u64> {
        let hash = platform::crypto::hash_secret(token);
        self.repo.revoke_all_except(account_id, &hash).await
    }

    /// Revoke every token for the account
    pub async fn revoke_all(&self, account_id: &AccountId) -> AuthResult<u64> {
        self.repo.revoke_all_for_account(account_id).await
    }

    /// Delete terminal-state rows older than the cutoff
    pub async fn sweep(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        self.repo.delete_older_than(cutoff).await
    }
}

//! Logout Use Cases
//!
//! Single-device logout revokes the presented refresh token; the
//! other-devices variant keeps the presented one alive and revokes the
//! rest.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::refresh_ledger::RefreshTokenLedger;
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Logout use case
pub struct LogoutUseCase<A, R>
where
    A: AccountRepository,
    R: RefreshTokenRepository,
{
    account_repo: Arc<A>,
    ledger: RefreshTokenLedger<R>,
    issuer: Arc<TokenIssuer>,
}

impl<A, R> LogoutUseCase<A, R>
where
    A: AccountRepository,
    R: RefreshTokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        refresh_repo: Arc<R>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            ledger: RefreshTokenLedger::new(refresh_repo, config),
            issuer,
        }
    }

    /// Revoke the presented refresh token (idempotent; an already-revoked
    /// or unknown token still logs out cleanly)
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<()> {
        self.ledger.revoke(refresh_token).await
    }

    /// Revoke every other device's refresh token, keeping this one
    pub async fn logout_all_others(&self, refresh_token: &str) -> AuthResult<u64> {
        let claims = self.issuer.verify(refresh_token)?;

        let email = Email::new(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let account = self
            .account_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.issuer.validate_against_account(&claims, &account)?;

        // The presented token must be on the ledger; a signed token that
        // was never recorded cannot drive revocation
        if self.ledger.find(refresh_token).await?.is_none() {
            return Err(AuthError::InvalidToken);
        }

        let revoked = self
            .ledger
            .revoke_all_except(&account.account_id, refresh_token)
            .await?;

        tracing::info!(
            public_id = %account.public_id,
            tokens_revoked = revoked,
            "Other devices logged out"
        );

        Ok(revoked)
    }
}

//! Refresh Use Case
//!
//! Rotates a presented refresh token into a fresh pair. The signature
//! and version claim are checked first; the ledger then enforces
//! single-use and detects replay.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::refresh_ledger::RefreshTokenLedger;
use crate::domain::repository::{AccountRepository, RefreshTokenRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Refresh output
pub struct RefreshOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Refresh use case
pub struct RefreshUseCase<A, R>
where
    A: AccountRepository,
    R: RefreshTokenRepository,
{
    account_repo: Arc<A>,
    ledger: RefreshTokenLedger<R>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<A, R> RefreshUseCase<A, R>
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
            ledger: RefreshTokenLedger::new(refresh_repo, config.clone()),
            issuer,
            config,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let claims = self.issuer.verify(refresh_token)?;

        let email = Email::new(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let account = self
            .account_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.issuer.validate_against_account(&claims, &account)?;

        if !account.can_login() {
            return Err(AuthError::InvalidToken);
        }

        // Atomic single-use claim; replay revokes the whole family
        let burned = self.ledger.rotate(refresh_token).await?;

        let access_token = self.issuer.issue_access(&account)?;
        let new_refresh = self.issuer.issue_refresh(&account)?;
        // Device info carries over from the burned record
        self.ledger
            .issue(&account.account_id, &new_refresh, burned.device_info)
            .await?;

        tracing::debug!(public_id = %account.public_id, "Tokens rotated");

        Ok(RefreshOutput {
            access_token,
            refresh_token: new_refresh,
            expires_in: self.config.access_token_ttl.as_secs(),
        })
    }
}

//! Password Recovery Use Cases
//!
//! Forgot-password always answers with generic success: unknown emails
//! and throttled requests look identical from outside, so the endpoint
//! cannot be used to enumerate accounts. Reset consumes the token,
//! replaces the password, bumps the token version and revokes every
//! refresh token.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::password_reset::PasswordResetFlow;
use crate::application::refresh_ledger::RefreshTokenLedger;
use crate::domain::repository::{
    AccountRepository, PasswordResetRepository, RefreshTokenRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::mailer::Mailer;

/// Forgot password use case
pub struct ForgotPasswordUseCase<A, P, M>
where
    A: AccountRepository,
    P: PasswordResetRepository,
    M: Mailer,
{
    account_repo: Arc<A>,
    flow: PasswordResetFlow<P>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<A, P, M> ForgotPasswordUseCase<A, P, M>
where
    A: AccountRepository,
    P: PasswordResetRepository,
    M: Mailer,
{
    pub fn new(
        account_repo: Arc<A>,
        reset_repo: Arc<P>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            flow: PasswordResetFlow::new(reset_repo, config.clone()),
            mailer,
            config,
        }
    }

    /// Always succeeds from the caller's point of view
    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = match Email::new(email) {
            Ok(email) => email,
            Err(_) => return Ok(()),
        };

        let account = match self.account_repo.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                tracing::debug!(to = %email.masked(), "Reset requested for unknown email");
                return Ok(());
            }
        };

        let token = match self.flow.issue(&account.account_id).await {
            Ok(token) => token,
            // A pending token means a mail already went out; stay silent
            Err(AuthError::TooManyRequests) => {
                tracing::debug!(public_id = %account.public_id, "Reset token still pending");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let body = format!(
            "Reset your password: {}/reset-password?token={}\n\
             The link expires in {} minutes.",
            self.config.frontend_base_url,
            token,
            self.config.reset_token_ttl.as_secs() / 60
        );

        if let Err(e) = self
            .mailer
            .send(account.email.as_str(), "Password reset", &body)
            .await
        {
            tracing::warn!(
                to = %account.email.masked(),
                error = %e,
                "Failed to send reset email"
            );
        }

        tracing::info!(public_id = %account.public_id, "Password reset requested");
        Ok(())
    }
}

/// Reset password use case
pub struct ResetPasswordUseCase<A, P, R>
where
    A: AccountRepository,
    P: PasswordResetRepository,
    R: RefreshTokenRepository,
{
    account_repo: Arc<A>,
    flow: PasswordResetFlow<P>,
    ledger: RefreshTokenLedger<R>,
    config: Arc<AuthConfig>,
}

impl<A, P, R> ResetPasswordUseCase<A, P, R>
where
    A: AccountRepository,
    P: PasswordResetRepository,
    R: RefreshTokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        reset_repo: Arc<P>,
        refresh_repo: Arc<R>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            flow: PasswordResetFlow::new(reset_repo, config.clone()),
            ledger: RefreshTokenLedger::new(refresh_repo, config.clone()),
            config,
        }
    }

    pub async fn execute(&self, token: &str, new_password: String) -> AuthResult<()> {
        let new_password = ClearTextPassword::new(new_password)?;

        let record = self.flow.consume(token).await?;

        let mut account = self
            .account_repo
            .find_by_id(&record.account_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Reset record points at missing account".to_string()))?;

        account.set_password(new_password.hash(self.config.pepper())?);
        // Invalidate every outstanding access and refresh token
        account.rotate_token_version();
        self.account_repo.update(&account).await?;

        let revoked = self.ledger.revoke_all(&account.account_id).await?;

        tracing::info!(
            public_id = %account.public_id,
            tokens_revoked = revoked,
            "Password reset completed"
        );

        Ok(())
    }
}

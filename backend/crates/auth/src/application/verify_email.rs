//! Verify Email Use Case
//!
//! Consumes the OTP and flips the account to verified; also handles
//! resending the code.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::otp::OtpVerifier;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, EmailVerificationRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::mailer::Mailer;

/// Verify email use case (also owns the resend path)
pub struct VerifyEmailUseCase<A, V, M>
where
    A: AccountRepository,
    V: EmailVerificationRepository,
    M: Mailer,
{
    account_repo: Arc<A>,
    otp: OtpVerifier<V>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<A, V, M> VerifyEmailUseCase<A, V, M>
where
    A: AccountRepository,
    V: EmailVerificationRepository,
    M: Mailer,
{
    pub fn new(
        account_repo: Arc<A>,
        verification_repo: Arc<V>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            otp: OtpVerifier::new(verification_repo, config.clone()),
            mailer,
            config,
        }
    }

    /// Consume the OTP and mark the account verified
    pub async fn execute(&self, email: &str, code: &str) -> AuthResult<()> {
        let mut account = self.find_account(email).await?;

        if account.is_email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.otp.consume(&account.account_id, code).await?;

        account.mark_verified();
        self.account_repo.update(&account).await?;

        tracing::info!(public_id = %account.public_id, "Email verified");
        Ok(())
    }

    /// Issue and send a fresh OTP
    pub async fn resend(&self, email: &str) -> AuthResult<()> {
        let account = self.find_account(email).await?;

        if account.is_email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = self.otp.issue(&account.account_id).await?;

        let body = format!(
            "Your verification code is {}. It expires in {} minutes.",
            code,
            self.config.otp_ttl.as_secs() / 60
        );

        if let Err(e) = self
            .mailer
            .send(account.email.as_str(), "Verify your email address", &body)
            .await
        {
            tracing::warn!(
                to = %account.email.masked(),
                error = %e,
                "Failed to send verification email"
            );
        }

        tracing::info!(public_id = %account.public_id, "Verification code resent");
        Ok(())
    }

    async fn find_account(&self, email: &str) -> AuthResult<Account> {
        let email = Email::new(email).map_err(AuthError::from)?;
        self.account_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)
    }
}

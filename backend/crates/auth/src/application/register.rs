//! Register Use Case
//!
//! Creates an unverified account and sends the email verification OTP.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::otp::OtpVerifier;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, EmailVerificationRepository};
use crate::domain::value_object::{email::Email, username::Username};
use crate::error::{AuthError, AuthResult};
use crate::mailer::Mailer;

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    pub public_id: String,
}

/// Register use case
pub struct RegisterUseCase<A, V, M>
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

impl<A, V, M> RegisterUseCase<A, V, M>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(&input.email).map_err(AuthError::from)?;
        let username = Username::new(&input.username).map_err(AuthError::from)?;
        let password = ClearTextPassword::new(input.password)?;

        if self.account_repo.exists_by_email(&email).await? {
            return Err(AuthError::AlreadyExists);
        }
        if self.account_repo.exists_by_username(&username).await? {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = password.hash(self.config.pepper())?;
        let account = Account::new(email, username, password_hash);
        self.account_repo.create(&account).await?;

        let code = self.otp.issue(&account.account_id).await?;
        self.send_otp(&account, &code).await;

        tracing::info!(public_id = %account.public_id, "Account registered");

        Ok(RegisterOutput {
            public_id: account.public_id.to_string(),
        })
    }

    /// Fire-and-forget OTP mail
    async fn send_otp(&self, account: &Account, code: &str) {
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
    }
}

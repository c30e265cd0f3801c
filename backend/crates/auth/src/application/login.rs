//! Login Use Case
//!
//! Password authentication with brute-force lockout. Unknown accounts,
//! wrong passwords, and passwordless (social-only) accounts all answer
//! `InvalidCredentials`; only the lockout and unverified states leak
//! more, deliberately, so the user can act on them.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::login_guard::LoginGuard;
use crate::application::refresh_ledger::RefreshTokenLedger;
use crate::domain::repository::{
    AccountRepository, FailedLoginRepository, RefreshTokenRepository,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client_ip: Option<String>,
    pub device_info: String,
}

/// Login output
pub struct LoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub public_id: String,
    /// Access token lifetime in seconds, for the response body
    pub expires_in: u64,
}

/// Login use case
pub struct LoginUseCase<A, F, R>
where
    A: AccountRepository,
    F: FailedLoginRepository,
    R: RefreshTokenRepository,
{
    account_repo: Arc<A>,
    guard: LoginGuard<F>,
    ledger: RefreshTokenLedger<R>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<A, F, R> LoginUseCase<A, F, R>
where
    A: AccountRepository,
    F: FailedLoginRepository,
    R: RefreshTokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        failed_login_repo: Arc<F>,
        refresh_repo: Arc<R>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            account_repo,
            guard: LoginGuard::new(failed_login_repo, config.clone()),
            ledger: RefreshTokenLedger::new(refresh_repo, config.clone()),
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let account = match self.account_repo.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                self.guard.record_failure(None, input.client_ip).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        // Unverified accounts answer NotVerified regardless of the
        // password; their attempts never count toward lockout
        if !account.is_email_verified {
            return Err(AuthError::NotVerified);
        }

        // Lockout before password verification: a locked account
        // answers the same whether or not the password is correct
        if self.guard.is_locked(&account.account_id).await? {
            return Err(AuthError::AccountLocked);
        }

        let password = ClearTextPassword::new(input.password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let password_valid = account
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&password, self.config.pepper()));

        if !password_valid {
            self.guard
                .record_failure(Some(account.account_id), input.client_ip)
                .await?;
            return Err(AuthError::InvalidCredentials);
        }

        if !account.can_login() {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issuer.issue_access(&account)?;
        let refresh_token = self.issuer.issue_refresh(&account)?;
        self.ledger
            .issue(&account.account_id, &refresh_token, input.device_info)
            .await?;

        tracing::info!(public_id = %account.public_id, "Login");

        Ok(LoginOutput {
            access_token,
            refresh_token,
            public_id: account.public_id.to_string(),
            expires_in: self.config.access_token_ttl.as_secs(),
        })
    }
}

//! Login Guard
//!
//! Brute-force lockout over the append-only failed-login log. An account
//! is locked while the trailing-window failure count is at or above the
//! threshold; the lock clears by itself as attempts age out of the
//! window.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::failed_login::FailedLogin;
use crate::domain::repository::FailedLoginRepository;
use crate::domain::value_object::account_id::AccountId;
use crate::error::AuthResult;

pub struct LoginGuard<F>
where
    F: FailedLoginRepository,
{
    repo: Arc<F>,
    config: Arc<AuthConfig>,
}

impl<F> LoginGuard<F>
where
    F: FailedLoginRepository,
{
    pub fn new(repo: Arc<F>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Append a failed attempt (account may be unknown)
    pub async fn record_failure(
        &self,
        account_id: Option<AccountId>,
        ip: Option<String>,
    ) -> AuthResult<()> {
        let attempt = FailedLogin::new(account_id, ip);
        self.repo.record(&attempt).await
    }

    /// Check whether the account is currently locked
    ///
    /// Evaluated before password verification so a locked account
    /// answers identically for correct and incorrect passwords.
    pub async fn is_locked(&self, account_id: &AccountId) -> AuthResult<bool> {
        let since = Utc::now() - self.config.failure_window_chrono();
        let failures = self.repo.count_recent(account_id, since).await?;
        Ok(failures >= self.config.max_login_failures)
    }
}

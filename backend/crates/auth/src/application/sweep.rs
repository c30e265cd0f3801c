//! Retention Sweep Use Case
//!
//! Deletes aged-out one-time records, revoked/expired refresh tokens,
//! and old failed-login rows. Runs at startup and on a periodic timer;
//! never touches rows a request could still act on.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{
    EmailVerificationRepository, FailedLoginRepository, PasswordResetRepository,
    RefreshTokenRepository,
};
use crate::error::AuthResult;

/// Sweep result counts
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub verifications: u64,
    pub resets: u64,
    pub refresh_tokens: u64,
    pub failed_logins: u64,
}

/// Retention sweep use case
pub struct SweepUseCase<V, P, R, F>
where
    V: EmailVerificationRepository,
    P: PasswordResetRepository,
    R: RefreshTokenRepository,
    F: FailedLoginRepository,
{
    verification_repo: Arc<V>,
    reset_repo: Arc<P>,
    refresh_repo: Arc<R>,
    failed_login_repo: Arc<F>,
    config: Arc<AuthConfig>,
}

impl<V, P, R, F> SweepUseCase<V, P, R, F>
where
    V: EmailVerificationRepository,
    P: PasswordResetRepository,
    R: RefreshTokenRepository,
    F: FailedLoginRepository,
{
    pub fn new(
        verification_repo: Arc<V>,
        reset_repo: Arc<P>,
        refresh_repo: Arc<R>,
        failed_login_repo: Arc<F>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            verification_repo,
            reset_repo,
            refresh_repo,
            failed_login_repo,
            config,
        }
    }

    pub async fn execute(&self) -> AuthResult<SweepReport> {
        let cutoff = Utc::now() - self.config.retention_chrono();

        let report = SweepReport {
            verifications: self.verification_repo.delete_older_than(cutoff).await?,
            resets: self.reset_repo.delete_older_than(cutoff).await?,
            refresh_tokens: self.refresh_repo.delete_older_than(cutoff).await?,
            failed_logins: self.failed_login_repo.delete_older_than(cutoff).await?,
        };

        tracing::info!(
            verifications = report.verifications,
            resets = report.resets,
            refresh_tokens = report.refresh_tokens,
            failed_logins = report.failed_logins,
            "Retention sweep completed"
        );

        Ok(report)
    }
}

//! End-to-end use case scenarios over in-memory repositories.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::{
    ForgotPasswordUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshUseCase,
    RegisterInput, RegisterUseCase, ResetPasswordUseCase, SocialIdentityInput,
    SocialLoginUseCase, VerifyEmailUseCase,
};
use crate::domain::entity::{
    account::Account, email_verification::EmailVerification, external_identity::ExternalIdentity,
    failed_login::FailedLogin, password_reset::PasswordReset, refresh_token::RefreshTokenRecord,
};
use crate::domain::repository::{
    AccountRepository, EmailVerificationRepository, ExternalIdentityRepository,
    FailedLoginRepository, PasswordResetRepository, RefreshTokenRepository,
};
use crate::domain::value_object::{account_id::AccountId, email::Email, username::Username};
use crate::error::{AuthError, AuthResult};
use crate::mailer::Mailer;
use crate::token::TokenIssuer;
use platform::password::ClearTextPassword;

// ============================================================================
// In-memory repository
// ============================================================================

#[derive(Clone, Default)]
struct MemRepo {
    accounts: Arc<Mutex<Vec<Account>>>,
    verifications: Arc<Mutex<Vec<EmailVerification>>>,
    resets: Arc<Mutex<Vec<PasswordReset>>>,
    refresh_tokens: Arc<Mutex<Vec<RefreshTokenRecord>>>,
    failed_logins: Arc<Mutex<Vec<FailedLogin>>>,
    identities: Arc<Mutex<Vec<ExternalIdentity>>>,
}

impl AccountRepository for MemRepo {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        self.accounts.lock().unwrap().push(account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.account_id == *account_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.email == *email))
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.username.canonical() == username.canonical()))
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(stored) = accounts
            .iter_mut()
            .find(|a| a.account_id == account.account_id)
        {
            *stored = account.clone();
        }
        Ok(())
    }
}

impl EmailVerificationRepository for MemRepo {
    async fn insert_if_none_active(&self, record: &EmailVerification) -> AuthResult<bool> {
        let mut records = self.verifications.lock().unwrap();
        if records
            .iter()
            .any(|r| r.account_id == record.account_id && r.is_active())
        {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn find_active_by_account(
        &self,
        account_id: &AccountId,
    ) -> AuthResult<Option<EmailVerification>> {
        Ok(self
            .verifications
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.account_id == *account_id && r.is_active())
            .cloned())
    }

    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()> {
        let mut records = self.verifications.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.consumed = true;
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut records = self.verifications.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

impl PasswordResetRepository for MemRepo {
    async fn insert_if_none_active(&self, record: &PasswordReset) -> AuthResult<bool> {
        let mut records = self.resets.lock().unwrap();
        if records
            .iter()
            .any(|r| r.account_id == record.account_id && r.is_active())
        {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn find_active_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<PasswordReset>> {
        Ok(self
            .resets
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.token_hash == token_hash && r.is_active())
            .cloned())
    }

    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()> {
        let mut records = self.resets.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.consumed = true;
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut records = self.resets.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

impl RefreshTokenRepository for MemRepo {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        self.refresh_tokens.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn claim_active(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let mut records = self.refresh_tokens.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.token_hash == token_hash && r.is_active())
        {
            record.revoked = true;
            return Ok(Some(record.clone()));
        }
        Ok(None)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(self
            .refresh_tokens
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_by_token_hash(&self, token_hash: &str) -> AuthResult<()> {
        let mut records = self.refresh_tokens.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.token_hash == token_hash) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_account(&self, account_id: &AccountId) -> AuthResult<u64> {
        let mut records = self.refresh_tokens.lock().unwrap();
        let mut revoked = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.account_id == *account_id && !r.revoked)
        {
            record.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn revoke_all_except(
        &self,
        account_id: &AccountId,
        token_hash: &str,
    ) -> AuthResult<u64> {
        let mut records = self.refresh_tokens.lock().unwrap();
        let mut revoked = 0;
        for record in records.iter_mut().filter(|r| {
            r.account_id == *account_id && r.token_hash != token_hash && !r.revoked
        }) {
            record.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut records = self.refresh_tokens.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff || r.is_active());
        Ok((before - records.len()) as u64)
    }
}

impl FailedLoginRepository for MemRepo {
    async fn record(&self, attempt: &FailedLogin) -> AuthResult<()> {
        self.failed_logins.lock().unwrap().push(attempt.clone());
        Ok(())
    }

    async fn count_recent(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> AuthResult<i64> {
        Ok(self
            .failed_logins
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.account_id == Some(*account_id) && a.attempted_at >= since)
            .count() as i64)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut records = self.failed_logins.lock().unwrap();
        let before = records.len();
        records.retain(|a| a.attempted_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

impl ExternalIdentityRepository for MemRepo {
    async fn create(&self, identity: &ExternalIdentity) -> AuthResult<()> {
        self.identities.lock().unwrap().push(identity.clone());
        Ok(())
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<ExternalIdentity>> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.provider == provider && i.provider_user_id == provider_user_id)
            .cloned())
    }
}

// ============================================================================
// Recording mailer
// ============================================================================

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

impl RecordingMailer {
    /// Numeric OTP from the most recent message
    fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, _, body) = sent.last().expect("no mail sent");
        body.split_whitespace()
            .map(|w| w.trim_end_matches('.'))
            .find(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_digit()))
            .expect("no code in mail body")
            .to_string()
    }

    /// Reset token from the most recent message
    fn last_reset_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, _, body) = sent.last().expect("no mail sent");
        let start = body.find("token=").expect("no token in mail body") + "token=".len();
        body[start..]
            .split_whitespace()
            .next()
            .expect("empty token")
            .to_string()
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    repo: Arc<MemRepo>,
    mailer: Arc<RecordingMailer>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl Fixture {
    fn new() -> Self {
        let config = Arc::new(AuthConfig::development());
        let issuer = Arc::new(TokenIssuer::from_secret(
            &config.token_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        ));
        Self {
            repo: Arc::new(MemRepo::default()),
            mailer: Arc::new(RecordingMailer::default()),
            issuer,
            config,
        }
    }

    fn register(&self) -> RegisterUseCase<MemRepo, MemRepo, RecordingMailer> {
        RegisterUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn verify(&self) -> VerifyEmailUseCase<MemRepo, MemRepo, RecordingMailer> {
        VerifyEmailUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn login(&self) -> LoginUseCase<MemRepo, MemRepo, MemRepo> {
        LoginUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    fn refresh(&self) -> RefreshUseCase<MemRepo, MemRepo> {
        RefreshUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    fn logout(&self) -> LogoutUseCase<MemRepo, MemRepo> {
        LogoutUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    fn forgot(&self) -> ForgotPasswordUseCase<MemRepo, MemRepo, RecordingMailer> {
        ForgotPasswordUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn reset(&self) -> ResetPasswordUseCase<MemRepo, MemRepo, MemRepo> {
        ResetPasswordUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.config.clone(),
        )
    }

    fn social(&self) -> SocialLoginUseCase<MemRepo, MemRepo, MemRepo> {
        SocialLoginUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.issuer.clone(),
            self.config.clone(),
        )
    }

    /// Register and verify an account, returning nothing; panics on failure
    async fn registered_verified(&self, email: &str, username: &str, password: &str) {
        self.register()
            .execute(RegisterInput {
                email: email.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap();
        let code = self.mailer.last_code();
        self.verify().execute(email, &code).await.unwrap();
    }

    async fn login_ok(&self, email: &str, password: &str, device: &str) -> (String, String) {
        let output = self
            .login()
            .execute(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
                client_ip: None,
                device_info: device.to_string(),
            })
            .await
            .unwrap();
        (output.access_token, output.refresh_token)
    }
}

const EMAIL: &str = "user@example.com";
const USERNAME: &str = "user01";
const PASSWORD: &str = "CorrectHorse42!";

// ============================================================================
// Registration and verification
// ============================================================================

#[tokio::test]
async fn register_then_verify_then_login() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let (access, _refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    // Stored hash verifies the original password
    let account = fx
        .repo
        .find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap();
    let password = ClearTextPassword::new(PASSWORD.to_string()).unwrap();
    assert!(
        account
            .password_hash
            .as_ref()
            .unwrap()
            .verify(&password, fx.config.pepper())
    );

    // Access token checks out against the account
    let claims = fx.issuer.verify(&access).unwrap();
    fx.issuer.validate_against_account(&claims, &account).unwrap();
}

#[tokio::test]
async fn login_before_verification_is_rejected() {
    let fx = Fixture::new();
    fx.register()
        .execute(RegisterInput {
            email: EMAIL.to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    let result = fx
        .login()
        .execute(LoginInput {
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
            client_ip: None,
            device_info: "laptop".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::NotVerified)));
}

#[tokio::test]
async fn unverified_account_answers_not_verified_even_with_wrong_password() {
    let fx = Fixture::new();
    fx.register()
        .execute(RegisterInput {
            email: EMAIL.to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    let result = fx
        .login()
        .execute(LoginInput {
            email: EMAIL.to_string(),
            password: "WrongPassword99!".to_string(),
            client_ip: None,
            device_info: "laptop".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::NotVerified)));

    // The attempt did not count toward lockout
    assert!(fx.repo.failed_logins.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_otp_is_rejected_and_correct_one_verifies() {
    let fx = Fixture::new();
    fx.register()
        .execute(RegisterInput {
            email: EMAIL.to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    let code = fx.mailer.last_code();
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let result = fx.verify().execute(EMAIL, wrong).await;
    assert!(matches!(result, Err(AuthError::InvalidOtp)));

    fx.verify().execute(EMAIL, &code).await.unwrap();

    // Second verification attempt
    let result = fx.verify().execute(EMAIL, &code).await;
    assert!(matches!(result, Err(AuthError::AlreadyVerified)));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let result = fx
        .register()
        .execute(RegisterInput {
            email: EMAIL.to_string(),
            username: "someoneelse".to_string(),
            password: PASSWORD.to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::AlreadyExists)));

    let result = fx
        .register()
        .execute(RegisterInput {
            email: "other@example.com".to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::AlreadyExists)));
}

#[tokio::test]
async fn resend_while_otp_active_is_throttled() {
    let fx = Fixture::new();
    fx.register()
        .execute(RegisterInput {
            email: EMAIL.to_string(),
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();

    // The registration OTP is still active
    let result = fx.verify().resend(EMAIL).await;
    assert!(matches!(result, Err(AuthError::TooManyRequests)));
}

// ============================================================================
// Lockout
// ============================================================================

#[tokio::test]
async fn lockout_applies_even_with_correct_password() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    for _ in 0..fx.config.max_login_failures {
        let result = fx
            .login()
            .execute(LoginInput {
                email: EMAIL.to_string(),
                password: "WrongPassword99!".to_string(),
                client_ip: None,
                device_info: "laptop".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    // Threshold reached: the correct password answers AccountLocked
    let result = fx
        .login()
        .execute(LoginInput {
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
            client_ip: None,
            device_info: "laptop".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::AccountLocked)));
}

#[tokio::test]
async fn unknown_email_answers_invalid_credentials() {
    let fx = Fixture::new();

    let result = fx
        .login()
        .execute(LoginInput {
            email: "nobody@example.com".to_string(),
            password: PASSWORD.to_string(),
            client_ip: None,
            device_info: "laptop".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

// ============================================================================
// Refresh rotation and reuse detection
// ============================================================================

#[tokio::test]
async fn refresh_token_is_single_use_and_reuse_revokes_family() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let (_, refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    // First rotation succeeds
    let rotated = fx.refresh().execute(&refresh).await.unwrap();

    // Replaying the burned token trips reuse detection
    let result = fx.refresh().execute(&refresh).await;
    assert!(matches!(result, Err(AuthError::SessionCompromised)));

    // The freshly rotated token was revoked with the rest of the family
    let result = fx.refresh().execute(&rotated.refresh_token).await;
    assert!(matches!(result, Err(AuthError::SessionCompromised)));
}

#[tokio::test]
async fn unknown_refresh_token_is_invalid_not_compromised() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;
    fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    // Signed by us but never recorded in the ledger
    let account = fx
        .repo
        .find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap();
    let unrecorded = fx.issuer.issue_refresh(&account).unwrap();

    let result = fx.refresh().execute(&unrecorded).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_is_idempotent() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;
    let (_, refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    fx.logout().execute(&refresh).await.unwrap();
    fx.logout().execute(&refresh).await.unwrap();
    fx.logout().execute("never-issued").await.unwrap();

    // A revoked token cannot rotate
    let result = fx.refresh().execute(&refresh).await;
    assert!(matches!(result, Err(AuthError::SessionCompromised)));
}

#[tokio::test]
async fn logout_others_keeps_current_device() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let (_, refresh_a) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;
    let (_, refresh_b) = fx.login_ok(EMAIL, PASSWORD, "phone").await;

    let revoked = fx.logout().logout_all_others(&refresh_b).await.unwrap();
    assert_eq!(revoked, 1);

    // The presented device still rotates
    fx.refresh().execute(&refresh_b).await.unwrap();

    // The other device's token is gone
    let result = fx.refresh().execute(&refresh_a).await;
    assert!(matches!(result, Err(AuthError::SessionCompromised)));
}

#[tokio::test]
async fn logout_others_rejects_unrecorded_token() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;
    let (_, refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    // Signed by us but never recorded in the ledger
    let account = fx
        .repo
        .find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap();
    let unrecorded = fx.issuer.issue_refresh(&account).unwrap();

    let result = fx.logout().logout_all_others(&unrecorded).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));

    // The real session was left alone
    fx.refresh().execute(&refresh).await.unwrap();
}

// ============================================================================
// Password recovery
// ============================================================================

#[tokio::test]
async fn reset_password_invalidates_all_tokens() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let (access, refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;
    let (_, refresh_other) = fx.login_ok(EMAIL, PASSWORD, "phone").await;

    fx.forgot().execute(EMAIL).await.unwrap();
    let token = fx.mailer.last_reset_token();

    let new_password = "BrandNewSecret7!";
    fx.reset().execute(&token, new_password.to_string()).await.unwrap();

    // Old access token fails the version check
    let account = fx
        .repo
        .find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap();
    let claims = fx.issuer.verify(&access).unwrap();
    assert!(fx.issuer.validate_against_account(&claims, &account).is_err());

    // Every refresh token was revoked
    assert!(fx.refresh().execute(&refresh).await.is_err());
    assert!(fx.refresh().execute(&refresh_other).await.is_err());

    // Old password no longer works, new one does
    let result = fx
        .login()
        .execute(LoginInput {
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
            client_ip: None,
            device_info: "laptop".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));

    fx.login_ok(EMAIL, new_password, "laptop").await;
}

#[tokio::test]
async fn consumed_reset_token_cannot_be_replayed() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    fx.forgot().execute(EMAIL).await.unwrap();
    let token = fx.mailer.last_reset_token();

    fx.reset()
        .execute(&token, "BrandNewSecret7!".to_string())
        .await
        .unwrap();

    let result = fx.reset().execute(&token, "AnotherSecret8!".to_string()).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn forgot_password_is_enumeration_safe() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    // Unknown email: generic success, nothing sent
    let sent_before = fx.mailer.sent.lock().unwrap().len();
    fx.forgot().execute("nobody@example.com").await.unwrap();
    assert_eq!(fx.mailer.sent.lock().unwrap().len(), sent_before);

    // Known email: mail goes out
    fx.forgot().execute(EMAIL).await.unwrap();
    assert_eq!(fx.mailer.sent.lock().unwrap().len(), sent_before + 1);

    // Second request while a token is pending: still generic success
    fx.forgot().execute(EMAIL).await.unwrap();
    assert_eq!(fx.mailer.sent.lock().unwrap().len(), sent_before + 1);
}

// ============================================================================
// Single-active invariant
// ============================================================================

#[tokio::test]
async fn at_most_one_active_otp_per_account() {
    let fx = Fixture::new();
    let hash = ClearTextPassword::new(PASSWORD.to_string())
        .unwrap()
        .hash(None)
        .unwrap();
    let account = Account::new(
        Email::new(EMAIL).unwrap(),
        Username::new(USERNAME).unwrap(),
        hash,
    );
    AccountRepository::create(fx.repo.as_ref(), &account)
        .await
        .unwrap();

    let otp = crate::application::OtpVerifier::new(fx.repo.clone(), fx.config.clone());

    otp.issue(&account.account_id).await.unwrap();
    let result = otp.issue(&account.account_id).await;
    assert!(matches!(result, Err(AuthError::TooManyRequests)));

    assert_eq!(
        fx.repo
            .verifications
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active())
            .count(),
        1
    );
}

// ============================================================================
// Social login
// ============================================================================

fn social_input(provider: &str, uid: &str, email: &str) -> SocialIdentityInput {
    SocialIdentityInput {
        provider: provider.to_string(),
        provider_user_id: uid.to_string(),
        email: email.to_string(),
        profile: serde_json::json!({ "name": "Sample User" }),
    }
}

#[tokio::test]
async fn social_login_creates_verified_account_once() {
    let fx = Fixture::new();

    let first = fx
        .social()
        .execute(social_input("google", "uid-1", "social@example.com"), "laptop".to_string())
        .await
        .unwrap();

    let second = fx
        .social()
        .execute(social_input("google", "uid-1", "social@example.com"), "phone".to_string())
        .await
        .unwrap();

    assert_eq!(first.public_id, second.public_id);
    assert_eq!(fx.repo.accounts.lock().unwrap().len(), 1);

    let account = fx
        .repo
        .find_by_email(&Email::new("social@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(account.is_email_verified);
    assert!(account.password_hash.is_none());
}

#[tokio::test]
async fn social_login_rejects_colliding_email() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;

    let result = fx
        .social()
        .execute(social_input("google", "uid-1", EMAIL), "laptop".to_string())
        .await;

    assert!(matches!(result, Err(AuthError::EmailAlreadyRegistered)));
}

// ============================================================================
// Retention sweep
// ============================================================================

#[tokio::test]
async fn sweep_only_touches_terminal_rows() {
    let fx = Fixture::new();
    fx.registered_verified(EMAIL, USERNAME, PASSWORD).await;
    let (_, refresh) = fx.login_ok(EMAIL, PASSWORD, "laptop").await;

    // Age every row past the retention cutoff
    let old = Utc::now() - chrono::Duration::days(30);
    for record in fx.refresh_tokens_mut().iter_mut() {
        record.created_at = old;
    }
    for record in fx.repo.verifications.lock().unwrap().iter_mut() {
        record.created_at = old;
    }

    let sweep = crate::application::SweepUseCase::new(
        fx.repo.clone(),
        fx.repo.clone(),
        fx.repo.clone(),
        fx.repo.clone(),
        fx.config.clone(),
    );
    let report = sweep.execute().await.unwrap();

    // Consumed verification rows are gone; the live refresh token stays
    assert_eq!(report.verifications, 1);
    assert_eq!(report.refresh_tokens, 0);
    fx.refresh().execute(&refresh).await.unwrap();
}

impl Fixture {
    fn refresh_tokens_mut(&self) -> std::sync::MutexGuard<'_, Vec<RefreshTokenRecord>> {
        self.repo.refresh_tokens.lock().unwrap()
    }
}

// ============================================================================
// Token TTL sanity
// ============================================================================

#[test]
fn config_defaults_match_policy() {
    let config = AuthConfig::default();
    assert_eq!(config.access_token_ttl, Duration::from_secs(15 * 60));
    assert_eq!(config.otp_ttl, Duration::from_secs(5 * 60));
    assert_eq!(config.reset_token_ttl, Duration::from_secs(10 * 60));
    assert_eq!(config.max_login_failures, 5);
    assert_eq!(config.retention, Duration::from_secs(7 * 24 * 3600));
}

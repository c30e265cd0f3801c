//! Social Login
//!
//! Resolves a verified social identity to a local account, creating one
//! on first sight, then issues the usual token pair. Lockout does not
//! apply; the provider already authenticated the user.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::refresh_ledger::RefreshTokenLedger;
use crate::domain::entity::{account::Account, external_identity::ExternalIdentity};
use crate::domain::repository::{
    AccountRepository, ExternalIdentityRepository, RefreshTokenRepository,
};
use crate::domain::value_object::{email::Email, username::Username};
use crate::error::{AuthError, AuthResult};
use crate::token::TokenIssuer;

/// Verified identity asserted by a social provider
pub struct SocialIdentityInput {
    pub provider: String,
    pub provider_user_id: String,
    pub email: String,
    /// Raw profile payload, stored as-is on the identity link
    pub profile: serde_json::Value,
}

/// Finds or creates the account behind a social identity
pub struct SocialIdentityLinker<A, E>
where
    A: AccountRepository,
    E: ExternalIdentityRepository,
{
    account_repo: Arc<A>,
    identity_repo: Arc<E>,
}

impl<A, E> SocialIdentityLinker<A, E>
where
    A: AccountRepository,
    E: ExternalIdentityRepository,
{
    pub fn new(account_repo: Arc<A>, identity_repo: Arc<E>) -> Self {
        Self {
            account_repo,
            identity_repo,
        }
    }

    /// Resolve the identity to an account, creating both the account and
    /// the identity link on first sight.
    ///
    /// An email already held by an account without this identity link is
    /// a collision: linking is an explicit action, not an implicit merge.
    pub async fn find_or_create(&self, input: &SocialIdentityInput) -> AuthResult<Account> {
        let provider = input.provider.to_lowercase();

        if let Some(identity) = self
            .identity_repo
            .find_by_provider(&provider, &input.provider_user_id)
            .await?
        {
            return self
                .account_repo
                .find_by_id(&identity.account_id)
                .await?
                .ok_or_else(|| {
                    AuthError::Internal("Identity link points at missing account".to_string())
                });
        }

        let email = Email::new(&input.email).map_err(AuthError::from)?;

        if self.account_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let username = self.derive_username(&email).await?;
        let account = Account::new_social(email, username);
        self.account_repo.create(&account).await?;

        let identity = ExternalIdentity::new(
            account.account_id,
            provider,
            input.provider_user_id.clone(),
            input.profile.clone(),
        );
        self.identity_repo.create(&identity).await?;

        tracing::info!(
            public_id = %account.public_id,
            provider = %identity.provider,
            "Account created from social identity"
        );

        Ok(account)
    }

    /// Derive a free username from the email local part
    async fn derive_username(&self, email: &Email) -> AuthResult<Username> {
        let base: String = email
            .local_part()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
            .take(24)
            .collect();
        let base = if base.len() < 3 { "user".to_string() } else { base };

        if let Ok(username) = Username::new(&base) {
            if !self.account_repo.exists_by_username(&username).await? {
                return Ok(username);
            }
        }

        // Suffix with random digits until free; bounded to keep the
        // request finite
        for _ in 0..5 {
            let candidate = format!("{}-{}", base, platform::crypto::generate_numeric_code(4));
            if let Ok(username) = Username::new(&candidate) {
                if !self.account_repo.exists_by_username(&username).await? {
                    return Ok(username);
                }
            }
        }

        Err(AuthError::Internal(
            "Could not derive a free username".to_string(),
        ))
    }
}

/// Social login output
pub struct SocialLoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub public_id: String,
}

/// Social login use case
pub struct SocialLoginUseCase<A, E, R>
where
    A: AccountRepository,
    E: ExternalIdentityRepository,
    R: RefreshTokenRepository,
{
    linker: SocialIdentityLinker<A, E>,
    ledger: RefreshTokenLedger<R>,
    issuer: Arc<TokenIssuer>,
}

impl<A, E, R> SocialLoginUseCase<A, E, R>
where
    A: AccountRepository,
    E: ExternalIdentityRepository,
    R: RefreshTokenRepository,
{
    pub fn new(
        account_repo: Arc<A>,
        identity_repo: Arc<E>,
        refresh_repo: Arc<R>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            linker: SocialIdentityLinker::new(account_repo, identity_repo),
            ledger: RefreshTokenLedger::new(refresh_repo, config),
            issuer,
        }
    }

    pub async fn execute(
        &self,
        input: SocialIdentityInput,
        device_info: String,
    ) -> AuthResult<SocialLoginOutput> {
        let account = self.linker.find_or_create(&input).await?;

        if !account.can_login() {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issuer.issue_access(&account)?;
        let refresh_token = self.issuer.issue_refresh(&account)?;
        self.ledger
            .issue(&account.account_id, &refresh_token, device_info)
            .await?;

        tracing::info!(public_id = %account.public_id, "Social login");

        Ok(SocialLoginOutput {
            access_token,
            refresh_token,
            public_id: account.public_id.to_string(),
        })
    }
}

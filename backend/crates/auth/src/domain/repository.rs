//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! The two race-prone operations are pushed down to storage so no locks
//! are needed above it:
//! - `RefreshTokenRepository::claim_active` atomically revokes and returns
//!   the row; of two concurrent rotations exactly one wins.
//! - `insert_if_none_active` inserts only when no active row exists for
//!   the account; the loser observes `false`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{
    account::Account, email_verification::EmailVerification, external_identity::ExternalIdentity,
    failed_login::FailedLogin, password_reset::PasswordReset, refresh_token::RefreshTokenRecord,
};
use crate::domain::value_object::{account_id::AccountId, email::Email, username::Username};
use crate::error::AuthResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Check if username exists (canonical form)
    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool>;

    /// Update account
    async fn update(&self, account: &Account) -> AuthResult<()>;
}

/// Email verification (OTP) repository trait
#[trait_variant::make(EmailVerificationRepository: Send)]
pub trait LocalEmailVerificationRepository {
    /// Insert the record only if the account has no active record.
    /// Returns false when an active record already exists.
    async fn insert_if_none_active(&self, record: &EmailVerification) -> AuthResult<bool>;

    /// Find the account's active (unconsumed, unexpired) record
    async fn find_active_by_account(
        &self,
        account_id: &AccountId,
    ) -> AuthResult<Option<EmailVerification>>;

    /// Mark a record consumed
    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()>;

    /// Delete records created before the cutoff
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Password reset repository trait
#[trait_variant::make(PasswordResetRepository: Send)]
pub trait LocalPasswordResetRepository {
    /// Insert the record only if the account has no active record.
    /// Returns false when an active record already exists.
    async fn insert_if_none_active(&self, record: &PasswordReset) -> AuthResult<bool>;

    /// Find an active record by token digest
    async fn find_active_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<PasswordReset>>;

    /// Mark a record consumed
    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()>;

    /// Delete records created before the cutoff
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Refresh token ledger repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Create a ledger entry for a freshly issued token
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Atomically revoke and return the active row with this digest.
    /// Returns None when the row is missing, revoked, or expired.
    async fn claim_active(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Find a row by digest regardless of state (reuse-detection path)
    async fn find_by_token_hash(&self, token_hash: &str)
    -> AuthResult<Option<RefreshTokenRecord>>;

    /// Revoke the row with this digest (idempotent)
    async fn revoke_by_token_hash(&self, token_hash: &str) -> AuthResult<()>;

    /// Revoke every row for the account. Returns the number revoked.
    async fn revoke_all_for_account(&self, account_id: &AccountId) -> AuthResult<u64>;

    /// Revoke every row for the account except the one with this digest
    async fn revoke_all_except(
        &self,
        account_id: &AccountId,
        token_hash: &str,
    ) -> AuthResult<u64>;

    /// Delete terminal-state rows created before the cutoff
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Failed login repository trait
#[trait_variant::make(FailedLoginRepository: Send)]
pub trait LocalFailedLoginRepository {
    /// Append a failed attempt
    async fn record(&self, attempt: &FailedLogin) -> AuthResult<()>;

    /// Count the account's failures since the given instant
    async fn count_recent(&self, account_id: &AccountId, since: DateTime<Utc>)
    -> AuthResult<i64>;

    /// Delete attempts before the cutoff
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// External identity repository trait
#[trait_variant::make(ExternalIdentityRepository: Send)]
pub trait LocalExternalIdentityRepository {
    /// Create an identity link
    async fn create(&self, identity: &ExternalIdentity) -> AuthResult<()>;

    /// Find by (provider, provider_user_id)
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<ExternalIdentity>>;
}

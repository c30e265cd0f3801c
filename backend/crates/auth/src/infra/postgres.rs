//! PostgreSQL Repository Implementations
//!
//! The rotation and single-active races are closed here, in SQL:
//! - `claim_active`: conditional UPDATE .. RETURNING; exactly one of two
//!   concurrent rotations gets the row back.
//! - `insert_if_none_active`: INSERT .. SELECT .. WHERE NOT EXISTS; the
//!   second concurrent issuer inserts zero rows.

use chrono::{DateTime, Utc};
use nid::Nanoid;
use platform::password::HashedPassword;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::entity::{
    account::Account, email_verification::EmailVerification, external_identity::ExternalIdentity,
    failed_login::FailedLogin, password_reset::PasswordReset, refresh_token::RefreshTokenRecord,
};
use crate::domain::repository::{
    AccountRepository, EmailVerificationRepository, ExternalIdentityRepository,
    FailedLoginRepository, PasswordResetRepository, RefreshTokenRepository,
};
use crate::domain::value_object::{
    account_id::AccountId, email::Email, public_id::PublicId, token_version::TokenVersion,
    username::Username,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                public_id,
                email,
                username,
                username_canonical,
                password_hash,
                is_active,
                is_email_verified,
                token_version,
                roles,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.public_id.as_str())
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.username.canonical())
        .bind(account.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(account.is_active)
        .bind(account.is_email_verified)
        .bind(account.token_version.as_str())
        .bind(&account.roles)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id, public_id, email, username, username_canonical,
                password_hash, is_active, is_email_verified, token_version,
                roles, created_at, updated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                account_id, public_id, email, username, username_canonical,
                password_hash, is_active, is_email_verified, token_version,
                roles, created_at, updated_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username_canonical = $1)",
        )
        .bind(username.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                username = $3,
                username_canonical = $4,
                password_hash = $5,
                is_active = $6,
                is_email_verified = $7,
                token_version = $8,
                roles = $9,
                updated_at = $10
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(account.username.canonical())
        .bind(account.password_hash.as_ref().map(|h| h.as_phc_string()))
        .bind(account.is_active)
        .bind(account.is_email_verified)
        .bind(account.token_version.as_str())
        .bind(&account.roles)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Email Verification Repository Implementation
// ============================================================================

impl EmailVerificationRepository for PgAuthRepository {
    async fn insert_if_none_active(&self, record: &EmailVerification) -> AuthResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO email_verifications (
                id, account_id, otp_hash, expires_at, consumed, created_at
            )
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM email_verifications
                WHERE account_id = $2 AND consumed = FALSE AND expires_at > now()
            )
            "#,
        )
        .bind(record.id)
        .bind(record.account_id.as_uuid())
        .bind(&record.otp_hash)
        .bind(record.expires_at)
        .bind(record.consumed)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn find_active_by_account(
        &self,
        account_id: &AccountId,
    ) -> AuthResult<Option<EmailVerification>> {
        let row = sqlx::query_as::<_, EmailVerificationRow>(
            r#"
            SELECT id, account_id, otp_hash, expires_at, consumed, created_at
            FROM email_verifications
            WHERE account_id = $1 AND consumed = FALSE AND expires_at > now()
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()> {
        sqlx::query("UPDATE email_verifications SET consumed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM email_verifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Password Reset Repository Implementation
// ============================================================================

impl PasswordResetRepository for PgAuthRepository {
    async fn insert_if_none_active(&self, record: &PasswordReset) -> AuthResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO password_resets (
                id, account_id, token_hash, expires_at, consumed, created_at
            )
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM password_resets
                WHERE account_id = $2 AND consumed = FALSE AND expires_at > now()
            )
            "#,
        )
        .bind(record.id)
        .bind(record.account_id.as_uuid())
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.consumed)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn find_active_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<PasswordReset>> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            r#"
            SELECT id, account_id, token_hash, expires_at, consumed, created_at
            FROM password_resets
            WHERE token_hash = $1 AND consumed = FALSE AND expires_at > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn mark_consumed(&self, id: Uuid) -> AuthResult<()> {
        sqlx::query("UPDATE password_resets SET consumed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM password_resets WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id, account_id, token_hash, device_info, expires_at, revoked, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.account_id.as_uuid())
        .bind(&record.token_hash)
        .bind(&record.device_info)
        .bind(record.expires_at)
        .bind(record.revoked)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_active(&self, token_hash: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token_hash = $1 AND revoked = FALSE AND expires_at > now()
            RETURNING id, account_id, token_hash, device_info, expires_at, revoked, created_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AuthResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, account_id, token_hash, device_info, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_record()))
    }

    async fn revoke_by_token_hash(&self, token_hash: &str) -> AuthResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all_for_account(&self, account_id: &AccountId) -> AuthResult<u64> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE account_id = $1 AND revoked = FALSE",
        )
        .bind(account_id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn revoke_all_except(
        &self,
        account_id: &AccountId,
        token_hash: &str,
    ) -> AuthResult<u64> {
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE account_id = $1 AND token_hash != $2 AND revoked = FALSE
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(token_hash)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        // Only terminal-state rows; a live token is never deleted early
        let deleted = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE created_at < $1 AND (revoked = TRUE OR expires_at < now())
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Failed Login Repository Implementation
// ============================================================================

impl FailedLoginRepository for PgAuthRepository {
    async fn record(&self, attempt: &FailedLogin) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO failed_logins (id, account_id, ip, attempted_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.account_id.as_ref().map(|id| id.as_uuid()))
        .bind(&attempt.ip)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_recent(
        &self,
        account_id: &AccountId,
        since: DateTime<Utc>,
    ) -> AuthResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM failed_logins WHERE account_id = $1 AND attempted_at >= $2",
        )
        .bind(account_id.as_uuid())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM failed_logins WHERE attempted_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// External Identity Repository Implementation
// ============================================================================

impl ExternalIdentityRepository for PgAuthRepository {
    async fn create(&self, identity: &ExternalIdentity) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO external_identities (
                id, account_id, provider, provider_user_id, profile, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.id)
        .bind(identity.account_id.as_uuid())
        .bind(&identity.provider)
        .bind(&identity.provider_user_id)
        .bind(&identity.profile)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AuthResult<Option<ExternalIdentity>> {
        let row = sqlx::query_as::<_, ExternalIdentityRow>(
            r#"
            SELECT id, account_id, provider, provider_user_id, profile, created_at
            FROM external_identities
            WHERE provider = $1 AND provider_user_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_identity()))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    public_id: String,
    email: String,
    username: String,
    #[allow(dead_code)]
    username_canonical: String,
    password_hash: Option<String>,
    is_active: bool,
    is_email_verified: bool,
    token_version: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let public_id = PublicId::from_nanoid(
            Nanoid::from_str(&self.public_id)
                .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?,
        );

        let password_hash = self
            .password_hash
            .map(HashedPassword::from_phc_string)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            public_id,
            email: Email::from_db(self.email),
            username: Username::from_db(self.username),
            password_hash,
            is_active: self.is_active,
            is_email_verified: self.is_email_verified,
            token_version: TokenVersion::from_db(self.token_version),
            roles: self.roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmailVerificationRow {
    id: Uuid,
    account_id: Uuid,
    otp_hash: String,
    expires_at: DateTime<Utc>,
    consumed: bool,
    created_at: DateTime<Utc>,
}

impl EmailVerificationRow {
    fn into_record(self) -> EmailVerification {
        EmailVerification {
            id: self.id,
            account_id: AccountId::from_uuid(self.account_id),
            otp_hash: self.otp_hash,
            expires_at: self.expires_at,
            consumed: self.consumed,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PasswordResetRow {
    id: Uuid,
    account_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    consumed: bool,
    created_at: DateTime<Utc>,
}

impl PasswordResetRow {
    fn into_record(self) -> PasswordReset {
        PasswordReset {
            id: self.id,
            account_id: AccountId::from_uuid(self.account_id),
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            consumed: self.consumed,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    account_id: Uuid,
    token_hash: String,
    device_info: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_record(self) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: self.id,
            account_id: AccountId::from_uuid(self.account_id),
            token_hash: self.token_hash,
            device_info: self.device_info,
            expires_at: self.expires_at,
            revoked: self.revoked,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ExternalIdentityRow {
    id: Uuid,
    account_id: Uuid,
    provider: String,
    provider_user_id: String,
    profile: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl ExternalIdentityRow {
    fn into_identity(self) -> ExternalIdentity {
        ExternalIdentity {
            id: self.id,
            account_id: AccountId::from_uuid(self.account_id),
            provider: self.provider,
            provider_user_id: self.provider_user_id,
            profile: self.profile,
            created_at: self.created_at,
        }
    }
}

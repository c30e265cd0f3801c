//! Account Entity
//!
//! Core identity record: credentials, verification state and the token
//! version that gates every outstanding signed token.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{
    account_id::AccountId, email::Email, public_id::PublicId, token_version::TokenVersion,
    username::Username,
};

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier
    pub account_id: AccountId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// Email address (unique, used for login)
    pub email: Email,
    /// Username (unique handle)
    pub username: Username,
    /// Argon2id PHC hash; None for social-only accounts
    pub password_hash: Option<HashedPassword>,
    /// Whether the account may authenticate at all
    pub is_active: bool,
    /// Whether the email address has been verified via OTP
    pub is_email_verified: bool,
    /// Version claim baked into issued tokens
    pub token_version: TokenVersion,
    /// Role names
    pub roles: Vec<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub const DEFAULT_ROLE: &'static str = "user";

    /// Create a new local account (unverified until the OTP is consumed)
    pub fn new(email: Email, username: Username, password_hash: HashedPassword) -> Self {
        let now = Utc::now();

        Self {
            account_id: AccountId::new(),
            public_id: PublicId::new(),
            email,
            username,
            password_hash: Some(password_hash),
            is_active: true,
            is_email_verified: false,
            token_version: TokenVersion::new(),
            roles: vec![Self::DEFAULT_ROLE.to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an account from a trusted social identity
    ///
    /// The provider has already verified the email address, so the
    /// account starts verified and without a local password.
    pub fn new_social(email: Email, username: Username) -> Self {
        let now = Utc::now();

        Self {
            account_id: AccountId::new(),
            public_id: PublicId::new(),
            email,
            username,
            password_hash: None,
            is_active: true,
            is_email_verified: true,
            token_version: TokenVersion::new(),
            roles: vec![Self::DEFAULT_ROLE.to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can authenticate
    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Mark the email as verified
    pub fn mark_verified(&mut self) {
        self.is_email_verified = true;
        self.updated_at = Utc::now();
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }

    /// Regenerate the token version, invalidating all outstanding tokens
    pub fn rotate_token_version(&mut self) {
        self.token_version = TokenVersion::new();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn account() -> Account {
        let hash = ClearTextPassword::new("TestPassword123!".to_string())
            .unwrap()
            .hash(None)
            .unwrap();
        Account::new(
            Email::new("user@example.com").unwrap(),
            Username::new("user01").unwrap(),
            hash,
        )
    }

    #[test]
    fn test_new_account_is_unverified() {
        let account = account();
        assert!(account.is_active);
        assert!(!account.is_email_verified);
        assert!(account.password_hash.is_some());
    }

    #[test]
    fn test_social_account_starts_verified() {
        let account = Account::new_social(
            Email::new("user@example.com").unwrap(),
            Username::new("user01").unwrap(),
        );
        assert!(account.is_email_verified);
        assert!(account.password_hash.is_none());
    }

    #[test]
    fn test_rotate_token_version_changes_value() {
        let mut account = account();
        let before = account.token_version.clone();
        account.rotate_token_version();
        assert_ne!(before, account.token_version);
    }
}

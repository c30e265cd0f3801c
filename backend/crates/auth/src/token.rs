//! Token Issuer
//!
//! Signed HS512 token pair. Claims:
//! - `sub`: account email
//! - `ver`: account token version; bumping the version on the account
//!   invalidates every outstanding token without touching storage
//! - `jti`: random nonce so two tokens minted in the same second differ
//! - `iat` / `exp`: issue and expiry instants (seconds)
//!
//! Refresh tokens are additionally tracked in the ledger by digest; the
//! signature only proves origin, the ledger decides single-use.

use std::time::Duration;

use base64::{Engine, engine::general_purpose};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entity::account::Account;
use crate::error::{AuthError, AuthResult};

/// Claims carried by both access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account email
    pub sub: String,
    /// Account token version at issue time
    pub ver: String,
    /// Random nonce
    pub jti: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature valid but the token has expired
    #[error("Token expired")]
    Expired,

    /// Bad signature, wrong algorithm, or garbled payload
    #[error("Malformed token")]
    Malformed,

    /// Token subject does not match the account
    #[error("Token subject mismatch")]
    SubjectMismatch,

    /// Token version no longer matches the account
    #[error("Token version mismatch")]
    VersionMismatch,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Token issuer and verifier
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from a base64-encoded signing secret
    pub fn new(
        secret_base64: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> AuthResult<Self> {
        let secret = general_purpose::STANDARD
            .decode(secret_base64)
            .map_err(|e| AuthError::Internal(format!("Invalid token secret: {}", e)))?;

        Ok(Self::from_secret(&secret, access_ttl, refresh_ttl))
    }

    /// Create an issuer from raw secret bytes
    pub fn from_secret(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint a short-lived access token for the account
    pub fn issue_access(&self, account: &Account) -> AuthResult<String> {
        self.issue(account, self.access_ttl)
    }

    /// Mint a refresh token for the account (ledger entry created separately)
    pub fn issue_refresh(&self, account: &Account) -> AuthResult<String> {
        self.issue(account, self.refresh_ttl)
    }

    fn issue(&self, account: &Account, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now().timestamp();

        let claims = TokenClaims {
            sub: account.email.as_str().to_string(),
            ver: account.token_version.as_str().to_string(),
            jti: platform::crypto::generate_url_safe_token(16),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;

        match jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Malformed),
            },
        }
    }

    /// Check that verified claims still belong to this account
    pub fn validate_against_account(
        &self,
        claims: &TokenClaims,
        account: &Account,
    ) -> Result<(), TokenError> {
        if claims.sub != account.email.as_str() {
            return Err(TokenError::SubjectMismatch);
        }
        if !account.token_version.matches(&claims.ver) {
            return Err(TokenError::VersionMismatch);
        }
        Ok(())
    }

    /// Refresh token TTL (for ledger records and cookie Max-Age)
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Access token TTL (for response bodies)
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, username::Username};
    use platform::password::ClearTextPassword;

    fn issuer() -> TokenIssuer {
        TokenIssuer::from_secret(
            b"test-secret-test-secret-test-secret!",
            Duration::from_secs(900),
            Duration::from_secs(7 * 24 * 3600),
        )
    }

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
    fn test_issue_and_verify() {
        let issuer = issuer();
        let account = account();

        let token = issuer.issue_access(&account).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, "user@example.com");
        assert_eq!(claims.ver, account.token_version.as_str());
        assert!(claims.exp > claims.iat);

        issuer.validate_against_account(&claims, &account).unwrap();
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = issuer();
        let account = account();

        let a = issuer.issue_access(&account).unwrap();
        let b = issuer.issue_access(&account).unwrap();
        assert_ne!(a, b); // jti nonce
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::from_secret(
            b"test-secret-test-secret-test-secret!",
            Duration::from_secs(0),
            Duration::from_secs(0),
        );
        let account = account();

        let token = issuer.issue_access(&account).unwrap();
        // exp == iat == now; with zero leeway this is already expired
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer();
        assert_eq!(issuer.verify("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let issuer = issuer();
        let other = TokenIssuer::from_secret(
            b"another-secret-another-secret-anoth!",
            Duration::from_secs(900),
            Duration::from_secs(900),
        );
        let token = issuer.issue_access(&account()).unwrap();
        assert_eq!(other.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_version_mismatch() {
        let issuer = issuer();
        let mut account = account();

        let token = issuer.issue_access(&account).unwrap();
        let claims = issuer.verify(&token).unwrap();

        account.rotate_token_version();
        assert_eq!(
            issuer.validate_against_account(&claims, &account),
            Err(TokenError::VersionMismatch)
        );
    }

    #[test]
    fn test_subject_mismatch() {
        let issuer = issuer();
        let account_a = account();
        let mut account_b = account();
        account_b.email = Email::new("other@example.com").unwrap();
        account_b.token_version = account_a.token_version.clone();

        let token = issuer.issue_access(&account_a).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(
            issuer.validate_against_account(&claims, &account_b),
            Err(TokenError::SubjectMismatch)
        );
    }
}

//! TokenVersion Value Object
//!
//! Opaque per-account version string baked into every signed token.
//! Regenerating it on a security-sensitive event (password reset,
//! credential change) invalidates all outstanding tokens at once.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenVersion(String);

impl TokenVersion {
    /// Generate a fresh version
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from database value
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a token's version claim still matches
    pub fn matches(&self, claim: &str) -> bool {
        self.0 == claim
    }
}

impl Default for TokenVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TokenVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_version_unique() {
        assert_ne!(TokenVersion::new(), TokenVersion::new());
    }

    #[test]
    fn test_token_version_matches() {
        let version = TokenVersion::new();
        assert!(version.matches(version.as_str()));
        assert!(!version.matches(TokenVersion::new().as_str()));
    }

    #[test]
    fn test_token_version_from_db() {
        let version = TokenVersion::from_db("stored-value");
        assert_eq!(version.as_str(), "stored-value");
    }
}

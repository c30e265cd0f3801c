//! External Identity Entity
//!
//! Link between an account and a social provider identity, keyed by
//! (provider, provider_user_id).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_object::account_id::AccountId;

/// External (social) identity
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub id: Uuid,
    pub account_id: AccountId,
    /// Lowercased provider key ("google", "github", ...)
    pub provider: String,
    /// Stable user identifier within the provider
    pub provider_user_id: String,
    /// Raw profile payload as received from the provider
    pub profile: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ExternalIdentity {
    pub fn new(
        account_id: AccountId,
        provider: impl Into<String>,
        provider_user_id: impl Into<String>,
        profile: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            provider: provider.into().to_lowercase(),
            provider_user_id: provider_user_id.into(),
            profile,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_is_lowercased() {
        let identity = ExternalIdentity::new(
            AccountId::new(),
            "Google",
            "uid-1",
            serde_json::json!({}),
        );
        assert_eq!(identity.provider, "google");
    }
}

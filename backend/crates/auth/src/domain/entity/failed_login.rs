//! Failed Login Entity
//!
//! Append-only record of a failed password attempt. The trailing-window
//! count over these rows drives the lockout policy; old rows are purged
//! by the retention sweep.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_object::account_id::AccountId;

/// Failed login attempt
#[derive(Debug, Clone)]
pub struct FailedLogin {
    pub id: Uuid,
    /// None when the presented email matched no account
    pub account_id: Option<AccountId>,
    pub ip: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl FailedLogin {
    pub fn new(account_id: Option<AccountId>, ip: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            ip,
            attempted_at: Utc::now(),
        }
    }
}

//! Outbound Email Collaborator
//!
//! The subsystem only needs a single `send` capability; delivery itself
//! is an external concern. Sends are fire-and-forget: use cases log a
//! warning on failure and carry on, so mail outages never block auth
//! flows.

use crate::error::AuthResult;

/// Outbound mail trait
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send a plain-text message
    async fn send(&self, to: &str, subject: &str, body: &str) -> AuthResult<()>;
}

/// Default mailer that writes messages to the log
///
/// Stands in for a real delivery backend in development and tests.
/// Recipient addresses are masked before logging.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AuthResult<()> {
        tracing::info!(
            to = %mask_address(to),
            subject = %subject,
            body_len = body.len(),
            "Outbound email"
        );
        Ok(())
    }
}

/// Mask an email address for log lines
fn mask_address(address: &str) -> String {
    match address.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_address() {
        assert_eq!(mask_address("sample@example.com"), "sa***@example.com");
        assert_eq!(mask_address("a@example.com"), "a***@example.com");
        assert_eq!(mask_address("not-an-address"), "***");
    }

    #[tokio::test]
    async fn test_tracing_mailer_always_succeeds() {
        let mailer = TracingMailer;
        let sent = Mailer::send(&mailer, "user@example.com", "subject", "body").await;
        assert!(sent.is_ok());
    }
}

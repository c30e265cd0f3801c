//! Application Configuration
//!
//! Configuration for the Auth application layer. Assembled in the binary
//! from environment variables.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Signing secret for the token pair (raw bytes)
    pub token_secret: Vec<u8>,
    /// Access token TTL (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token TTL (1 week)
    pub refresh_token_ttl: Duration,
    /// Digits in the email verification OTP
    pub otp_length: usize,
    /// OTP validity window (5 minutes)
    pub otp_ttl: Duration,
    /// Password reset token validity window (10 minutes)
    pub reset_token_ttl: Duration,
    /// Failures inside the window that trigger lockout
    pub max_login_failures: i64,
    /// Trailing window for counting failures (15 minutes)
    pub failure_window: Duration,
    /// Retention for terminal-state rows before the sweep deletes them
    pub retention: Duration,
    /// Whether to require Secure on the refresh cookie
    pub cookie_secure: bool,
    /// Path scope for the refresh cookie
    pub cookie_path: String,
    /// Base URL used in password reset links
    pub frontend_base_url: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            otp_length: 6,
            otp_ttl: Duration::from_secs(5 * 60),
            reset_token_ttl: Duration::from_secs(10 * 60),
            max_login_failures: 5,
            failure_window: Duration::from_secs(15 * 60),
            retention: Duration::from_secs(7 * 24 * 3600),
            cookie_secure: true,
            cookie_path: "/api/auth".to_string(),
            frontend_base_url: "http://localhost:3000".to_string(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: platform::crypto::random_bytes(64),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Failure window as a chrono duration
    pub fn failure_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.failure_window).unwrap_or(chrono::Duration::minutes(15))
    }

    /// Retention as a chrono duration
    pub fn retention_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::days(7))
    }
}

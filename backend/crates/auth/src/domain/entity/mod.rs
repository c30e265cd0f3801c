//! Entity Module

pub mod account;
pub mod email_verification;
pub mod external_identity;
pub mod failed_login;
pub mod password_reset;
pub mod refresh_token;

pub use account::Account;
pub use email_verification::EmailVerification;
pub use external_identity::ExternalIdentity;
pub use failed_login::FailedLogin;
pub use password_reset::PasswordReset;
pub use refresh_token::RefreshTokenRecord;

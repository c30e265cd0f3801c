//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    account::Account, email_verification::EmailVerification, password_reset::PasswordReset,
    refresh_token::RefreshTokenRecord,
};
pub use repository::{
    AccountRepository, EmailVerificationRepository, ExternalIdentityRepository,
    FailedLoginRepository, PasswordResetRepository, RefreshTokenRepository,
};

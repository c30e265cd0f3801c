//! Application Layer
//!
//! Use cases and the services they compose.

pub mod config;
pub mod login;
pub mod login_guard;
pub mod logout;
pub mod otp;
pub mod password_reset;
pub mod recover;
pub mod refresh;
pub mod refresh_ledger;
pub mod register;
pub mod social_login;
pub mod sweep;
pub mod verify_email;

// Re-exports
pub use config::AuthConfig;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use login_guard::LoginGuard;
pub use logout::LogoutUseCase;
pub use otp::OtpVerifier;
pub use password_reset::PasswordResetFlow;
pub use recover::{ForgotPasswordUseCase, ResetPasswordUseCase};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use refresh_ledger::RefreshTokenLedger;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use social_login::{
    SocialIdentityInput, SocialIdentityLinker, SocialLoginOutput, SocialLoginUseCase,
};
pub use sweep::{SweepReport, SweepUseCase};
pub use verify_email::VerifyEmailUseCase;

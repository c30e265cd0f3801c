//! Auth (Credential & Session Lifecycle) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration with email OTP verification
//! - Password login with brute-force lockout
//! - Refresh-token rotation with reuse detection
//! - Password reset via one-time tokens
//! - Logout and multi-device revocation
//! - Social-identity linking
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - OTPs, reset tokens and refresh tokens stored only as SHA-256 digests,
//!   compared in constant time
//! - Signed HS512 token pair carrying an account-level version claim;
//!   bumping the version invalidates every outstanding token at once
//! - Automatic lockout after repeated failed login attempts
//! - Refresh-token reuse revokes the whole session family

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod mailer;
pub mod presentation;
pub mod token;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use mailer::{Mailer, TracingMailer};
pub use presentation::router::auth_router;
pub use token::TokenIssuer;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

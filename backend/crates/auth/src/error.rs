//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Account not found
    #[error("Account not found")]
    NotFound,

    /// Email or username already registered
    #[error("Account already exists")]
    AlreadyExists,

    /// Invalid credentials (unknown account or wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked")]
    AccountLocked,

    /// Email address has not been verified yet
    #[error("Email address not verified")]
    NotVerified,

    /// Email address is already verified
    #[error("Email address already verified")]
    AlreadyVerified,

    /// OTP is missing, expired, or does not match
    #[error("Invalid verification code")]
    InvalidOtp,

    /// Token or record has expired
    #[error("Expired")]
    Expired,

    /// An active OTP or reset token already exists
    #[error("Too many requests")]
    TooManyRequests,

    /// Token is malformed, revoked, or otherwise unusable
    #[error("Invalid token")]
    InvalidToken,

    /// Refresh token reuse detected; session family revoked
    #[error("Session compromised")]
    SessionCompromised,

    /// Email collides with an existing local account (social login)
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// Request validation error (value object construction)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::AlreadyExists
            | AuthError::AlreadyVerified
            | AuthError::EmailAlreadyRegistered => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::SessionCompromised => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked => StatusCode::LOCKED,
            AuthError::NotVerified => StatusCode::FORBIDDEN,
            AuthError::InvalidOtp | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Expired => StatusCode::GONE,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::AlreadyExists
            | AuthError::AlreadyVerified
            | AuthError::EmailAlreadyRegistered => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::SessionCompromised => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::NotVerified => ErrorKind::Forbidden,
            AuthError::InvalidOtp | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Expired => ErrorKind::Gone,
            AuthError::TooManyRequests => ErrorKind::TooManyRequests,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::SessionCompromised => {
                tracing::warn!("Refresh token reuse detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(
            AuthError::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::SessionCompromised.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::EmailAlreadyRegistered.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AuthError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::Expired.kind(), ErrorKind::Gone);
        assert_eq!(AuthError::InvalidOtp.kind(), ErrorKind::BadRequest);
    }
}

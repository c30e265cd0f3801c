//! Auth Middleware
//!
//! Bearer access-token validation for protected routes. On success the
//! resolved account is stored in request extensions for downstream
//! handlers.

use axum::body::Body;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::domain::repository::AccountRepository;
use crate::domain::value_object::email::Email;
use crate::error::AuthError;
use crate::token::TokenIssuer;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<A>
where
    A: AccountRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<A>,
    pub issuer: Arc<TokenIssuer>,
}

/// Resolved account stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub public_id: String,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub email_verified: bool,
}

/// Middleware that requires a valid bearer access token
pub async fn require_access_token<A>(
    state: AuthMiddlewareState<A>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    A: AccountRepository + Clone + Send + Sync + 'static,
{
    let token = bearer_token(&req).ok_or_else(|| AuthError::InvalidToken.into_response())?;

    let claims = state
        .issuer
        .verify(&token)
        .map_err(|e| AuthError::from(e).into_response())?;

    let email = Email::new(&claims.sub)
        .map_err(|_| AuthError::InvalidToken.into_response())?;

    let account = state
        .repo
        .find_by_email(&email)
        .await
        .map_err(|e| e.into_response())?
        .ok_or_else(|| AuthError::InvalidToken.into_response())?;

    state
        .issuer
        .validate_against_account(&claims, &account)
        .map_err(|e| AuthError::from(e).into_response())?;

    if !account.can_login() {
        return Err(AuthError::InvalidToken.into_response());
    }

    req.extensions_mut().insert(CurrentAccount {
        public_id: account.public_id.to_string(),
        email: account.email.as_str().to_string(),
        username: account.username.as_str().to_string(),
        roles: account.roles.clone(),
        email_verified: account.is_email_verified,
    });

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

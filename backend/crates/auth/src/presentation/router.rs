//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::infra::postgres::PgAuthRepository;
use crate::mailer::{Mailer, TracingMailer};
use crate::presentation::handlers::{self, AuthAppState, AuthRepo};
use crate::presentation::middleware::{AuthMiddlewareState, require_access_token};
use crate::token::TokenIssuer;

/// Create the Auth router with the PostgreSQL repository and log mailer
pub fn auth_router(repo: PgAuthRepository, issuer: TokenIssuer, config: AuthConfig) -> Router {
    auth_router_generic(repo, TracingMailer, issuer, config)
}

/// Create a generic Auth router for any repository/mailer implementation
pub fn auth_router_generic<R, M>(
    repo: R,
    mailer: M,
    issuer: TokenIssuer,
    config: AuthConfig,
) -> Router
where
    R: AuthRepo,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let issuer = Arc::new(issuer);

    let state = AuthAppState {
        repo: repo.clone(),
        mailer: Arc::new(mailer),
        issuer: issuer.clone(),
        config: Arc::new(config),
    };

    let mw_state = AuthMiddlewareState { repo, issuer };

    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(axum::middleware::from_fn(move |req, next| {
            require_access_token(mw_state.clone(), req, next)
        }));

    Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route("/resend-otp", post(handlers::resend_otp::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/refresh", post(handlers::refresh::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/logout-others", post(handlers::logout_others::<R, M>))
        .route("/forgot-password", post(handlers::forgot_password::<R, M>))
        .route("/reset-password", post(handlers::reset_password::<R, M>))
        .route("/social-login", post(handlers::social_login::<R, M>))
        .merge(protected)
        .with_state(state)
}

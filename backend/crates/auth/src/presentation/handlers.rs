//! HTTP Handlers
//!
//! Thin glue: extract client context, run the use case, shape the
//! response. The refresh token travels in an HttpOnly cookie scoped to
//! the auth API path; request bodies are the fallback for non-browser
//! clients.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::{device_info, extract_client_ip};
use platform::cookie::CookieConfig;

use crate::application::config::AuthConfig;
use crate::application::{
    ForgotPasswordUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshUseCase,
    RegisterInput, RegisterUseCase, ResetPasswordUseCase, SocialIdentityInput,
    SocialLoginUseCase, VerifyEmailUseCase,
};
use crate::domain::repository::{
    AccountRepository, EmailVerificationRepository, ExternalIdentityRepository,
    FailedLoginRepository, PasswordResetRepository, RefreshTokenRepository,
};
use crate::error::{AuthError, AuthResult};
use crate::mailer::Mailer;
use crate::presentation::dto::{
    ForgotPasswordRequest, LoginRequest, LogoutRequest, MeResponse, MessageResponse,
    RefreshRequest, RegisterRequest, RegisterResponse, ResendOtpRequest, ResetPasswordRequest,
    SocialLoginRequest, TokenPairResponse, VerifyEmailRequest,
};
use crate::presentation::middleware::CurrentAccount;
use crate::token::TokenIssuer;

const REFRESH_COOKIE: &str = "refresh_token";

/// Bound alias for the combined repository
pub trait AuthRepo:
    AccountRepository
    + EmailVerificationRepository
    + PasswordResetRepository
    + RefreshTokenRepository
    + FailedLoginRepository
    + ExternalIdentityRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepo for T where
    T: AccountRepository
        + EmailVerificationRepository
        + PasswordResetRepository
        + RefreshTokenRepository
        + FailedLoginRepository
        + ExternalIdentityRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub issuer: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Register / Verify / Resend
// ============================================================================

/// POST /api/auth/register
pub async fn register<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<RegisterResponse>)> {
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            public_id: output.public_id,
        }),
    ))
}

/// POST /api/auth/verify-email
pub async fn verify_email<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = VerifyEmailUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.email, &req.otp).await?;

    Ok(Json(MessageResponse::new("Email verified")))
}

/// POST /api/auth/resend-otp
pub async fn resend_otp<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResendOtpRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = VerifyEmailUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.resend(&req.email).await?;

    Ok(Json(MessageResponse::new("Verification code sent")))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
            client_ip: client_ip.map(|ip| ip.to_string()),
            device_info: device_info(&headers),
        })
        .await?;

    let cookie = refresh_cookie(&state.config, &state.issuer).build_set_cookie(&output.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenPairResponse {
            access_token: output.access_token,
            refresh_token: output.refresh_token,
            public_id: Some(output.public_id),
            expires_in: output.expires_in,
        }),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> AuthResult<impl IntoResponse> {
    let token = presented_refresh_token(&headers, body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AuthError::InvalidToken)?;

    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(&token).await?;

    let cookie = refresh_cookie(&state.config, &state.issuer).build_set_cookie(&output.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenPairResponse {
            access_token: output.access_token,
            refresh_token: output.refresh_token,
            public_id: None,
            expires_in: output.expires_in,
        }),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    body: Option<Json<LogoutRequest>>,
) -> AuthResult<impl IntoResponse> {
    if let Some(token) = presented_refresh_token(&headers, body.and_then(|Json(b)| b.refresh_token))
    {
        let use_case = LogoutUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.issuer.clone(),
            state.config.clone(),
        );
        use_case.execute(&token).await?;
    }

    let cookie = refresh_cookie(&state.config, &state.issuer).build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// POST /api/auth/logout-others
pub async fn logout_others<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    body: Option<Json<LogoutRequest>>,
) -> AuthResult<Json<MessageResponse>> {
    let token = presented_refresh_token(&headers, body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AuthError::InvalidToken)?;

    let use_case = LogoutUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let revoked = use_case.logout_all_others(&token).await?;

    Ok(Json(MessageResponse::new(format!(
        "{} other sessions revoked",
        revoked
    ))))
}

// ============================================================================
// Password recovery
// ============================================================================

/// POST /api/auth/forgot-password
pub async fn forgot_password<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.email).await?;

    // Same answer whether or not the account exists
    Ok(Json(MessageResponse::new(
        "If the address is registered, a reset link has been sent",
    )))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode> {
    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.token, req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Social login
// ============================================================================

/// POST /api/auth/social-login
pub async fn social_login<R: AuthRepo, M: Mailer + Send + Sync + 'static>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<SocialLoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let use_case = SocialLoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(
            SocialIdentityInput {
                provider: req.provider,
                provider_user_id: req.provider_user_id,
                email: req.email,
                profile: req.profile,
            },
            device_info(&headers),
        )
        .await?;

    let cookie = refresh_cookie(&state.config, &state.issuer).build_set_cookie(&output.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenPairResponse {
            access_token: output.access_token,
            refresh_token: output.refresh_token,
            public_id: Some(output.public_id),
            expires_in: state.config.access_token_ttl.as_secs(),
        }),
    ))
}

// ============================================================================
// Current account
// ============================================================================

/// GET /api/auth/me (behind the bearer-token middleware)
pub async fn me(
    axum::Extension(account): axum::Extension<CurrentAccount>,
) -> Json<MeResponse> {
    Json(MeResponse {
        public_id: account.public_id,
        email: account.email,
        username: account.username,
        roles: account.roles,
        email_verified: account.email_verified,
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Cookie first, body fallback
fn presented_refresh_token(headers: &HeaderMap, body_token: Option<String>) -> Option<String> {
    platform::cookie::extract_cookie(headers, REFRESH_COOKIE).or(body_token)
}

fn refresh_cookie(config: &AuthConfig, issuer: &TokenIssuer) -> CookieConfig {
    let mut cookie =
        CookieConfig::refresh_token(config.cookie_path.clone(), issuer.refresh_ttl().as_secs() as i64);
    cookie.secure = config.cookie_secure;
    cookie
}

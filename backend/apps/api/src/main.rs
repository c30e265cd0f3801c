//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::application::SweepUseCase;
use auth::{AuthConfig, PgAuthRepository, TokenIssuer, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Interval between retention sweeps
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration
    let auth_config = auth_config_from_env()?;

    let issuer = TokenIssuer::from_secret(
        &auth_config.token_secret,
        auth_config.access_token_ttl,
        auth_config.refresh_token_ttl,
    );

    let repo = PgAuthRepository::new(pool.clone());

    // Retention sweep: once at startup, then periodically.
    // Errors here should not prevent server startup.
    let sweep_repo = Arc::new(repo.clone());
    let sweep = SweepUseCase::new(
        sweep_repo.clone(),
        sweep_repo.clone(),
        sweep_repo.clone(),
        sweep_repo,
        Arc::new(auth_config.clone()),
    );

    if let Err(e) = sweep.execute().await {
        tracing::warn!(error = %e, "Startup retention sweep failed, continuing anyway");
    }

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;
            if let Err(e) = sweep.execute().await {
                tracing::warn!(error = %e, "Periodic retention sweep failed");
            }
        }
    });

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(repo, issuer, auth_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Assemble the auth configuration from environment variables
///
/// Debug builds fall back to a random signing secret and an insecure
/// cookie; production requires `AUTH_TOKEN_SECRET`.
fn auth_config_from_env() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        match env::var("AUTH_TOKEN_SECRET") {
            Ok(secret_b64) => AuthConfig {
                token_secret: Engine::decode(&general_purpose::STANDARD, &secret_b64)?,
                cookie_secure: false,
                ..AuthConfig::default()
            },
            Err(_) => AuthConfig::development(),
        }
    } else {
        let secret_b64 =
            env::var("AUTH_TOKEN_SECRET").expect("AUTH_TOKEN_SECRET must be set in production");
        AuthConfig {
            token_secret: Engine::decode(&general_purpose::STANDARD, &secret_b64)?,
            ..AuthConfig::default()
        }
    };

    if let Ok(url) = env::var("FRONTEND_BASE_URL") {
        config.frontend_base_url = url;
    }

    if let Ok(pepper_b64) = env::var("AUTH_PASSWORD_PEPPER") {
        config.password_pepper = Some(Engine::decode(&general_purpose::STANDARD, &pepper_b64)?);
    }

    Ok(config)
}

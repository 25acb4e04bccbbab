use std::sync::Arc;

use anyhow::Context;
use token_gate::app::{app, AppState};
use token_gate::auth::TokenAuthority;
use token_gate::config::AppConfig;
use token_gate::services::{CredentialStore, FileCredentialStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SECURITY_JWT_SECRET, AUTH_USERS_FILE, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Refuse to start without a usable signing configuration
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting token-gate in {:?} mode", config.environment);

    let authority = Arc::new(TokenAuthority::new(&config.security)?);
    tracing::info!(
        issuer = authority.issuer(),
        algorithm = ?authority.algorithm(),
        lifetime_secs = authority.lifetime().num_seconds(),
        "Token authority ready"
    );

    let store: Arc<dyn CredentialStore> = match &config.security.users_file {
        Some(path) => Arc::new(
            FileCredentialStore::load(path)
                .with_context(|| format!("failed to load credentials from {}", path.display()))?,
        ),
        None => {
            tracing::warn!("AUTH_USERS_FILE not set; starting with no accounts until users register");
            Arc::new(FileCredentialStore::empty())
        }
    };

    let app = app(
        AppState::new(authority, store, config.security.password_cost),
        &config.api,
    );

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("token-gate listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

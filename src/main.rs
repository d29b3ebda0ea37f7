use std::sync::Arc;

use anyhow::Context;
use recipe_admin_web::{
    config::Config,
    routes::build_router,
    services::backend::{client::BackendClient, service::AuthBackend},
    AppState,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; access tokens will be decoded without signature verification");
    }

    let http_client = Client::new();
    let backend = Arc::new(BackendClient::new(http_client, config.backend_host.clone()))
        as Arc<dyn AuthBackend>;

    let addr = config.bind_addr;
    info!(backend = %config.backend_host, identity_source = ?config.identity_source, "configuration loaded");

    let state = AppState {
        backend,
        config: Arc::new(config),
    };
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

use anyhow::Context;

use bazaar_api::app::{AppState, build_app};
use bazaar_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaar_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let app = build_app(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

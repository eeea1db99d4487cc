use anyhow::Context;

use folio_api::app::{AppServices, build_app};
use folio_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before logging init so RUST_LOG from .env applies.
    let _ = dotenvy::dotenv();
    folio_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(env = ?config.app_env, "starting folio api");

    let services = AppServices::from_config(&config)
        .await
        .context("failed to initialize services")?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;

use tenantgate_api::{app, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tenantgate_observability::init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let services = app::services::build_services(config).await?;
    let router = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}

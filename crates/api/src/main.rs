use anyhow::{Context, Result};
use sift_api::{build_app, ServiceConfig};
use sift_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("sift_api");

    let config = ServiceConfig::from_env()?;
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        allow_empty_text = config.allow_empty_text,
        delegate = config.delegate.is_active(),
        "sift api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

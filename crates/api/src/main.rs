use anyhow::Context;

use invoicedesk_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    invoicedesk_observability::init(config.log_format);

    if config.uses_dev_secret() {
        tracing::warn!("SESSION_SECRET not set; using insecure dev default");
    }

    let app = invoicedesk_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

use contact_service::config::ContactConfig;
use contact_service::services::init_metrics;
use contact_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ContactConfig::load()?;

    init_tracing(
        "contact-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    init_metrics()?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        e
    })?;
    application.run_until_stopped().await?;

    Ok(())
}

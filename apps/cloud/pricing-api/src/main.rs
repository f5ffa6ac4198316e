use std::sync::Arc;

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_pricing::{PricingService, ProviderFactory};
use tracing::info;

mod api;
mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    observability::init_metrics()
        .map_err(|e| eyre::eyre!("Failed to install metrics recorder: {}", e))?;

    // Factory first, then the service that fans out over its providers
    let factory = ProviderFactory::from_config(&config.providers).await;
    if factory.is_empty() {
        tracing::warn!("No pricing provider is configured; every comparison will return 404");
    }
    let service = Arc::new(PricingService::new(factory).with_deadline(config.providers.deadline));

    let router = create_router::<openapi::ApiDoc>(api::routes(service.clone()), &config.server)?;

    // - /health: liveness check with app name/version
    let app = router.merge(health_router(config.app));

    info!(
        app = config.app.name,
        version = config.app.version,
        "Starting pricing API"
    );

    create_production_app(app, &config.server, async move {
        info!("Shutting down: closing provider clients");
        service.close().await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Pricing API shutdown complete");
    Ok(())
}

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::ProvidersConfig;
use crate::mapping::{self, MappingError};
use crate::models::CloudProvider;
use crate::providers::{
    AwsPricingClient, AzurePricingClient, GcpPricingClient, PricingProvider, ProviderFailure,
};

/// Owns the active provider clients for the lifetime of the process.
///
/// A provider whose client cannot be constructed is logged and left out, so
/// the service starts with fewer providers instead of not starting.
#[derive(Clone, Default)]
pub struct ProviderFactory {
    providers: Vec<Arc<dyn PricingProvider>>,
}

impl ProviderFactory {
    pub async fn from_config(config: &ProvidersConfig) -> Self {
        let mut providers: Vec<Arc<dyn PricingProvider>> = Vec::new();

        if let Some(aws) = admit(
            CloudProvider::Aws,
            mapping::validate(CloudProvider::Aws),
            AwsPricingClient::new(&config.aws),
        )
        .await
        {
            providers.push(aws);
        }
        if let Some(azure) = admit(
            CloudProvider::Azure,
            mapping::validate(CloudProvider::Azure),
            async { AzurePricingClient::new(&config.azure, config.http_timeout) },
        )
        .await
        {
            providers.push(azure);
        }
        if let Some(gcp) = admit(
            CloudProvider::Gcp,
            mapping::validate(CloudProvider::Gcp),
            async { GcpPricingClient::new(&config.gcp, config.http_timeout) },
        )
        .await
        {
            providers.push(gcp);
        }

        info!(
            active = ?providers.iter().map(|p| p.provider()).collect::<Vec<_>>(),
            "Provider factory initialized"
        );

        Self { providers }
    }

    pub fn from_providers(providers: Vec<Arc<dyn PricingProvider>>) -> Self {
        Self { providers }
    }

    pub fn get_all_providers(&self) -> &[Arc<dyn PricingProvider>] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Closes every provider concurrently. Failures are logged, never returned,
    /// so one provider cannot keep the others open.
    pub async fn close_all(&self) {
        let outcomes = join_all(self.providers.iter().map(|provider| async move {
            (provider.provider(), provider.close().await)
        }))
        .await;

        for (provider, outcome) in outcomes {
            match outcome {
                Ok(()) => info!(%provider, "Provider closed"),
                Err(e) => error!(%provider, error = %e, "Failed to close provider"),
            }
        }
    }
}

/// Builds a provider only once its mapping tables have been validated; the
/// constructor future is never polled for a provider with a broken table.
async fn admit<P, F>(
    provider: CloudProvider,
    validation: Result<(), MappingError>,
    construct: F,
) -> Option<Arc<dyn PricingProvider>>
where
    P: PricingProvider + 'static,
    F: Future<Output = Result<P, ProviderFailure>>,
{
    if let Err(e) = validation {
        warn!(%provider, error = %e, "Invalid mapping table, provider disabled");
        return None;
    }

    match construct.await {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(%provider, error = %e, kind = e.kind(), "Provider unavailable, excluding it");
            None
        }
    }
}

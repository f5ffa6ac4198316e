use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use observability::{PricingMetrics, PricingTimer};
use tokio::task::JoinError;
use tracing::{error, warn};

use crate::factory::ProviderFactory;
use crate::models::{
    CloudProvider, ComputePricingResponse, ComputeSpecs, ProviderError, ProviderResult, Region,
    StoragePricingResponse, StorageSpecs,
};
use crate::providers::PricingProvider;

/// Fans each request out to every active provider and merges the outcomes.
///
/// Each provider runs in its own task. A provider that fails, panics or
/// misses the deadline contributes one entry to `errors`; the others are
/// unaffected.
pub struct PricingService {
    factory: ProviderFactory,
    deadline: Option<Duration>,
}

impl PricingService {
    pub fn new(factory: ProviderFactory) -> Self {
        Self {
            factory,
            deadline: None,
        }
    }

    /// Bounds every provider call. An expired call becomes a `timeout` error
    /// for that provider only.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn PricingProvider>] {
        self.factory.get_all_providers()
    }

    pub async fn get_compute_pricing(
        &self,
        region: Region,
        specs: ComputeSpecs,
    ) -> ComputePricingResponse {
        let (results, errors) = self
            .fan_out("compute", move |provider| async move {
                provider.get_compute_pricing(region, specs).await
            })
            .await;

        ComputePricingResponse { results, errors }
    }

    pub async fn get_storage_pricing(
        &self,
        region: Region,
        specs: StorageSpecs,
    ) -> StoragePricingResponse {
        let (results, errors) = self
            .fan_out("storage", move |provider| async move {
                provider.get_storage_pricing(region, specs).await
            })
            .await;

        StoragePricingResponse { results, errors }
    }

    /// Closes every provider. Called once at shutdown.
    pub async fn close(&self) {
        self.factory.close_all().await;
    }

    async fn fan_out<T, F, Fut>(
        &self,
        operation: &'static str,
        call: F,
    ) -> (Vec<T>, Vec<ProviderError>)
    where
        T: Send + 'static,
        F: Fn(Arc<dyn PricingProvider>) -> Fut,
        Fut: Future<Output = ProviderResult<Vec<T>>> + Send + 'static,
    {
        let providers = self.factory.get_all_providers();
        if providers.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let timer = PricingTimer::start();
        let tasks: Vec<_> = providers
            .iter()
            .map(|provider| {
                let name = provider.provider();
                let pending = call(Arc::clone(provider));
                let deadline = self.deadline;

                let handle = tokio::spawn(async move {
                    let timer = PricingTimer::start();
                    let outcome = match deadline {
                        Some(limit) => tokio::time::timeout(limit, pending)
                            .await
                            .unwrap_or_else(|_| Err(ProviderError::timeout(name))),
                        None => pending.await,
                    };
                    (outcome, timer.elapsed_secs())
                });
                (name, handle)
            })
            .collect();

        let completed = join_all(
            tasks
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.await) }),
        )
        .await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (provider, joined) in completed {
            let label = provider.to_string();
            match joined {
                Ok((Ok(found), secs)) => {
                    PricingMetrics::record_provider_call(&label, operation, "success", secs, found.len());
                    results.extend(found);
                }
                Ok((Err(e), secs)) => {
                    warn!(%provider, operation, error = %e, "Provider call failed");
                    PricingMetrics::record_provider_call(&label, operation, "provider_error", secs, 0);
                    errors.push(e);
                }
                Err(join_error) => {
                    error!(%provider, operation, error = %join_error, "Provider task aborted");
                    PricingMetrics::record_provider_call(
                        &label,
                        operation,
                        "unexpected",
                        timer.elapsed_secs(),
                        0,
                    );
                    errors.push(unexpected_error(provider, join_error));
                }
            }
        }

        PricingMetrics::record_comparison(
            operation,
            providers.len(),
            results.len(),
            errors.len(),
            timer.elapsed_secs(),
        );

        (results, errors)
    }
}

/// A task that ended without a typed answer is reported under `unknown`;
/// the provider it ran for is kept in `details.source`.
fn unexpected_error(provider: CloudProvider, join_error: JoinError) -> ProviderError {
    let error = if join_error.is_panic() {
        let payload = join_error.into_panic();
        let message = panic_message(payload.as_ref())
            .unwrap_or_else(|| "provider task panicked".to_string());
        ProviderError::unexpected(message, "panic")
    } else if join_error.is_cancelled() {
        ProviderError::unexpected(join_error, "cancelled")
    } else {
        ProviderError::unexpected(join_error, "join_error")
    };

    error.with_detail("source", provider.to_string())
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::models::{ComputePrice, StoragePrice, StorageTier};
    use crate::providers::aws::{AwsPriceList, PriceListPage, PriceListService, TermFilter};
    use crate::providers::{AwsPricingClient, MockPricingProvider, ProviderFailure};
    use async_trait::async_trait;
    use serde_json::{Map, json};

    fn price(provider: CloudProvider, sku: &str, region: &str) -> ComputePrice {
        ComputePrice {
            provider,
            sku: sku.to_string(),
            service_name: "m5.large".to_string(),
            provider_region: region.to_string(),
            vcpu: 2,
            ram_gib: 8.0,
            hourly_usd: 0.096,
            service_details: Map::new(),
        }
    }

    fn provider_returning(
        provider: CloudProvider,
        outcome: ProviderResult<Vec<ComputePrice>>,
    ) -> Arc<dyn PricingProvider> {
        let mut mock = MockPricingProvider::new();
        mock.expect_provider().return_const(provider);
        mock.expect_get_compute_pricing()
            .returning(move |_, _| outcome.clone());
        Arc::new(mock)
    }

    fn service(providers: Vec<Arc<dyn PricingProvider>>) -> PricingService {
        PricingService::new(ProviderFactory::from_providers(providers))
    }

    const SPECS: ComputeSpecs = ComputeSpecs { vcpu: 2, ram_gib: 8.0 };

    #[tokio::test]
    async fn test_results_and_errors_are_merged() {
        let service = service(vec![
            provider_returning(
                CloudProvider::Aws,
                Ok(vec![
                    price(CloudProvider::Aws, "a1", "eu-west-1"),
                    price(CloudProvider::Aws, "a2", "eu-west-2"),
                ]),
            ),
            provider_returning(
                CloudProvider::Azure,
                Err(ProviderError::new(CloudProvider::Azure, "credentials rejected")),
            ),
            provider_returning(CloudProvider::Gcp, Ok(vec![])),
        ]);

        let response = service.get_compute_pricing(Region::Europe, SPECS).await;

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].provider, "azure");
        assert_eq!(response.errors[0].message, "credentials rejected");
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let mut panicking = MockPricingProvider::new();
        panicking.expect_provider().return_const(CloudProvider::Gcp);
        panicking
            .expect_get_compute_pricing()
            .returning(|_, _| panic!("catalog index out of range"));

        let service = service(vec![
            Arc::new(panicking),
            provider_returning(
                CloudProvider::Aws,
                Ok(vec![price(CloudProvider::Aws, "a1", "eu-west-1")]),
            ),
        ]);

        let response = service.get_compute_pricing(Region::Europe, SPECS).await;

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.errors.len(), 1);
        let error = &response.errors[0];
        assert_eq!(error.provider, "unknown");
        assert_eq!(error.message, "Unexpected error: catalog index out of range");
        assert_eq!(error.detail("error_type"), Some(&json!("panic")));
        assert_eq!(error.detail("source"), Some(&json!("gcp")));
    }

    #[tokio::test]
    async fn test_total_failure_still_returns_a_response() {
        let service = service(vec![
            provider_returning(
                CloudProvider::Aws,
                Err(ProviderError::new(CloudProvider::Aws, "throttled")),
            ),
            provider_returning(
                CloudProvider::Gcp,
                Err(ProviderError::new(CloudProvider::Gcp, "forbidden")),
            ),
        ]);

        let response = service.get_compute_pricing(Region::All, SPECS).await;
        assert!(response.results.is_empty());
        assert_eq!(response.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let service = service(vec![provider_returning(
            CloudProvider::Aws,
            Ok(vec![
                price(CloudProvider::Aws, "a1", "eu-west-1"),
                price(CloudProvider::Aws, "a2", "eu-central-1"),
            ]),
        )]);

        let first = service.get_compute_pricing(Region::Europe, SPECS).await;
        let second = service.get_compute_pricing(Region::Europe, SPECS).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_zero_providers_return_empty() {
        let service = service(vec![]);

        let compute = service.get_compute_pricing(Region::All, SPECS).await;
        assert!(compute.is_empty());

        let storage = service
            .get_storage_pricing(
                Region::All,
                StorageSpecs {
                    tier: StorageTier::FrequentAccess,
                },
            )
            .await;
        assert!(storage.is_empty());
    }

    struct SlowProvider;

    #[async_trait]
    impl PricingProvider for SlowProvider {
        fn provider(&self) -> CloudProvider {
            CloudProvider::Azure
        }

        async fn get_compute_pricing(
            &self,
            _region: Region,
            _specs: ComputeSpecs,
        ) -> ProviderResult<Vec<ComputePrice>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        async fn get_storage_pricing(
            &self,
            _region: Region,
            _specs: StorageSpecs,
        ) -> ProviderResult<Vec<StoragePrice>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        async fn close(&self) -> ProviderResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deadline_times_out_only_the_slow_provider() {
        let service = service(vec![
            Arc::new(SlowProvider),
            provider_returning(
                CloudProvider::Aws,
                Ok(vec![price(CloudProvider::Aws, "a1", "eu-west-1")]),
            ),
        ])
        .with_deadline(Some(Duration::from_millis(50)));

        let response = service.get_compute_pricing(Region::Europe, SPECS).await;

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].provider, "azure");
        assert_eq!(response.errors[0].message, "timeout");
    }

    #[tokio::test]
    async fn test_close_reaches_every_provider() {
        let mut aws = MockPricingProvider::new();
        aws.expect_provider().return_const(CloudProvider::Aws);
        aws.expect_close().times(1).returning(|| Ok(()));
        let mut gcp = MockPricingProvider::new();
        gcp.expect_provider().return_const(CloudProvider::Gcp);
        gcp.expect_close()
            .times(1)
            .returning(|| Err(ProviderError::new(CloudProvider::Gcp, "already gone")));

        service(vec![Arc::new(aws), Arc::new(gcp)]).close().await;
    }

    /// Answers with one EC2 record per queried location.
    struct EchoPriceList;

    #[async_trait]
    impl AwsPriceList for EchoPriceList {
        async fn get_products(
            &self,
            _service: PriceListService,
            filters: Vec<TermFilter>,
            _next_token: Option<String>,
        ) -> Result<PriceListPage, ProviderFailure> {
            let location = filters
                .iter()
                .find(|f| f.field == "location")
                .map(|f| f.value.clone())
                .unwrap_or_default();
            let record = json!({
                "product": {
                    "sku": location,
                    "attributes": {"instanceType": "m5.large", "vcpu": "2", "memory": "8 GiB"}
                },
                "terms": {"OnDemand": {"t": {"priceDimensions": {"d": {
                    "unit": "Hrs",
                    "pricePerUnit": {"USD": "0.1"}
                }}}}}
            });
            Ok(PriceListPage {
                price_list: vec![record.to_string()],
                next_token: None,
            })
        }
    }

    #[tokio::test]
    async fn test_all_region_is_union_of_geographies() {
        let client = AwsPricingClient::with_price_list(
            EchoPriceList,
            mapping::aws::region_table(),
            mapping::aws::tier_table(),
        );
        let service = service(vec![Arc::new(client)]);

        let all = service.get_compute_pricing(Region::All, SPECS).await;

        let mut union = Vec::new();
        for geography in Region::GEOGRAPHIES {
            union.extend(service.get_compute_pricing(geography, SPECS).await.results);
        }

        assert!(all.errors.is_empty());
        assert!(!all.results.is_empty());
        assert_eq!(all.results, union);
    }
}

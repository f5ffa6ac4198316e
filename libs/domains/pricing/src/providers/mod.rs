//! Provider clients.
//!
//! Every cloud provider implements [`PricingProvider`]. A call either returns
//! the complete list of matching prices or a single [`ProviderError`]; it
//! never returns both. Per-record noise in vendor catalogs is skipped inside
//! the client and never crosses this boundary.

pub mod aws;
pub mod azure;
pub mod gcp;
pub mod matching;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CloudProvider, ComputePrice, ComputeSpecs, ProviderError, ProviderResult, Region,
    StoragePrice, StorageSpecs,
};

pub use aws::AwsPricingClient;
pub use azure::AzurePricingClient;
pub use gcp::GcpPricingClient;

/// Capability every provider client offers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingProvider: Send + Sync {
    fn provider(&self) -> CloudProvider;

    /// On-demand compute prices for every concrete region behind `region`.
    async fn get_compute_pricing(
        &self,
        region: Region,
        specs: ComputeSpecs,
    ) -> ProviderResult<Vec<ComputePrice>>;

    /// Per GB-month storage prices for every concrete region behind `region`.
    async fn get_storage_pricing(
        &self,
        region: Region,
        specs: StorageSpecs,
    ) -> ProviderResult<Vec<StoragePrice>>;

    /// Releases pooled resources. Calling it more than once is a no-op.
    async fn close(&self) -> ProviderResult<()>;
}

/// Failure inside a provider client, before it is reported as a [`ProviderError`].
#[derive(Debug, Error)]
pub enum ProviderFailure {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("could not parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("SDK error: {0}")]
    Sdk(String),

    #[error("client is closed")]
    Closed,

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl ProviderFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::Parse { .. } => "parse",
            Self::NotConfigured(_) => "not_configured",
            Self::Auth(_) => "auth",
            Self::Sdk(_) => "sdk",
            Self::Closed => "closed",
            Self::Worker(_) => "worker",
        }
    }

    pub fn parse(what: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            what,
            reason: reason.to_string(),
        }
    }

    pub fn into_provider_error(self, provider: CloudProvider) -> ProviderError {
        let kind = self.kind();
        let mut error = ProviderError::new(provider, self.to_string()).with_detail("kind", kind);
        if let Self::Api { status, .. } = self {
            error = error.with_detail("status", status);
        }
        error
    }

    /// Escalates a failure in one concrete region to the whole call.
    pub fn in_region(self, provider: CloudProvider, region_code: &str) -> ProviderError {
        let mut error = self.into_provider_error(provider);
        error.message = format!("{} (region {})", error.message, region_code);
        error.with_detail("region", region_code)
    }
}

/// Runs CPU-bound or blocking work on the blocking thread pool so it never
/// stalls sibling provider calls on the async workers.
pub async fn offload<T, F>(work: F) -> Result<T, ProviderFailure>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProviderFailure::Worker(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_failure_carries_status() {
        let failure = ProviderFailure::Api {
            service: "retail prices",
            status: 503,
            body: "unavailable".to_string(),
        };
        let error = failure.in_region(CloudProvider::Azure, "westeurope");

        assert_eq!(error.provider, "azure");
        assert_eq!(
            error.message,
            "retail prices returned 503: unavailable (region westeurope)"
        );
        assert_eq!(error.detail("status"), Some(&json!(503)));
        assert_eq!(error.detail("kind"), Some(&json!("api")));
        assert_eq!(error.detail("region"), Some(&json!("westeurope")));
    }

    #[test]
    fn test_closed_message() {
        let error = ProviderFailure::Closed.into_provider_error(CloudProvider::Gcp);
        assert_eq!(error.message, "client is closed");
    }

    #[tokio::test]
    async fn test_offload_returns_value() {
        let sum = offload(|| (1..=10).sum::<u32>()).await.unwrap();
        assert_eq!(sum, 55);
    }

    #[tokio::test]
    async fn test_offload_reports_panics_as_worker_failure() {
        let result = offload(|| -> u32 { panic!("parser bug") }).await;
        assert!(matches!(result, Err(ProviderFailure::Worker(_))));
    }
}

//! Price Collector
//!
//! Runs one comparison through the shared pricing service and writes the
//! normalized results to disk.

use std::path::PathBuf;

use chrono::Utc;
use domain_pricing::{
    ComputeSpecs, PriceKind, PricingError, PricingService, ProviderError, Region, StorageSpecs,
};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::output::{OutputFormat, default_file_name, write_prices};

/// Outcome of one collection run
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub kind: String,
    pub region: Region,
    pub providers: usize,
    pub prices_written: usize,
    pub errors: Vec<ProviderError>,
    pub output: PathBuf,
}

impl CollectionSummary {
    /// True when no provider produced an answer, including the case where
    /// none is configured.
    pub fn all_failed(&self) -> bool {
        self.errors.len() >= self.providers
    }
}

pub struct PriceCollector {
    service: PricingService,
    format: OutputFormat,
}

impl PriceCollector {
    pub fn new(service: PricingService, format: OutputFormat) -> Self {
        Self { service, format }
    }

    pub async fn collect_compute(
        &self,
        region: Region,
        specs: ComputeSpecs,
        output: Option<PathBuf>,
    ) -> eyre::Result<CollectionSummary> {
        specs.validate().map_err(PricingError::from)?;

        info!(%region, vcpu = specs.vcpu, ram_gib = specs.ram_gib, "Collecting compute prices");
        let response = self.service.get_compute_pricing(region, specs).await;

        let path = self.output_path(PriceKind::Compute, region, output);
        write_prices(&response.results, self.format, &path)?;

        Ok(self.summarize(PriceKind::Compute, region, response.results.len(), response.errors, path))
    }

    pub async fn collect_storage(
        &self,
        region: Region,
        specs: StorageSpecs,
        output: Option<PathBuf>,
    ) -> eyre::Result<CollectionSummary> {
        info!(%region, tier = %specs.tier, "Collecting storage prices");
        let response = self.service.get_storage_pricing(region, specs).await;

        let path = self.output_path(PriceKind::Storage, region, output);
        write_prices(&response.results, self.format, &path)?;

        Ok(self.summarize(PriceKind::Storage, region, response.results.len(), response.errors, path))
    }

    pub async fn close(&self) {
        self.service.close().await;
    }

    fn output_path(&self, kind: PriceKind, region: Region, output: Option<PathBuf>) -> PathBuf {
        output.unwrap_or_else(|| default_file_name(kind, region, self.format, Utc::now()))
    }

    fn summarize(
        &self,
        kind: PriceKind,
        region: Region,
        prices_written: usize,
        errors: Vec<ProviderError>,
        output: PathBuf,
    ) -> CollectionSummary {
        for error in &errors {
            warn!(provider = %error.provider, message = %error.message, "Provider failed");
        }

        CollectionSummary {
            kind: kind.to_string(),
            region,
            providers: self.service.providers().len(),
            prices_written,
            errors,
            output,
        }
    }
}

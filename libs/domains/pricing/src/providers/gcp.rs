//! GCP pricing client over the Cloud Billing Catalog API.
//!
//! Compute Engine does not publish per-machine-type prices; a predefined
//! machine type costs `vcpu × core rate + GiB × ram rate`, where both rates
//! are on-demand SKUs of the machine family. Shapes come from
//! [`mapping::gcp::MACHINE_FAMILIES`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use observability::PricingMetrics;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::matching::{is_gb_month_unit, ram_matches};
use super::{PricingProvider, ProviderFailure, offload};
use crate::config::GcpConfig;
use crate::mapping::gcp::{MACHINE_FAMILIES, MachineFamily, storage_description_prefix};
use crate::mapping::{self, ProviderRegion, RegionTable, TierTable};
use crate::models::{
    CloudProvider, ComputePrice, ComputeSpecs, ProviderResult, Region, StoragePrice, StorageSpecs,
    StorageTier,
};

pub const COMPUTE_SERVICE_ID: &str = "6F81-5844-456A";
pub const STORAGE_SERVICE_ID: &str = "95FF-2EF5-5EA1";
const PAGE_SIZE: &str = "5000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogPage {
    #[serde(default)]
    skus: Vec<Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSku {
    sku_id: String,
    description: String,
    #[serde(default)]
    category: SkuCategory,
    #[serde(default)]
    service_regions: Vec<String>,
    #[serde(default)]
    pricing_info: Vec<PricingInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkuCategory {
    #[serde(default)]
    resource_family: String,
    #[serde(default)]
    usage_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingInfo {
    pricing_expression: PricingExpression,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PricingExpression {
    usage_unit: String,
    #[serde(default)]
    tiered_rates: Vec<TieredRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TieredRate {
    unit_price: UnitPrice,
}

#[derive(Debug, Deserialize)]
struct UnitPrice {
    #[serde(default)]
    units: String,
    #[serde(default)]
    nanos: i64,
}

impl UnitPrice {
    fn usd(&self) -> Option<f64> {
        let units: i64 = if self.units.is_empty() {
            0
        } else {
            self.units.parse().ok()?
        };
        Some(units as f64 + self.nanos as f64 / 1e9)
    }
}

impl CatalogSku {
    /// Price and usage unit from the latest pricing expression. Free
    /// leading tiers are skipped.
    fn unit_price(&self) -> Option<(f64, &str)> {
        let expression = &self.pricing_info.last()?.pricing_expression;
        let rates: Vec<f64> = expression
            .tiered_rates
            .iter()
            .filter_map(|rate| rate.unit_price.usd())
            .collect();
        let price = rates
            .iter()
            .copied()
            .find(|p| *p > 0.0)
            .or_else(|| rates.first().copied())?;
        Some((price, expression.usage_unit.as_str()))
    }

    fn hourly_price(&self) -> Option<f64> {
        let (price, unit) = self.unit_price()?;
        Some(price * hourly_factor(unit)?)
    }

    fn is_on_demand(&self) -> bool {
        self.category.usage_type == "OnDemand"
    }

    fn serves(&self, region_code: &str) -> bool {
        self.service_regions.iter().any(|r| r == region_code)
    }
}

/// Multiplier turning a per-unit-time price into a per-hour price.
fn hourly_factor(usage_unit: &str) -> Option<f64> {
    match usage_unit.trim_start_matches("GiBy.") {
        "h" => Some(1.0),
        "min" => Some(60.0),
        "s" => Some(3600.0),
        _ => None,
    }
}

fn decode_skus(raw: Vec<Value>) -> (Vec<CatalogSku>, usize) {
    let total = raw.len();
    let skus: Vec<CatalogSku> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(sku) => Some(sku),
            Err(e) => {
                debug!(error = %e, "Skipping unparsable catalog SKU");
                None
            }
        })
        .collect();
    let skipped = total - skus.len();
    (skus, skipped)
}

pub struct GcpPricingClient {
    http: Client,
    api_key: String,
    billing_url: String,
    regions: &'static RegionTable,
    tiers: &'static TierTable,
    closed: AtomicBool,
}

impl GcpPricingClient {
    /// Fails when GCP pricing is disabled or `GCP_API_KEY` is not set.
    pub fn new(config: &GcpConfig, timeout: Duration) -> Result<Self, ProviderFailure> {
        if !config.enabled {
            return Err(ProviderFailure::NotConfigured(
                "GCP pricing is disabled".to_string(),
            ));
        }
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderFailure::NotConfigured("GCP_API_KEY is required".to_string()))?;

        let http = Client::builder().timeout(timeout).build()?;
        info!(
            table = mapping::gcp::REGION_TABLE_VERSION,
            "GCP pricing client initialized"
        );

        Ok(Self {
            http,
            api_key,
            billing_url: config.billing_url.trim_end_matches('/').to_string(),
            regions: mapping::gcp::region_table(),
            tiers: mapping::gcp::tier_table(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn with_tables(mut self, regions: &'static RegionTable, tiers: &'static TierTable) -> Self {
        self.regions = regions;
        self.tiers = tiers;
        self
    }

    fn ensure_open(&self) -> ProviderResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderFailure::Closed.into_provider_error(CloudProvider::Gcp));
        }
        Ok(())
    }

    /// Every SKU of a billing service, across all pages.
    async fn fetch_catalog(&self, service_id: &str) -> Result<Vec<Value>, ProviderFailure> {
        let url = format!("{}/v1/services/{}/skus", self.billing_url, service_id);
        let mut skus = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("key", self.api_key.as_str()),
                ("currencyCode", "USD"),
                ("pageSize", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self.http.get(&url).query(&query).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderFailure::Api {
                    service: "cloud billing",
                    status: status.as_u16(),
                    body,
                });
            }

            let page: CatalogPage = response
                .json()
                .await
                .map_err(|e| ProviderFailure::parse("cloud billing catalog", e))?;
            skus.extend(page.skus);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(service_id, skus = skus.len(), "Fetched billing catalog");
        Ok(skus)
    }
}

#[async_trait]
impl PricingProvider for GcpPricingClient {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Gcp
    }

    async fn get_compute_pricing(
        &self,
        region: Region,
        specs: ComputeSpecs,
    ) -> ProviderResult<Vec<ComputePrice>> {
        self.ensure_open()?;

        let targets = self.regions.regions(region);
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self
            .fetch_catalog(COMPUTE_SERVICE_ID)
            .await
            .map_err(|failure| {
                warn!(error = %failure, "GCP compute catalog query failed");
                failure.into_provider_error(CloudProvider::Gcp)
            })?;

        let (prices, skipped) = offload(move || {
            let (skus, skipped) = decode_skus(raw);
            (price_machine_types(&skus, &targets, &specs), skipped)
        })
        .await
        .map_err(|failure| failure.into_provider_error(CloudProvider::Gcp))?;

        PricingMetrics::record_skipped_records("gcp", "compute", skipped);
        Ok(prices)
    }

    async fn get_storage_pricing(
        &self,
        region: Region,
        specs: StorageSpecs,
    ) -> ProviderResult<Vec<StoragePrice>> {
        self.ensure_open()?;

        let targets = self.regions.regions(region);
        let classes = self.tiers.classes(specs.tier);
        if targets.is_empty() || classes.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self
            .fetch_catalog(STORAGE_SERVICE_ID)
            .await
            .map_err(|failure| {
                warn!(error = %failure, "GCP storage catalog query failed");
                failure.into_provider_error(CloudProvider::Gcp)
            })?;

        let tier = specs.tier;
        let (prices, skipped) = offload(move || {
            let (skus, skipped) = decode_skus(raw);
            (price_storage_classes(&skus, &targets, classes, tier), skipped)
        })
        .await
        .map_err(|failure| failure.into_provider_error(CloudProvider::Gcp))?;

        PricingMetrics::record_skipped_records("gcp", "storage", skipped);
        Ok(prices)
    }

    async fn close(&self) -> ProviderResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("GCP pricing client closed");
        }
        Ok(())
    }
}

fn family_rate<'a>(
    skus: &'a [CatalogSku],
    description: &str,
    region_code: &str,
) -> Option<(&'a CatalogSku, f64)> {
    skus.iter()
        .filter(|sku| sku.is_on_demand() && sku.serves(region_code))
        .filter(|sku| sku.description.starts_with(description))
        .find_map(|sku| sku.hourly_price().map(|price| (sku, price)))
}

/// Synthesizes a price for every predefined machine type that matches
/// `specs`, per region in table order.
fn price_machine_types(
    skus: &[CatalogSku],
    targets: &[ProviderRegion],
    specs: &ComputeSpecs,
) -> Vec<ComputePrice> {
    let mut prices = Vec::new();

    for target in targets {
        for family in MACHINE_FAMILIES {
            let core = family_rate(skus, family.core_description, target.code);
            let ram = family_rate(skus, family.ram_description, target.code);
            let (Some((core_sku, core_rate)), Some((ram_sku, ram_rate))) = (core, ram) else {
                continue;
            };

            for shape in family.shapes {
                if !shape.vcpus.contains(&specs.vcpu) {
                    continue;
                }
                let ram_gib = specs.vcpu as f64 * shape.ram_per_vcpu;
                if !ram_matches(specs.ram_gib, ram_gib) {
                    continue;
                }

                prices.push(ComputePrice {
                    provider: CloudProvider::Gcp,
                    sku: format!("{}+{}", core_sku.sku_id, ram_sku.sku_id),
                    service_name: family.machine_type(shape, specs.vcpu),
                    provider_region: target.code.to_string(),
                    vcpu: specs.vcpu,
                    ram_gib,
                    hourly_usd: specs.vcpu as f64 * core_rate + ram_gib * ram_rate,
                    service_details: machine_details(family, core_sku, core_rate, ram_sku, ram_rate),
                });
            }
        }
    }

    prices
}

fn machine_details(
    family: &MachineFamily,
    core: &CatalogSku,
    core_rate: f64,
    ram: &CatalogSku,
    ram_rate: f64,
) -> Map<String, Value> {
    let details = json!({
        "family": family.prefix,
        "core_sku": core.sku_id,
        "core_description": core.description,
        "core_hourly_usd": core_rate,
        "ram_sku": ram.sku_id,
        "ram_description": ram.description,
        "ram_gib_hourly_usd": ram_rate,
    });
    match details {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn price_storage_classes(
    skus: &[CatalogSku],
    targets: &[ProviderRegion],
    classes: &[&str],
    tier: StorageTier,
) -> Vec<StoragePrice> {
    let mut prices = Vec::new();

    for target in targets {
        for class in classes {
            let Some(prefix) = storage_description_prefix(class) else {
                continue;
            };

            for sku in skus {
                if sku.category.resource_family != "Storage"
                    || !sku.serves(target.code)
                    || !sku.description.starts_with(prefix)
                    || sku.description.contains("Early Delete")
                {
                    continue;
                }
                let Some((gb_month_usd, unit)) = sku.unit_price() else {
                    continue;
                };
                if !is_gb_month_unit(unit) {
                    continue;
                }

                let mut details = Map::new();
                details.insert("description".to_string(), Value::from(sku.description.as_str()));
                details.insert("storage_class".to_string(), Value::from(*class));
                details.insert("usage_unit".to_string(), Value::from(unit));

                prices.push(StoragePrice {
                    provider: CloudProvider::Gcp,
                    sku: sku.sku_id.clone(),
                    service_name: class.to_string(),
                    provider_region: target.code.to_string(),
                    tier,
                    gb_month_usd,
                    service_details: details,
                });
            }
        }
    }

    prices
}

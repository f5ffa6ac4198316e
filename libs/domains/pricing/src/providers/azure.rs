//! Azure pricing client.
//!
//! Compute sizes come from the Resource SKUs API (capabilities `vCPUs` and
//! `MemoryGB`), prices from the public Retail Prices API. Storage needs only
//! the Retail Prices API.
//! <https://learn.microsoft.com/en-us/rest/api/cost-management/retail-prices/azure-retail-prices>

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use observability::PricingMetrics;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::matching::{compute_matches, is_gb_month_unit};
use super::{PricingProvider, ProviderFailure};
use crate::config::AzureConfig;
use crate::mapping::{self, ProviderRegion, RegionTable, TierTable};
use crate::models::{
    CloudProvider, ComputePrice, ComputeSpecs, ProviderResult, Region, StoragePrice, StorageSpecs,
    StorageTier,
};

const SKUS_API_VERSION: &str = "2021-07-01";
/// `armSkuName` clauses per Retail Prices query; longer filters are rejected.
const SKU_NAMES_PER_QUERY: usize = 10;
/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Credentials {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    subscription_id: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ResourceSkusPage {
    #[serde(default)]
    value: Vec<ResourceSku>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSku {
    #[serde(default)]
    resource_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    capabilities: Vec<SkuCapability>,
    #[serde(default)]
    restrictions: Vec<SkuRestriction>,
}

#[derive(Debug, Deserialize)]
struct SkuCapability {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SkuRestriction {
    #[serde(rename = "type")]
    restriction_type: String,
}

impl ResourceSku {
    fn capability(&self, name: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// vCPU count and memory of a VM size that is offered in the region.
    fn vm_shape(&self) -> Option<(u32, f64)> {
        if self.resource_type != "virtualMachines"
            || self.restrictions.iter().any(|r| r.restriction_type == "Location")
        {
            return None;
        }
        let vcpu = self.capability("vCPUs")?.parse().ok()?;
        let ram_gib = self.capability("MemoryGB")?.parse().ok()?;
        Some((vcpu, ram_gib))
    }
}

#[derive(Debug, Deserialize)]
struct RetailPricesPage {
    #[serde(rename = "Items", default)]
    items: Vec<Value>,
    #[serde(rename = "NextPageLink")]
    next_page_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetailPriceItem {
    #[serde(rename = "retailPrice")]
    retail_price: f64,
    #[serde(rename = "armSkuName", default)]
    arm_sku_name: Option<String>,
    #[serde(rename = "skuName")]
    sku_name: String,
    #[serde(rename = "skuId")]
    sku_id: String,
    #[serde(rename = "productName", default)]
    product_name: String,
    #[serde(rename = "meterName", default)]
    meter_name: String,
    #[serde(rename = "unitOfMeasure")]
    unit_of_measure: String,
    #[serde(rename = "type", default)]
    price_type: String,
    #[serde(rename = "reservationTerm", default)]
    reservation_term: Option<String>,
}

impl RetailPriceItem {
    fn is_on_demand_linux_hourly(&self) -> bool {
        self.price_type == "Consumption"
            && self.reservation_term.is_none()
            && !self.sku_name.contains("Spot")
            && !self.sku_name.contains("Low Priority")
            && !self.product_name.contains("Windows")
            && self.unit_of_measure == "1 Hour"
    }

    fn is_capacity_meter(&self) -> bool {
        self.price_type == "Consumption"
            && self.meter_name.ends_with("Data Stored")
            && is_gb_month_unit(&self.unit_of_measure)
    }
}

fn decode_item(raw: Value) -> Option<(RetailPriceItem, Map<String, Value>)> {
    let Value::Object(details) = raw else {
        return None;
    };
    match serde_json::from_value(Value::Object(details.clone())) {
        Ok(item) => Some((item, details)),
        Err(e) => {
            debug!(error = %e, "Skipping unparsable retail price item");
            None
        }
    }
}

pub struct AzurePricingClient {
    http: Client,
    credentials: Credentials,
    retail_prices_url: String,
    management_url: String,
    login_url: String,
    token: Mutex<Option<CachedToken>>,
    regions: &'static RegionTable,
    tiers: &'static TierTable,
    closed: AtomicBool,
}

impl AzurePricingClient {
    /// Fails when Azure pricing is disabled or any credential is missing.
    pub fn new(config: &AzureConfig, timeout: Duration) -> Result<Self, ProviderFailure> {
        if !config.enabled {
            return Err(ProviderFailure::NotConfigured(
                "Azure pricing is disabled".to_string(),
            ));
        }

        let credentials = match (
            &config.tenant_id,
            &config.client_id,
            &config.client_secret,
            &config.subscription_id,
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret), Some(subscription_id)) => {
                Credentials {
                    tenant_id: tenant_id.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    subscription_id: subscription_id.clone(),
                }
            }
            _ => {
                return Err(ProviderFailure::NotConfigured(
                    "AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET and AZURE_SUBSCRIPTION_ID are required"
                        .to_string(),
                ));
            }
        };

        let http = Client::builder().timeout(timeout).build()?;

        info!(
            table = mapping::azure::REGION_TABLE_VERSION,
            "Azure pricing client initialized"
        );

        Ok(Self {
            http,
            credentials,
            retail_prices_url: trim_base(&config.retail_prices_url),
            management_url: trim_base(&config.management_url),
            login_url: trim_base(&config.login_url),
            token: Mutex::new(None),
            regions: mapping::azure::region_table(),
            tiers: mapping::azure::tier_table(),
            closed: AtomicBool::new(false),
        })
    }

    /// Replaces the canonical mapping tables.
    pub fn with_tables(mut self, regions: &'static RegionTable, tiers: &'static TierTable) -> Self {
        self.regions = regions;
        self.tiers = tiers;
        self
    }

    fn ensure_open(&self) -> ProviderResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderFailure::Closed.into_provider_error(CloudProvider::Azure));
        }
        Ok(())
    }

    async fn access_token(&self) -> Result<String, ProviderFailure> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_url, self.credentials.tenant_id
        );
        let scope = format!("{}/.default", self.management_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::parse("token response", e))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        debug!(expires_in = token.expires_in, "Acquired Azure access token");

        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
        service: &'static str,
    ) -> Result<T, ProviderFailure> {
        let mut request = self.http.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::Api {
                service,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderFailure::parse(service, e))
    }

    /// VM sizes offered in `region` that match `specs`, keyed by size name.
    async fn matching_sizes(
        &self,
        region: &str,
        specs: &ComputeSpecs,
    ) -> Result<Vec<(String, u32, f64)>, ProviderFailure> {
        let token = self.access_token().await?;
        let filter = format!("location eq '{}'", region);
        let mut url = format!(
            "{}/subscriptions/{}/providers/Microsoft.Compute/skus?api-version={}&$filter={}",
            self.management_url,
            self.credentials.subscription_id,
            SKUS_API_VERSION,
            urlencoding::encode(&filter)
        );

        let mut sizes = Vec::new();
        loop {
            let page: ResourceSkusPage = self.get_json(&url, Some(&token), "resource skus").await?;
            for sku in page.value {
                if let Some((vcpu, ram_gib)) = sku.vm_shape() {
                    if compute_matches(specs, vcpu, ram_gib) {
                        sizes.push((sku.name, vcpu, ram_gib));
                    }
                }
            }
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        Ok(sizes)
    }

    async fn retail_prices(&self, filter: &str) -> Result<Vec<Value>, ProviderFailure> {
        let mut url = format!(
            "{}/api/retail/prices?currencyCode=USD&$filter={}",
            self.retail_prices_url,
            urlencoding::encode(filter)
        );

        let mut items = Vec::new();
        loop {
            let page: RetailPricesPage = self.get_json(&url, None, "retail prices").await?;
            items.extend(page.items);
            match page.next_page_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        Ok(items)
    }

    async fn compute_in_region(
        &self,
        region: ProviderRegion,
        specs: &ComputeSpecs,
    ) -> Result<Vec<ComputePrice>, ProviderFailure> {
        let sizes = self.matching_sizes(region.code, specs).await?;
        if sizes.is_empty() {
            return Ok(Vec::new());
        }
        let shapes: HashMap<&str, (u32, f64)> = sizes
            .iter()
            .map(|(name, vcpu, ram)| (name.as_str(), (*vcpu, *ram)))
            .collect();

        let mut prices = Vec::new();
        let mut skipped = 0;
        for chunk in sizes.chunks(SKU_NAMES_PER_QUERY) {
            let names = or_clause(
                "armSkuName",
                chunk.iter().map(|(name, _, _)| name.as_str()),
            );
            let filter = format!(
                "serviceName eq 'Virtual Machines' and priceType eq 'Consumption' and armRegionName eq '{}' and ({})",
                region.code, names
            );

            for raw in self.retail_prices(&filter).await? {
                let Some((item, details)) = decode_item(raw) else {
                    skipped += 1;
                    continue;
                };
                let shape = item
                    .arm_sku_name
                    .as_deref()
                    .and_then(|name| shapes.get(name).map(|shape| (name, *shape)));
                let Some((name, (vcpu, ram_gib))) = shape else {
                    skipped += 1;
                    continue;
                };
                if !item.is_on_demand_linux_hourly() {
                    skipped += 1;
                    continue;
                }

                prices.push(ComputePrice {
                    provider: CloudProvider::Azure,
                    sku: item.sku_id.clone(),
                    service_name: name.to_string(),
                    provider_region: region.code.to_string(),
                    vcpu,
                    ram_gib,
                    hourly_usd: item.retail_price,
                    service_details: details,
                });
            }
        }

        PricingMetrics::record_skipped_records("azure", "compute", skipped);
        Ok(prices)
    }

    async fn storage_in_region(
        &self,
        region: ProviderRegion,
        tier: StorageTier,
    ) -> Result<Vec<StoragePrice>, ProviderFailure> {
        let classes = or_clause("skuName", self.tiers.classes(tier).iter().copied());
        let filter = format!(
            "serviceName eq 'Storage' and armRegionName eq '{}' and ({})",
            region.code, classes
        );

        let mut prices = Vec::new();
        let mut skipped = 0;
        for raw in self.retail_prices(&filter).await? {
            let Some((item, details)) = decode_item(raw) else {
                skipped += 1;
                continue;
            };
            if !item.is_capacity_meter() {
                skipped += 1;
                continue;
            }

            prices.push(StoragePrice {
                provider: CloudProvider::Azure,
                sku: item.sku_id.clone(),
                service_name: item.sku_name.clone(),
                provider_region: region.code.to_string(),
                tier,
                gb_month_usd: item.retail_price,
                service_details: details,
            });
        }

        PricingMetrics::record_skipped_records("azure", "storage", skipped);
        Ok(prices)
    }
}

#[async_trait]
impl PricingProvider for AzurePricingClient {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Azure
    }

    async fn get_compute_pricing(
        &self,
        region: Region,
        specs: ComputeSpecs,
    ) -> ProviderResult<Vec<ComputePrice>> {
        self.ensure_open()?;

        let mut prices = Vec::new();
        for target in self.regions.regions(region) {
            match self.compute_in_region(target, &specs).await {
                Ok(mut found) => prices.append(&mut found),
                Err(failure) => {
                    warn!(region = target.code, error = %failure, "Azure compute query failed");
                    return Err(failure.in_region(CloudProvider::Azure, target.code));
                }
            }
        }

        Ok(prices)
    }

    async fn get_storage_pricing(
        &self,
        region: Region,
        specs: StorageSpecs,
    ) -> ProviderResult<Vec<StoragePrice>> {
        self.ensure_open()?;

        if self.tiers.classes(specs.tier).is_empty() {
            debug!(tier = %specs.tier, "Azure has no storage class for tier");
            return Ok(Vec::new());
        }

        let mut prices = Vec::new();
        for target in self.regions.regions(region) {
            match self.storage_in_region(target, specs.tier).await {
                Ok(mut found) => prices.append(&mut found),
                Err(failure) => {
                    warn!(region = target.code, error = %failure, "Azure storage query failed");
                    return Err(failure.in_region(CloudProvider::Azure, target.code));
                }
            }
        }

        Ok(prices)
    }

    async fn close(&self) -> ProviderResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.token.lock().await.take();
            debug!("Azure pricing client closed");
        }
        Ok(())
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// `field eq 'a' or field eq 'b'`
fn or_clause<'a>(field: &str, values: impl Iterator<Item = &'a str>) -> String {
    values
        .map(|value| format!("{} eq '{}'", field, value))
        .collect::<Vec<_>>()
        .join(" or ")
}

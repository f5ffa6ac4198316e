//! AWS Price List client.
//!
//! Queries `GetProducts` once per concrete region (and per storage class for
//! S3), follows `NextToken` to the end, and normalizes the JSON price-list
//! documents. Filtering on vCPU happens server-side; RAM is matched post-hoc
//! because the catalog's `memory` strings are not integral for every family.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_pricing::error::DisplayErrorContext;
use aws_sdk_pricing::types::{Filter, FilterType};
use observability::PricingMetrics;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::matching::{compute_matches, is_gb_month_unit, parse_gib};
use super::{PricingProvider, ProviderFailure, offload};
use crate::config::AwsConfig;
use crate::mapping::{self, ProviderRegion, RegionTable, TierTable};
use crate::models::{
    CloudProvider, ComputePrice, ComputeSpecs, ProviderResult, Region, StoragePrice, StorageSpecs,
    StorageTier,
};

const HOURLY_UNIT: &str = "Hrs";

/// Price List service codes the client queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceListService {
    Ec2,
    S3,
}

impl PriceListService {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ec2 => "AmazonEC2",
            Self::S3 => "AmazonS3",
        }
    }
}

/// One `TERM_MATCH` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFilter {
    pub field: &'static str,
    pub value: String,
}

impl TermFilter {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// One page of `GetProducts` output: raw price-list JSON documents.
#[derive(Debug, Clone, Default)]
pub struct PriceListPage {
    pub price_list: Vec<String>,
    pub next_token: Option<String>,
}

/// The single Price List API call the client depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AwsPriceList: Send + Sync {
    async fn get_products(
        &self,
        service: PriceListService,
        filters: Vec<TermFilter>,
        next_token: Option<String>,
    ) -> Result<PriceListPage, ProviderFailure>;
}

/// [`AwsPriceList`] backed by `aws-sdk-pricing`.
pub struct SdkPriceList {
    client: aws_sdk_pricing::Client,
    page_size: i32,
}

impl SdkPriceList {
    /// Loads the default AWS configuration and resolves credentials once, so
    /// a host without any usable credentials is reported at startup instead
    /// of on the first query.
    pub async fn from_config(config: &AwsConfig) -> Result<Self, ProviderFailure> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.pricing_region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let Some(credentials) = sdk_config.credentials_provider() else {
            return Err(ProviderFailure::NotConfigured(
                "no AWS credentials provider configured".to_string(),
            ));
        };
        if let Err(e) = credentials.provide_credentials().await {
            return Err(ProviderFailure::NotConfigured(format!(
                "no usable AWS credentials: {}",
                DisplayErrorContext(&e)
            )));
        }

        Ok(Self {
            client: aws_sdk_pricing::Client::new(&sdk_config),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl AwsPriceList for SdkPriceList {
    async fn get_products(
        &self,
        service: PriceListService,
        filters: Vec<TermFilter>,
        next_token: Option<String>,
    ) -> Result<PriceListPage, ProviderFailure> {
        let mut request = self
            .client
            .get_products()
            .service_code(service.code())
            .format_version("aws_v1")
            .max_results(self.page_size)
            .set_next_token(next_token);

        for filter in filters {
            let filter = Filter::builder()
                .r#type(FilterType::TermMatch)
                .field(filter.field)
                .value(filter.value)
                .build()
                .map_err(|e| ProviderFailure::Sdk(e.to_string()))?;
            request = request.filters(filter);
        }

        let output = request
            .send()
            .await
            .map_err(|e| ProviderFailure::Sdk(DisplayErrorContext(&e).to_string()))?;

        Ok(PriceListPage {
            price_list: output.price_list().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

pub struct AwsPricingClient {
    price_list: Box<dyn AwsPriceList>,
    regions: &'static RegionTable,
    tiers: &'static TierTable,
    closed: AtomicBool,
}

impl AwsPricingClient {
    /// Builds the SDK-backed client. Fails when AWS pricing is disabled or no
    /// credentials can be resolved.
    pub async fn new(config: &AwsConfig) -> Result<Self, ProviderFailure> {
        if !config.enabled {
            return Err(ProviderFailure::NotConfigured(
                "AWS pricing is disabled".to_string(),
            ));
        }

        let price_list = SdkPriceList::from_config(config).await?;
        info!(
            pricing_region = %config.pricing_region,
            table = mapping::aws::REGION_TABLE_VERSION,
            "AWS pricing client initialized"
        );

        Ok(Self::with_price_list(
            price_list,
            mapping::aws::region_table(),
            mapping::aws::tier_table(),
        ))
    }

    pub fn with_price_list(
        price_list: impl AwsPriceList + 'static,
        regions: &'static RegionTable,
        tiers: &'static TierTable,
    ) -> Self {
        Self {
            price_list: Box::new(price_list),
            regions,
            tiers,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> ProviderResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderFailure::Closed.into_provider_error(CloudProvider::Aws));
        }
        Ok(())
    }

    async fn fetch_all(
        &self,
        service: PriceListService,
        filters: Vec<TermFilter>,
    ) -> Result<Vec<String>, ProviderFailure> {
        let mut records = Vec::new();
        let mut next_token = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .price_list
                .get_products(service, filters.clone(), next_token.take())
                .await?;
            pages += 1;
            records.extend(page.price_list);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(
            service_code = service.code(),
            pages,
            records = records.len(),
            "Fetched price list"
        );
        Ok(records)
    }

    async fn compute_in_region(
        &self,
        region: ProviderRegion,
        specs: ComputeSpecs,
    ) -> Result<Vec<ComputePrice>, ProviderFailure> {
        let records = self
            .fetch_all(PriceListService::Ec2, compute_filters(region, &specs))
            .await?;

        let (prices, skipped) =
            offload(move || parse_compute_records(&records, &specs, region.code)).await?;
        PricingMetrics::record_skipped_records("aws", "compute", skipped);
        Ok(prices)
    }

    async fn storage_in_region(
        &self,
        region: ProviderRegion,
        tier: StorageTier,
    ) -> Result<Vec<StoragePrice>, ProviderFailure> {
        let mut prices = Vec::new();

        for class in self.tiers.classes(tier) {
            let records = self
                .fetch_all(PriceListService::S3, storage_filters(region, class))
                .await?;

            let (mut parsed, skipped) =
                offload(move || parse_storage_records(&records, tier, class, region.code)).await?;
            PricingMetrics::record_skipped_records("aws", "storage", skipped);
            prices.append(&mut parsed);
        }

        Ok(prices)
    }
}

#[async_trait]
impl PricingProvider for AwsPricingClient {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Aws
    }

    async fn get_compute_pricing(
        &self,
        region: Region,
        specs: ComputeSpecs,
    ) -> ProviderResult<Vec<ComputePrice>> {
        self.ensure_open()?;

        let targets = self.regions.regions(region);
        if targets.is_empty() {
            debug!(%region, "AWS has no regions mapped");
            return Ok(Vec::new());
        }

        let mut prices = Vec::new();
        for target in targets {
            match self.compute_in_region(target, specs).await {
                Ok(mut found) => prices.append(&mut found),
                Err(failure) => {
                    warn!(region = target.code, error = %failure, "AWS compute query failed");
                    return Err(failure.in_region(CloudProvider::Aws, target.code));
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

        let targets = self.regions.regions(region);
        if targets.is_empty() || self.tiers.classes(specs.tier).is_empty() {
            debug!(%region, tier = %specs.tier, "AWS has no regions or classes mapped");
            return Ok(Vec::new());
        }

        let mut prices = Vec::new();
        for target in targets {
            match self.storage_in_region(target, specs.tier).await {
                Ok(mut found) => prices.append(&mut found),
                Err(failure) => {
                    warn!(region = target.code, error = %failure, "AWS storage query failed");
                    return Err(failure.in_region(CloudProvider::Aws, target.code));
                }
            }
        }

        Ok(prices)
    }

    async fn close(&self) -> ProviderResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("AWS pricing client closed");
        }
        Ok(())
    }
}

fn compute_filters(region: ProviderRegion, specs: &ComputeSpecs) -> Vec<TermFilter> {
    vec![
        TermFilter::new("termType", "OnDemand"),
        TermFilter::new("capacitystatus", "Used"),
        TermFilter::new("location", region.display_name),
        TermFilter::new("operatingSystem", "Linux"),
        TermFilter::new("tenancy", "Shared"),
        TermFilter::new("preInstalledSw", "NA"),
        TermFilter::new("licenseModel", "No License required"),
        TermFilter::new("vcpu", specs.vcpu.to_string()),
    ]
}

fn storage_filters(region: ProviderRegion, class: &str) -> Vec<TermFilter> {
    vec![
        TermFilter::new("productFamily", "Storage"),
        TermFilter::new("volumeType", class),
        TermFilter::new("location", region.display_name),
    ]
}

#[derive(Debug, Deserialize)]
struct PriceListRecord {
    product: Product,
    #[serde(default)]
    terms: Terms,
}

#[derive(Debug, Deserialize)]
struct Product {
    sku: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand", default)]
    on_demand: BTreeMap<String, Term>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Term {
    #[serde(default)]
    price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceDimension {
    #[serde(default)]
    unit: String,
    #[serde(default)]
    price_per_unit: HashMap<String, String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    begin_range: Option<String>,
    #[serde(default)]
    end_range: Option<String>,
}

impl PriceDimension {
    fn usd(&self) -> Option<f64> {
        self.price_per_unit.get("USD")?.parse().ok()
    }
}

impl PriceListRecord {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.product.attributes.get(name)?.as_str()
    }

}

impl Terms {
    fn dimensions(&self) -> impl Iterator<Item = &PriceDimension> {
        self.on_demand
            .values()
            .flat_map(|term| term.price_dimensions.values())
    }
}

fn parse_record(raw: &str) -> Option<PriceListRecord> {
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "Skipping unparsable price-list record");
            None
        }
    }
}

/// One attribute map per priced dimension. The record's own map goes to the
/// last dimension; only extra dimensions get a copy.
fn spread_attributes(attributes: Map<String, Value>, count: usize) -> Vec<Map<String, Value>> {
    let mut copies = Vec::with_capacity(count);
    if count == 0 {
        return copies;
    }
    copies.extend(std::iter::repeat_n(&attributes, count - 1).cloned());
    copies.push(attributes);
    copies
}

/// Returns the matched prices and the number of records skipped.
fn parse_compute_records(
    records: &[String],
    specs: &ComputeSpecs,
    region_code: &str,
) -> (Vec<ComputePrice>, usize) {
    let mut prices = Vec::new();
    let mut skipped = 0;

    for raw in records {
        let Some(record) = parse_record(raw) else {
            skipped += 1;
            continue;
        };

        let instance_type = record.attribute("instanceType");
        let vcpu = record.attribute("vcpu").and_then(|v| v.parse::<u32>().ok());
        let ram_gib = record.attribute("memory").and_then(parse_gib);

        let (Some(instance_type), Some(vcpu), Some(ram_gib)) = (instance_type, vcpu, ram_gib) else {
            debug!(sku = %record.product.sku, "Skipping record without instance attributes");
            skipped += 1;
            continue;
        };

        if !compute_matches(specs, vcpu, ram_gib) {
            skipped += 1;
            continue;
        }

        let instance_type = instance_type.to_string();
        let PriceListRecord { product, terms } = record;
        let priced: Vec<_> = terms
            .dimensions()
            .filter(|d| d.unit == HOURLY_UNIT)
            .filter_map(|d| d.usd().map(|usd| (d, usd)))
            .collect();
        if priced.is_empty() {
            debug!(sku = %product.sku, "Skipping record without an hourly USD price");
            skipped += 1;
            continue;
        }

        let copies = spread_attributes(product.attributes, priced.len());
        for ((dimension, hourly_usd), mut details) in priced.into_iter().zip(copies) {
            if let Some(description) = &dimension.description {
                details.insert("price_description".to_string(), Value::from(description.as_str()));
            }

            prices.push(ComputePrice {
                provider: CloudProvider::Aws,
                sku: product.sku.clone(),
                service_name: instance_type.clone(),
                provider_region: region_code.to_string(),
                vcpu,
                ram_gib,
                hourly_usd,
                service_details: details,
            });
        }
    }

    (prices, skipped)
}

fn parse_storage_records(
    records: &[String],
    tier: StorageTier,
    class: &str,
    region_code: &str,
) -> (Vec<StoragePrice>, usize) {
    let mut prices = Vec::new();
    let mut skipped = 0;

    for raw in records {
        let Some(record) = parse_record(raw) else {
            skipped += 1;
            continue;
        };

        let service_name = record
            .attribute("volumeType")
            .or_else(|| record.attribute("storageClass"))
            .unwrap_or(class)
            .to_string();

        let PriceListRecord { product, terms } = record;
        let priced: Vec<_> = terms
            .dimensions()
            .filter(|d| is_gb_month_unit(&d.unit))
            .filter_map(|d| d.usd().map(|usd| (d, usd)))
            .collect();
        if priced.is_empty() {
            skipped += 1;
            continue;
        }

        let copies = spread_attributes(product.attributes, priced.len());
        for ((dimension, gb_month_usd), mut details) in priced.into_iter().zip(copies) {
            for (key, value) in [
                ("price_description", &dimension.description),
                ("begin_range", &dimension.begin_range),
                ("end_range", &dimension.end_range),
            ] {
                if let Some(value) = value {
                    details.insert(key.to_string(), Value::from(value.as_str()));
                }
            }

            prices.push(StoragePrice {
                provider: CloudProvider::Aws,
                sku: product.sku.clone(),
                service_name: service_name.clone(),
                provider_region: region_code.to_string(),
                tier,
                gb_month_usd,
                service_details: details,
            });
        }
    }

    (prices, skipped)
}

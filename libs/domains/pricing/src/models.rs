use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

/// Provider-specific attributes carried through unchanged from the vendor record.
pub type ServiceDetails = Map<String, Value>;

/// Cloud provider enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

/// Abstract geography used as the comparison filter.
///
/// `All` is a wildcard: it resolves to every mapped concrete region of every
/// other variant, in declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Region {
    All,
    NorthAmerica,
    SouthAmerica,
    Europe,
    Asia,
    Africa,
    Oceania,
    Antarctica,
    MultiRegion,
}

impl Region {
    /// Every concrete geography, i.e. every variant except `All`, in declaration order.
    pub const GEOGRAPHIES: [Region; 8] = [
        Region::NorthAmerica,
        Region::SouthAmerica,
        Region::Europe,
        Region::Asia,
        Region::Africa,
        Region::Oceania,
        Region::Antarctica,
        Region::MultiRegion,
    ];

    pub fn is_all(&self) -> bool {
        matches!(self, Region::All)
    }
}

/// Abstract access-frequency tier. The tradeoffs below are guidance for
/// mapping vendor classes onto tiers; nothing enforces them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum StorageTier {
    /// Automatic movement between tiers based on observed access patterns.
    /// Minimal configuration; a small per-object monitoring fee.
    Smart,
    /// Read or written on every request. Lowest latency and highest
    /// throughput, highest storage cost, little or no retrieval fee.
    FrequentAccess,
    /// Accessed intermittently. Moderate latency, lower storage cost,
    /// retrieval fees apply. Minimum storage duration around 30 days.
    OccasionalAccess,
    /// Accessed rarely (e.g. quarterly) but still needs millisecond retrieval.
    /// Higher retrieval fees. Minimum storage duration around 90 days.
    RareAccess,
    /// Archive kept days to weeks, retrieval in minutes. Very low storage
    /// cost, early-deletion fees. Minimum duration 30 to 90 days.
    ShortTermArchive,
    /// Deep archive that is almost never read, retrieval in hours. Lowest
    /// storage cost. Minimum duration 180 to 365 days.
    LongTermArchive,
}

/// Compute filter. vCPU matches exactly, RAM within ±0.1 GiB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ComputeSpecs {
    /// Number of virtual CPUs
    #[validate(range(min = 1, message = "vcpu must be greater than 0"))]
    #[schema(example = 2, minimum = 1)]
    pub vcpu: u32,
    /// Memory in GiB
    #[validate(range(exclusive_min = 0.0, message = "ram_gib must be greater than 0"))]
    #[schema(example = 8.0)]
    pub ram_gib: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct StorageSpecs {
    pub tier: StorageTier,
}

/// One on-demand compute price for a (provider, SKU, concrete region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComputePrice {
    pub provider: CloudProvider,
    pub sku: String,
    /// Instance type or machine type, e.g. `m5.large`
    pub service_name: String,
    /// Concrete provider region code, e.g. `eu-west-1`
    pub provider_region: String,
    pub vcpu: u32,
    pub ram_gib: f64,
    pub hourly_usd: f64,
    #[schema(value_type = Object)]
    pub service_details: ServiceDetails,
}

/// One storage price per GB-month for a (provider, SKU, concrete region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoragePrice {
    pub provider: CloudProvider,
    pub sku: String,
    /// Vendor storage class, e.g. `Glacier Deep Archive`
    pub service_name: String,
    pub provider_region: String,
    pub tier: StorageTier,
    pub gb_month_usd: f64,
    #[schema(value_type = Object)]
    pub service_details: ServiceDetails,
}

/// A single provider's total failure to answer one request.
///
/// Returned by provider clients as their typed error and reported verbatim
/// in the `errors` list of a comparison response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Error)]
#[error("{provider}: {message}")]
pub struct ProviderError {
    /// Provider name, or `unknown` when the failure could not be attributed
    pub provider: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<ServiceDetails>,
}

impl ProviderError {
    pub const UNKNOWN_PROVIDER: &'static str = "unknown";

    pub fn new(provider: impl ToString, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Failure that escaped a provider call without a typed error (panic,
    /// cancelled task). Tagged `unknown` so it can never be confused with a
    /// real provider answer.
    pub fn unexpected(message: impl std::fmt::Display, error_type: &str) -> Self {
        Self::new(Self::UNKNOWN_PROVIDER, format!("Unexpected error: {}", message))
            .with_detail("error_type", error_type)
    }

    pub fn timeout(provider: impl ToString) -> Self {
        Self::new(provider, "timeout").with_detail("error_type", "timeout")
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }
}

/// `ProviderError` is the only error a provider call can produce.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ComputePricingRequest {
    pub region: Region,
    #[validate(nested)]
    pub specs: ComputeSpecs,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StoragePricingRequest {
    pub region: Region,
    #[validate(nested)]
    pub specs: StorageSpecs,
}

/// Merged compute comparison. Partial success populates both lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComputePricingResponse {
    pub results: Vec<ComputePrice>,
    pub errors: Vec<ProviderError>,
}

impl ComputePricingResponse {
    /// Nothing matched and no provider failed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.errors.is_empty()
    }
}

/// Merged storage comparison. Partial success populates both lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoragePricingResponse {
    pub results: Vec<StoragePrice>,
    pub errors: Vec<ProviderError>,
}

impl StoragePricingResponse {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_region_wire_names() {
        let names: Vec<String> = Region::iter().map(|r| r.to_string()).collect();
        assert_eq!(
            names,
            [
                "all",
                "north-america",
                "south-america",
                "europe",
                "asia",
                "africa",
                "oceania",
                "antarctica",
                "multi-region"
            ]
        );

        let parsed: Region = serde_json::from_value(json!("multi-region")).unwrap();
        assert_eq!(parsed, Region::MultiRegion);
        assert!(serde_json::from_value::<Region>(json!("mars")).is_err());
    }

    #[test]
    fn test_geographies_exclude_all() {
        assert!(!Region::GEOGRAPHIES.contains(&Region::All));
        assert_eq!(Region::GEOGRAPHIES.len(), Region::iter().count() - 1);
    }

    #[test]
    fn test_storage_tier_wire_names() {
        assert_eq!(
            serde_json::to_value(StorageTier::ShortTermArchive).unwrap(),
            json!("ShortTermArchive")
        );
        let tier: StorageTier = serde_json::from_value(json!("Smart")).unwrap();
        assert_eq!(tier, StorageTier::Smart);
        assert_eq!(StorageTier::FrequentAccess.to_string(), "FrequentAccess");
    }

    #[test]
    fn test_compute_specs_validation() {
        assert!(ComputeSpecs { vcpu: 2, ram_gib: 8.0 }.validate().is_ok());
        assert!(ComputeSpecs { vcpu: 0, ram_gib: 8.0 }.validate().is_err());
        assert!(ComputeSpecs { vcpu: 2, ram_gib: 0.0 }.validate().is_err());
        assert!(ComputeSpecs { vcpu: 2, ram_gib: -1.0 }.validate().is_err());
    }

    #[test]
    fn test_request_validation_reaches_nested_specs() {
        let request = ComputePricingRequest {
            region: Region::Europe,
            specs: ComputeSpecs { vcpu: 0, ram_gib: 8.0 },
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_unexpected_provider_error_shape() {
        let err = ProviderError::unexpected("boom", "panic");
        assert_eq!(err.provider, "unknown");
        assert_eq!(err.message, "Unexpected error: boom");
        assert_eq!(err.detail("error_type"), Some(&json!("panic")));
    }

    #[test]
    fn test_provider_error_serialization_skips_empty_details() {
        let err = ProviderError::new(CloudProvider::Azure, "credentials rejected");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, json!({"provider": "azure", "message": "credentials rejected"}));
        assert_eq!(err.to_string(), "azure: credentials rejected");
    }

    #[test]
    fn test_response_is_empty() {
        let mut response = StoragePricingResponse::default();
        assert!(response.is_empty());

        response.errors.push(ProviderError::timeout(CloudProvider::Gcp));
        assert!(!response.is_empty());
    }
}

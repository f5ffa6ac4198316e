use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_bool, env_optional, env_or_default, env_parse};

/// Settings for every provider client plus the aggregation deadline.
#[derive(Clone, Debug)]
pub struct ProvidersConfig {
    pub aws: AwsConfig,
    pub azure: AzureConfig,
    pub gcp: GcpConfig,
    /// Timeout applied to each provider's HTTP client.
    pub http_timeout: Duration,
    /// Optional per-provider deadline enforced by the aggregation service.
    pub deadline: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct AwsConfig {
    pub enabled: bool,
    /// Region hosting the Pricing API endpoint.
    pub pricing_region: String,
    pub endpoint_url: Option<String>,
    pub page_size: i32,
}

#[derive(Clone, Debug)]
pub struct AzureConfig {
    pub enabled: bool,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_id: Option<String>,
    pub retail_prices_url: String,
    pub management_url: String,
    pub login_url: String,
}

#[derive(Clone, Debug)]
pub struct GcpConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub billing_url: String,
}

pub const DEFAULT_AZURE_RETAIL_PRICES_URL: &str = "https://prices.azure.com";
pub const DEFAULT_AZURE_MANAGEMENT_URL: &str = "https://management.azure.com";
pub const DEFAULT_AZURE_LOGIN_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GCP_BILLING_URL: &str = "https://cloudbilling.googleapis.com";

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pricing_region: "us-east-1".to_string(),
            endpoint_url: None,
            page_size: 100,
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            subscription_id: None,
            retail_prices_url: DEFAULT_AZURE_RETAIL_PRICES_URL.to_string(),
            management_url: DEFAULT_AZURE_MANAGEMENT_URL.to_string(),
            login_url: DEFAULT_AZURE_LOGIN_URL.to_string(),
        }
    }
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            billing_url: DEFAULT_GCP_BILLING_URL.to_string(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            aws: AwsConfig::default(),
            azure: AzureConfig::default(),
            gcp: GcpConfig::default(),
            http_timeout: Duration::from_secs(30),
            deadline: None,
        }
    }
}

impl FromEnv for AwsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_bool("AWS_PRICING_ENABLED", true)?,
            pricing_region: env_or_default("AWS_PRICING_REGION", "us-east-1"),
            endpoint_url: env_optional("AWS_PRICING_ENDPOINT"),
            page_size: env_parse("AWS_PRICING_PAGE_SIZE", 100)?,
        })
    }
}

impl FromEnv for AzureConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_bool("AZURE_PRICING_ENABLED", true)?,
            tenant_id: env_optional("AZURE_TENANT_ID"),
            client_id: env_optional("AZURE_CLIENT_ID"),
            client_secret: env_optional("AZURE_CLIENT_SECRET"),
            subscription_id: env_optional("AZURE_SUBSCRIPTION_ID"),
            retail_prices_url: env_or_default(
                "AZURE_RETAIL_PRICES_URL",
                DEFAULT_AZURE_RETAIL_PRICES_URL,
            ),
            management_url: env_or_default("AZURE_MANAGEMENT_URL", DEFAULT_AZURE_MANAGEMENT_URL),
            login_url: env_or_default("AZURE_LOGIN_URL", DEFAULT_AZURE_LOGIN_URL),
        })
    }
}

impl FromEnv for GcpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_bool("GCP_PRICING_ENABLED", true)?,
            api_key: env_optional("GCP_API_KEY"),
            billing_url: env_or_default("GCP_BILLING_URL", DEFAULT_GCP_BILLING_URL),
        })
    }
}

impl FromEnv for ProvidersConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let deadline = match env_optional("PROVIDER_DEADLINE_SECS") {
            Some(_) => Some(Duration::from_secs(env_parse("PROVIDER_DEADLINE_SECS", 0u64)?)),
            None => None,
        };

        Ok(Self {
            aws: AwsConfig::from_env()?,
            azure: AzureConfig::from_env()?,
            gcp: GcpConfig::from_env()?,
            http_timeout: Duration::from_secs(env_parse("PROVIDER_HTTP_TIMEOUT_SECS", 30u64)?),
            deadline,
        })
    }
}

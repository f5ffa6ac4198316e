//! CSV rows, as written by the collector, turned into insertable models.

use std::io::Read;
use std::str::FromStr;

use domain_pricing::{CloudProvider, StorageTier};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::entity::{compute_price, storage_price};

#[derive(Debug, Error)]
pub enum RowError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("unknown storage tier '{0}'")]
    UnknownTier(String),

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("vcpu {0} is out of range")]
    InvalidVcpu(u32),

    #[error("service_details is not a JSON object: {0}")]
    Details(String),
}

/// Models ready for insertion plus the number of rows that were dropped.
#[derive(Debug)]
pub struct ParsedRows<A> {
    pub rows: Vec<A>,
    pub rejected: usize,
}

#[derive(Debug, Deserialize)]
struct ComputeRecord {
    provider: String,
    sku: String,
    service_name: String,
    provider_region: String,
    vcpu: u32,
    ram_gib: f64,
    hourly_usd: f64,
    #[serde(default)]
    service_details: String,
}

#[derive(Debug, Deserialize)]
struct StorageRecord {
    provider: String,
    sku: String,
    service_name: String,
    provider_region: String,
    tier: String,
    gb_month_usd: f64,
    #[serde(default)]
    service_details: String,
}

impl ComputeRecord {
    fn into_model(
        self,
        collected_at: DateTimeWithTimeZone,
    ) -> Result<compute_price::ActiveModel, RowError> {
        let provider = provider(&self.provider)?;
        let vcpu = i32::try_from(self.vcpu)
            .ok()
            .filter(|v| *v > 0)
            .ok_or(RowError::InvalidVcpu(self.vcpu))?;

        Ok(compute_price::ActiveModel {
            id: NotSet,
            provider: Set(provider.to_string()),
            sku: Set(self.sku),
            service_name: Set(self.service_name),
            provider_region: Set(self.provider_region),
            vcpu: Set(vcpu),
            ram_gib: Set(price("ram_gib", self.ram_gib)?),
            hourly_usd: Set(price("hourly_usd", self.hourly_usd)?),
            service_details: Set(details(&self.service_details)?),
            collected_at: Set(collected_at),
        })
    }
}

impl StorageRecord {
    fn into_model(
        self,
        collected_at: DateTimeWithTimeZone,
    ) -> Result<storage_price::ActiveModel, RowError> {
        let provider = provider(&self.provider)?;
        let tier =
            StorageTier::from_str(&self.tier).map_err(|_| RowError::UnknownTier(self.tier.clone()))?;

        Ok(storage_price::ActiveModel {
            id: NotSet,
            provider: Set(provider.to_string()),
            sku: Set(self.sku),
            service_name: Set(self.service_name),
            provider_region: Set(self.provider_region),
            tier: Set(tier.to_string()),
            gb_month_usd: Set(price("gb_month_usd", self.gb_month_usd)?),
            service_details: Set(details(&self.service_details)?),
            collected_at: Set(collected_at),
        })
    }
}

fn provider(raw: &str) -> Result<CloudProvider, RowError> {
    CloudProvider::from_str(raw.trim()).map_err(|_| RowError::UnknownProvider(raw.to_string()))
}

fn price(field: &'static str, value: f64) -> Result<f64, RowError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RowError::InvalidPrice { field, value })
    }
}

fn details(raw: &str) -> Result<Value, RowError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(RowError::Details(format!("found {}", other))),
        Err(e) => Err(RowError::Details(e.to_string())),
    }
}

/// Reads a compute CSV. Unreadable or invalid rows are logged and counted.
pub fn parse_compute_csv<R: Read>(
    reader: R,
    collected_at: DateTimeWithTimeZone,
) -> ParsedRows<compute_price::ActiveModel> {
    parse_csv(reader, |record: ComputeRecord| record.into_model(collected_at))
}

pub fn parse_storage_csv<R: Read>(
    reader: R,
    collected_at: DateTimeWithTimeZone,
) -> ParsedRows<storage_price::ActiveModel> {
    parse_csv(reader, |record: StorageRecord| record.into_model(collected_at))
}

fn parse_csv<R, T, A, F>(reader: R, convert: F) -> ParsedRows<A>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
    F: Fn(T) -> Result<A, RowError>,
{
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut parsed = ParsedRows {
        rows: Vec::new(),
        rejected: 0,
    };

    for (index, record) in csv.deserialize::<T>().enumerate() {
        // header is line 1
        let line = index + 2;
        match record {
            Ok(record) => match convert(record) {
                Ok(model) => parsed.rows.push(model),
                Err(e) => {
                    warn!(line, error = %e, "Rejecting price row");
                    parsed.rejected += 1;
                }
            },
            Err(e) => {
                warn!(line, error = %e, "Unreadable price row");
                parsed.rejected += 1;
            }
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn at() -> DateTimeWithTimeZone {
        Utc.with_ymd_and_hms(2024, 10, 15, 12, 0, 0).unwrap().fixed_offset()
    }

    const COMPUTE_HEADER: &str =
        "provider,sku,service_name,provider_region,vcpu,ram_gib,hourly_usd,service_details";

    #[test]
    fn test_compute_row_becomes_model() {
        let csv = format!(
            "{COMPUTE_HEADER}\naws,ABC123,m5.large,eu-west-1,2,8.0,0.107,\"{{\"\"instanceType\"\":\"\"m5.large\"\"}}\"\n"
        );

        let parsed = parse_compute_csv(csv.as_bytes(), at());
        assert_eq!(parsed.rejected, 0);
        assert_eq!(parsed.rows.len(), 1);

        let row = &parsed.rows[0];
        assert_eq!(row.provider, Set("aws".to_string()));
        assert_eq!(row.vcpu, Set(2));
        assert_eq!(row.hourly_usd, Set(0.107));
        assert_eq!(row.service_details, Set(json!({"instanceType": "m5.large"})));
        assert_eq!(row.collected_at, Set(at()));
        assert_eq!(row.id, NotSet);
    }

    #[test]
    fn test_bad_compute_rows_are_counted() {
        let csv = format!(
            "{COMPUTE_HEADER}\n\
             oracle,X,vm,r,2,8,0.1,{{}}\n\
             aws,Y,m5.large,eu-west-1,0,8,0.1,{{}}\n\
             aws,Z,m5.large,eu-west-1,two,8,0.1,{{}}\n\
             gcp,W,n2,europe-west1,2,8,-1,{{}}\n\
             azure,V,D2s,westeurope,2,8,0.096,[1]\n\
             azure,OK,D2s_v5,westeurope,2,8,0.096,\n"
        );

        let parsed = parse_compute_csv(csv.as_bytes(), at());
        assert_eq!(parsed.rejected, 5);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].sku, Set("OK".to_string()));
        assert_eq!(parsed.rows[0].service_details, Set(json!({})));
    }

    #[test]
    fn test_storage_tier_is_checked() {
        let csv = "provider,sku,service_name,provider_region,tier,gb_month_usd,service_details\n\
                   gcp,E3FF,NEARLINE,europe-west1,OccasionalAccess,0.01,{}\n\
                   gcp,BAD,COLDLINE,europe-west1,Lukewarm,0.004,{}\n";

        let parsed = parse_storage_csv(csv.as_bytes(), at());
        assert_eq!(parsed.rejected, 1);
        assert_eq!(parsed.rows[0].tier, Set("OccasionalAccess".to_string()));
        assert_eq!(parsed.rows[0].gb_month_usd, Set(0.01));
    }

    #[test]
    fn test_details_must_be_an_object() {
        assert_eq!(details("").unwrap(), json!({}));
        assert_eq!(details(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(details("42"), Err(RowError::Details(_))));
        assert!(matches!(details("{oops"), Err(RowError::Details(_))));
    }
}

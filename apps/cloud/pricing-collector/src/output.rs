//! CSV and JSON writers for collected prices.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use domain_pricing::{ComputePrice, PriceKind, Region, StoragePrice};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// `<kind>_<region>_<UTC timestamp>.<ext>`, e.g. `compute_europe_20240611T093000Z.csv`.
pub fn default_file_name(
    kind: PriceKind,
    region: Region,
    format: OutputFormat,
    at: DateTime<Utc>,
) -> PathBuf {
    PathBuf::from(format!(
        "{}_{}_{}.{}",
        kind,
        region,
        at.format("%Y%m%dT%H%M%SZ"),
        format.extension()
    ))
}

/// Flat CSV projection of a price. `service_details` becomes one JSON column.
pub trait CsvRow {
    type Row: Serialize;

    fn to_row(self) -> Result<Self::Row, serde_json::Error>;
}

#[derive(Debug, Serialize)]
pub struct ComputeRow<'a> {
    provider: String,
    sku: &'a str,
    service_name: &'a str,
    provider_region: &'a str,
    vcpu: u32,
    ram_gib: f64,
    hourly_usd: f64,
    service_details: String,
}

#[derive(Debug, Serialize)]
pub struct StorageRow<'a> {
    provider: String,
    sku: &'a str,
    service_name: &'a str,
    provider_region: &'a str,
    tier: String,
    gb_month_usd: f64,
    service_details: String,
}

impl<'a> CsvRow for &'a ComputePrice {
    type Row = ComputeRow<'a>;

    fn to_row(self) -> Result<Self::Row, serde_json::Error> {
        Ok(ComputeRow {
            provider: self.provider.to_string(),
            sku: &self.sku,
            service_name: &self.service_name,
            provider_region: &self.provider_region,
            vcpu: self.vcpu,
            ram_gib: self.ram_gib,
            hourly_usd: self.hourly_usd,
            service_details: serde_json::to_string(&self.service_details)?,
        })
    }
}

impl<'a> CsvRow for &'a StoragePrice {
    type Row = StorageRow<'a>;

    fn to_row(self) -> Result<Self::Row, serde_json::Error> {
        Ok(StorageRow {
            provider: self.provider.to_string(),
            sku: &self.sku,
            service_name: &self.service_name,
            provider_region: &self.provider_region,
            tier: self.tier.to_string(),
            gb_month_usd: self.gb_month_usd,
            service_details: serde_json::to_string(&self.service_details)?,
        })
    }
}

/// Writes a header plus one CSV row per price. An empty slice writes nothing.
pub fn write_csv<'a, P, W>(prices: &'a [P], writer: W) -> eyre::Result<()>
where
    &'a P: CsvRow,
    W: Write,
{
    let mut csv = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    if prices.is_empty() {
        // serde-driven headers are only emitted with the first record
        return Ok(csv.flush()?);
    }

    for price in prices {
        csv.serialize(price.to_row()?)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, W: Write>(prices: &[T], mut writer: W) -> eyre::Result<()> {
    serde_json::to_writer_pretty(&mut writer, prices)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_prices<'a, P>(prices: &'a [P], format: OutputFormat, path: &Path) -> eyre::Result<()>
where
    &'a P: CsvRow,
    P: Serialize,
{
    let file = File::create(path)
        .map_err(|e| eyre::eyre!("Cannot create {}: {}", path.display(), e))?;
    let writer = io::BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_csv(prices, writer),
        OutputFormat::Json => write_json(prices, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain_pricing::{CloudProvider, StorageTier};
    use serde_json::{Map, json};

    fn compute_price() -> ComputePrice {
        let mut details = Map::new();
        details.insert("instanceType".to_string(), json!("m5.large"));
        ComputePrice {
            provider: CloudProvider::Aws,
            sku: "ABC123".to_string(),
            service_name: "m5.large".to_string(),
            provider_region: "eu-west-1".to_string(),
            vcpu: 2,
            ram_gib: 8.0,
            hourly_usd: 0.107,
            service_details: details,
        }
    }

    #[test]
    fn test_default_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 6, 11, 9, 30, 0).unwrap();
        let name = default_file_name(PriceKind::Compute, Region::NorthAmerica, OutputFormat::Csv, at);
        assert_eq!(name, PathBuf::from("compute_north-america_20240611T093000Z.csv"));

        let name = default_file_name(PriceKind::Storage, Region::All, OutputFormat::Json, at);
        assert_eq!(name, PathBuf::from("storage_all_20240611T093000Z.json"));
    }

    #[test]
    fn test_compute_csv_has_details_column() {
        let mut out = Vec::new();
        write_csv(&[compute_price()], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "provider,sku,service_name,provider_region,vcpu,ram_gib,hourly_usd,service_details"
        );
        assert_eq!(
            lines.next().unwrap(),
            r#"aws,ABC123,m5.large,eu-west-1,2,8.0,0.107,"{""instanceType"":""m5.large""}""#
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_storage_csv_row() {
        let price = StoragePrice {
            provider: CloudProvider::Gcp,
            sku: "E3FF-1234".to_string(),
            service_name: "NEARLINE".to_string(),
            provider_region: "europe-west1".to_string(),
            tier: StorageTier::OccasionalAccess,
            gb_month_usd: 0.01,
            service_details: Map::new(),
        };

        let mut out = Vec::new();
        write_csv(&[price], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("gcp,E3FF-1234,NEARLINE,europe-west1,OccasionalAccess,0.01,{}"));
    }

    #[test]
    fn test_empty_csv_is_empty() {
        let mut out = Vec::new();
        write_csv::<ComputePrice, _>(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_output_is_array() {
        let mut out = Vec::new();
        write_json(&[compute_price()], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["provider"], "aws");
        assert_eq!(value[0]["service_details"]["instanceType"], "m5.large");
    }
}

//! Pricing Collector
//!
//! Offline batch tool: runs a compute or storage comparison against every
//! configured provider and dumps the normalized prices to CSV or JSON.
//! `load` puts those CSV files into PostgreSQL for offline analysis.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_pricing::{
    CloudProvider, ComputeSpecs, PriceKind, PricingService, ProviderFactory, ProvidersConfig,
    Region, StorageSpecs, StorageTier,
};
use eyre::Result;
use tracing::info;

mod collector;
mod output;
mod store;
mod tables;

use collector::{CollectionSummary, PriceCollector};
use output::OutputFormat;
use store::{DatabaseConfig, LoadReport, PriceLoader};

#[derive(Parser)]
#[command(name = "pricing-collector")]
#[command(about = "Collect normalized cloud prices from AWS, Azure, and GCP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect on-demand compute prices
    Compute {
        /// Abstract region, e.g. europe, north-america, all
        #[arg(short, long)]
        region: Region,

        #[arg(long)]
        vcpu: u32,

        #[arg(long)]
        ram_gib: f64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file. Defaults to compute_<region>_<UTC timestamp>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Collect storage prices for one tier
    Storage {
        #[arg(short, long)]
        region: Region,

        /// Storage tier, e.g. FrequentAccess, LongTermArchive
        #[arg(short, long)]
        tier: StorageTier,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file. Defaults to storage_<region>_<UTC timestamp>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load CSV files written by `compute` and `storage` into PostgreSQL
    ///
    /// Stored rows of each loaded kind are replaced unless --append is given.
    Load {
        /// Compute price CSV file; repeatable
        #[arg(long = "compute", value_name = "FILE", required_unless_present = "storage_files")]
        compute_files: Vec<PathBuf>,

        /// Storage price CSV file; repeatable
        #[arg(long = "storage", value_name = "FILE")]
        storage_files: Vec<PathBuf>,

        /// Connection URL. Defaults to DATABASE_URL or the DB_* variables
        #[arg(long)]
        db_url: Option<String>,

        #[arg(long, default_value_t = store::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Keep stored rows and add to them
        #[arg(long)]
        append: bool,
    },

    /// Create the price tables without loading anything
    Migrate {
        #[arg(long)]
        db_url: Option<String>,
    },

    /// Print the region and tier mapping tables
    Regions {
        /// Only this provider. Defaults to all.
        #[arg(short, long)]
        provider: Option<CloudProvider>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    let (collector, summary) = match cli.command {
        Commands::Regions { provider } => {
            print!("{}", tables::render(provider));
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Migrate { db_url } => {
            let db = store::connect(&DatabaseConfig::load(db_url)?).await?;
            store::apply_schema(&db).await?;
            db.close().await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Load {
            compute_files,
            storage_files,
            db_url,
            batch_size,
            append,
        } => {
            let files = load_plan(compute_files, storage_files);
            return load(files, DatabaseConfig::load(db_url)?, batch_size, append).await;
        }
        Commands::Compute {
            region,
            vcpu,
            ram_gib,
            format,
            output,
        } => {
            let collector = build_collector(format).await?;
            let summary = collector
                .collect_compute(region, ComputeSpecs { vcpu, ram_gib }, output)
                .await;
            (collector, summary)
        }
        Commands::Storage {
            region,
            tier,
            format,
            output,
        } => {
            let collector = build_collector(format).await?;
            let summary = collector
                .collect_storage(region, StorageSpecs { tier }, output)
                .await;
            (collector, summary)
        }
    };

    collector.close().await;
    let summary = summary?;
    report(&summary);

    if summary.all_failed() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn build_collector(format: OutputFormat) -> Result<PriceCollector> {
    let config = ProvidersConfig::from_env()?;
    let factory = ProviderFactory::from_config(&config).await;
    let service = PricingService::new(factory).with_deadline(config.deadline);
    Ok(PriceCollector::new(service, format))
}

/// Input files tagged with the table they go to, compute first.
fn load_plan(compute: Vec<PathBuf>, storage: Vec<PathBuf>) -> Vec<(PriceKind, PathBuf)> {
    compute
        .into_iter()
        .map(|path| (PriceKind::Compute, path))
        .chain(storage.into_iter().map(|path| (PriceKind::Storage, path)))
        .collect()
}

async fn load(
    files: Vec<(PriceKind, PathBuf)>,
    config: DatabaseConfig,
    batch_size: usize,
    append: bool,
) -> Result<ExitCode> {
    let db = store::connect(&config).await?;
    store::apply_schema(&db).await?;
    let loader = PriceLoader::new(db, batch_size);

    if !append {
        for kind in [PriceKind::Compute, PriceKind::Storage] {
            if files.iter().any(|(k, _)| *k == kind) {
                loader.clear(kind).await?;
            }
        }
    }

    let reports = loader.load_files(&files).await;
    loader.close().await?;
    report_loads(&reports);

    if reports.iter().all(LoadReport::failed) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn report_loads(reports: &[LoadReport]) {
    let inserted: u64 = reports.iter().map(|r| r.inserted).sum();
    info!(files = reports.len(), inserted, "Load complete");

    for report in reports {
        match &report.error {
            Some(error) => eprintln!("{} {}: failed: {}", report.kind, report.path.display(), error),
            None => eprintln!(
                "{} {}: {} rows inserted, {} rejected",
                report.kind,
                report.path.display(),
                report.inserted,
                report.rejected
            ),
        }
    }
}

fn report(summary: &CollectionSummary) {
    info!(
        kind = %summary.kind,
        region = %summary.region,
        prices = summary.prices_written,
        errors = summary.errors.len(),
        output = %summary.output.display(),
        "Collection complete"
    );

    eprintln!(
        "{} {}: {} prices from {} providers written to {}",
        summary.kind,
        summary.region,
        summary.prices_written,
        summary.providers,
        summary.output.display()
    );
    for error in &summary.errors {
        eprintln!("  {}: {}", error.provider, error.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_requires_a_file() {
        assert!(Cli::try_parse_from(["pricing-collector", "load"]).is_err());

        let cli = Cli::try_parse_from([
            "pricing-collector",
            "load",
            "--storage",
            "s.csv",
            "--compute",
            "a.csv",
            "--compute",
            "b.csv",
            "--append",
        ])
        .unwrap();
        let Commands::Load {
            compute_files,
            storage_files,
            batch_size,
            append,
            ..
        } = cli.command
        else {
            panic!("expected load");
        };

        assert!(append);
        assert_eq!(batch_size, store::DEFAULT_BATCH_SIZE);
        let plan = load_plan(compute_files, storage_files);
        assert_eq!(
            plan,
            [
                (PriceKind::Compute, PathBuf::from("a.csv")),
                (PriceKind::Compute, PathBuf::from("b.csv")),
                (PriceKind::Storage, PathBuf::from("s.csv")),
            ]
        );
    }
}

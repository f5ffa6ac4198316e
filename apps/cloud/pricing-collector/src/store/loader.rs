//! Batched CSV loading into the price tables.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use domain_pricing::PriceKind;
use futures::future::join_all;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::entity::{compute_price, storage_price};
use super::rows::{ParsedRows, parse_compute_csv, parse_storage_csv};

pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Outcome for one input file
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub path: PathBuf,
    pub kind: String,
    pub inserted: u64,
    pub rejected: usize,
    pub error: Option<String>,
}

impl LoadReport {
    fn new(kind: PriceKind, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: kind.to_string(),
            inserted: 0,
            rejected: 0,
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

pub struct PriceLoader {
    db: DatabaseConnection,
    batch_size: usize,
}

impl PriceLoader {
    pub fn new(db: DatabaseConnection, batch_size: usize) -> Self {
        Self {
            db,
            batch_size: batch_size.max(1),
        }
    }

    /// Deletes every stored row of `kind`, returning how many went.
    pub async fn clear(&self, kind: PriceKind) -> Result<u64, DbErr> {
        let result = match kind {
            PriceKind::Compute => compute_price::Entity::delete_many().exec(&self.db).await?,
            PriceKind::Storage => storage_price::Entity::delete_many().exec(&self.db).await?,
        };
        info!(%kind, rows = result.rows_affected, "Cleared stored prices");
        Ok(result.rows_affected)
    }

    /// Loads all files concurrently. A file that cannot be read is reported
    /// and does not stop the others.
    pub async fn load_files(&self, files: &[(PriceKind, PathBuf)]) -> Vec<LoadReport> {
        join_all(files.iter().map(|(kind, path)| self.load_file(*kind, path))).await
    }

    pub async fn load_file(&self, kind: PriceKind, path: &Path) -> LoadReport {
        let mut report = LoadReport::new(kind, path);
        let collected_at = Utc::now().fixed_offset();

        let outcome = match kind {
            PriceKind::Compute => self.load_csv(path, collected_at, parse_compute_csv::<File>).await,
            PriceKind::Storage => self.load_csv(path, collected_at, parse_storage_csv::<File>).await,
        };

        match outcome {
            Ok((inserted, rejected)) => {
                info!(%kind, path = %path.display(), inserted, rejected, "Loaded price file");
                report.inserted = inserted;
                report.rejected = rejected;
            }
            Err(e) => {
                warn!(%kind, path = %path.display(), error = %e, "Failed to load price file");
                report.error = Some(e.to_string());
            }
        }

        report
    }

    pub async fn close(self) -> Result<(), DbErr> {
        self.db.close().await
    }

    async fn load_csv<A>(
        &self,
        path: &Path,
        collected_at: DateTimeWithTimeZone,
        parse: fn(File, DateTimeWithTimeZone) -> ParsedRows<A>,
    ) -> eyre::Result<(u64, usize)>
    where
        A: ActiveModelTrait + Clone + Send + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let file = File::open(path).map_err(|e| eyre::eyre!("Cannot open {}: {}", path.display(), e))?;
        let parsed = tokio::task::spawn_blocking(move || parse(file, collected_at)).await?;

        let inserted = self.insert_rows(parsed.rows).await;
        Ok((inserted, parsed.rejected))
    }

    /// Inserts in batches of `batch_size`; returns the number of rows stored.
    async fn insert_rows<A>(&self, rows: Vec<A>) -> u64
    where
        A: ActiveModelTrait + Clone + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let mut inserted = 0;
        let mut rows = rows.into_iter().peekable();

        while rows.peek().is_some() {
            let batch: Vec<A> = rows.by_ref().take(self.batch_size).collect();
            inserted += self.insert_batch(batch).await;
        }

        inserted
    }

    /// A batch the database rejects is retried row by row so one bad row
    /// only costs itself.
    async fn insert_batch<A>(&self, batch: Vec<A>) -> u64
    where
        A: ActiveModelTrait + Clone + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let size = batch.len();
        match <A::Entity as EntityTrait>::insert_many(batch.clone())
            .exec_without_returning(&self.db)
            .await
        {
            Ok(rows) => {
                debug!(rows, "Inserted batch");
                rows
            }
            Err(e) => {
                warn!(rows = size, error = %e, "Batch insert failed, inserting rows one by one");
                let mut inserted = 0;
                for row in batch {
                    match <A::Entity as EntityTrait>::insert(row)
                        .exec_without_returning(&self.db)
                        .await
                    {
                        Ok(rows) => inserted += rows,
                        Err(e) => warn!(error = %e, "Dropping row the database rejected"),
                    }
                }
                inserted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COMPUTE_HEADER: &str =
        "provider,sku,service_name,provider_region,vcpu,ram_gib,hourly_usd,service_details";

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn compute_csv(rows: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{COMPUTE_HEADER}").unwrap();
        for i in 0..rows {
            writeln!(file, "aws,SKU{i},m5.large,eu-west-1,2,8,0.096,{{}}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_rows_are_inserted_in_batches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(2), exec(2), exec(1)])
            .into_connection();
        let loader = PriceLoader::new(db, 2);
        let csv = compute_csv(5);

        let report = loader.load_file(PriceKind::Compute, csv.path()).await;

        assert!(!report.failed());
        assert_eq!(report.inserted, 5);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.kind, "compute");
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_single_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("duplicate key".to_string())])
            .append_exec_results([exec(1), exec(1), exec(1)])
            .into_connection();
        let loader = PriceLoader::new(db, 10);
        let csv = compute_csv(3);

        let report = loader.load_file(PriceKind::Compute, csv.path()).await;

        assert_eq!(report.inserted, 3);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_not_fatal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .into_connection();
        let loader = PriceLoader::new(db, 10);
        let present = compute_csv(1);

        let reports = loader
            .load_files(&[
                (PriceKind::Storage, PathBuf::from("/nonexistent/storage.csv")),
                (PriceKind::Compute, present.path().to_path_buf()),
            ])
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports[0].failed());
        assert!(reports[0].error.as_deref().unwrap().contains("/nonexistent/storage.csv"));
        assert_eq!(reports[1].inserted, 1);
    }

    #[tokio::test]
    async fn test_clear_reports_deleted_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(42)])
            .into_connection();
        let loader = PriceLoader::new(db, 10);

        assert_eq!(loader.clear(PriceKind::Storage).await.unwrap(), 42);
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert_eq!(PriceLoader::new(db, 0).batch_size, 1);
    }
}

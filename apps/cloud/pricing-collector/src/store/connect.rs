use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use super::config::DatabaseConfig;
use super::migration::Migrator;

/// Exponential backoff between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Runs `operation` until it succeeds or `policy.attempts` is used up,
/// doubling the delay after every failure. The last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, policy: RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                warn!(attempts, error = %e, "Giving up after repeated failures");
                return Err(e);
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, retry_in = ?delay, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
        }
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let options = config.connect_options();
    let db = retry_with_backoff(|| Database::connect(options.clone()), config.retry).await?;
    info!("Connected to PostgreSQL");
    Ok(db)
}

/// Creates the price tables and indexes if they are missing.
pub async fn apply_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("Applying price table migrations");
    Migrator::up(db, None).await?;
    info!("Price tables are up to date");
    Ok(())
}

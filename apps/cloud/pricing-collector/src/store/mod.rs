//! PostgreSQL persistence for collected prices.
//!
//! `load` reads CSV files written by `compute`/`storage` back in and
//! bulk-inserts them. The schema is created through sea-orm migrations
//! before anything is written.

mod config;
mod connect;
pub mod entity;
mod loader;
mod migration;
mod rows;

pub use config::DatabaseConfig;
pub use connect::{apply_schema, connect};
pub use loader::{DEFAULT_BATCH_SIZE, LoadReport, PriceLoader};

//! Pricing Domain
//!
//! Compares on-demand compute and storage prices across AWS, Azure and GCP.
//! Each provider client turns an abstract region and resource shape into vendor
//! queries, normalizes the answers into one schema, and the service merges
//! the per-provider outcomes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← POST /compute, /storage; 400/404/500 mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Concurrent fan-out, failure isolation, merge
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Factory   │  ← Builds the active provider clients from config
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Providers  │  ← AWS / Azure / GCP clients (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Mapping   │  ← Region and tier tables per provider
//! └─────────────┘
//! ```

pub mod config;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod mapping;
pub mod models;
pub mod providers;
pub mod service;

// Re-export commonly used types
pub use config::ProvidersConfig;
pub use error::{PriceKind, PricingError, PricingResult};
pub use factory::ProviderFactory;
pub use handlers::{ApiDoc, router};
pub use models::{
    CloudProvider, ComputePrice, ComputePricingRequest, ComputePricingResponse, ComputeSpecs,
    ProviderError, ProviderResult, Region, StoragePrice, StoragePricingRequest,
    StoragePricingResponse, StorageSpecs, StorageTier,
};
pub use providers::PricingProvider;
pub use service::PricingService;

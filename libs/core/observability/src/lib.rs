//! Metrics for the cloud pricing services.
//!
//! - Prometheus recorder installation and the `/metrics` handler
//! - [`PricingMetrics`] for the provider fan-out
//! - [`middleware::metrics_middleware`] for per-route HTTP metrics
//!
//! Without an installed recorder every metric call is a no-op, so library
//! code and tests can record unconditionally.
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, PricingMetrics};
//!
//! init_metrics()?;
//! PricingMetrics::record_provider_call("aws", "compute", "success", 1.2, 4);
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod pricing;

pub use pricing::{PricingMetrics, PricingTimer};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process.
///
/// Later calls return the existing handle.
///
/// # Errors
/// Fails if another global recorder was installed outside this function.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Pricing fan-out metrics
    describe_counter!(
        "pricing_provider_calls_total",
        "Provider pricing calls by provider, operation and outcome"
    );
    describe_histogram!(
        "pricing_provider_call_duration_seconds",
        "Provider pricing call duration in seconds"
    );
    describe_counter!(
        "pricing_results_total",
        "Normalized price records returned, by provider and operation"
    );
    describe_counter!(
        "pricing_comparisons_total",
        "Aggregated comparison requests by operation"
    );
    describe_histogram!(
        "pricing_comparison_duration_seconds",
        "End-to-end comparison duration in seconds"
    );
    describe_counter!(
        "pricing_records_skipped_total",
        "Vendor records skipped during normalization"
    );
}

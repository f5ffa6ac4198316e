//! Metrics for the provider fan-out.

use metrics::{counter, histogram};
use std::time::Instant;

/// Pricing metrics recorder
pub struct PricingMetrics;

impl PricingMetrics {
    /// Record one provider call. `outcome` is `success`, `provider_error` or `unexpected`.
    pub fn record_provider_call(
        provider: &str,
        operation: &str,
        outcome: &str,
        duration_secs: f64,
        results: usize,
    ) {
        counter!(
            "pricing_provider_calls_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);

        histogram!(
            "pricing_provider_call_duration_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(duration_secs);

        if results > 0 {
            counter!(
                "pricing_results_total",
                "provider" => provider.to_string(),
                "operation" => operation.to_string()
            )
            .increment(results as u64);
        }

        tracing::debug!(
            provider = provider,
            operation = operation,
            outcome = outcome,
            results = results,
            duration_secs = duration_secs,
            "Provider call finished"
        );
    }

    /// Record one aggregated comparison.
    pub fn record_comparison(
        operation: &str,
        providers: usize,
        results: usize,
        errors: usize,
        duration_secs: f64,
    ) {
        counter!("pricing_comparisons_total", "operation" => operation.to_string()).increment(1);
        histogram!(
            "pricing_comparison_duration_seconds",
            "operation" => operation.to_string()
        )
        .record(duration_secs);

        tracing::info!(
            operation = operation,
            providers = providers,
            results = results,
            errors = errors,
            duration_secs = duration_secs,
            "Comparison finished"
        );
    }

    /// Record vendor records dropped during normalization (mismatch, missing price, bad unit).
    pub fn record_skipped_records(provider: &str, operation: &str, skipped: usize) {
        if skipped == 0 {
            return;
        }
        counter!(
            "pricing_records_skipped_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(skipped as u64);
    }
}

/// Wall-clock timer for a provider call or a whole comparison.
pub struct PricingTimer {
    start: Instant,
}

impl PricingTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        PricingMetrics::record_provider_call("aws", "compute", "success", 0.5, 3);
        PricingMetrics::record_skipped_records("aws", "compute", 0);
        PricingMetrics::record_comparison("storage", 0, 0, 0, 0.0);
    }

    #[test]
    fn test_timer_is_monotonic() {
        let timer = PricingTimer::start();
        let first = timer.elapsed_secs();
        let second = timer.elapsed_secs();
        assert!(second >= first);
    }
}

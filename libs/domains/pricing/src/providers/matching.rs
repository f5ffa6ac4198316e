//! Post-hoc matching rules shared by the provider clients.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ComputeSpecs;

/// Allowed RAM difference between a catalog entry and the request.
pub const RAM_TOLERANCE_GIB: f64 = 0.1;

// Absorbs float noise such as 8.1 - 8.0 = 0.0999999...
const EPSILON: f64 = 1e-9;

static GIB: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.,]+)\s*GiB").expect("valid GiB pattern"));

/// Parses sizes such as `"8 GiB"` or `"1,952 GiB"`.
pub fn parse_gib(text: &str) -> Option<f64> {
    let captures = GIB.captures(text)?;
    captures[1].replace(',', "").parse().ok()
}

pub fn ram_matches(requested: f64, actual: f64) -> bool {
    (requested - actual).abs() <= RAM_TOLERANCE_GIB + EPSILON
}

pub fn compute_matches(specs: &ComputeSpecs, vcpu: u32, ram_gib: f64) -> bool {
    specs.vcpu == vcpu && ram_matches(specs.ram_gib, ram_gib)
}

/// Storage units billed per GB-month, e.g. AWS `GB-Mo` or Azure `1 GB/Month`.
pub fn is_gb_month_unit(unit: &str) -> bool {
    let normalized: String = unit
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let normalized = normalized.trim_start_matches('1');
    matches!(normalized, "gbmo" | "gbmonth" | "gibmonth" | "gibymo")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gib() {
        assert_eq!(parse_gib("8 GiB"), Some(8.0));
        assert_eq!(parse_gib("0.5 GiB"), Some(0.5));
        assert_eq!(parse_gib("1,952 GiB"), Some(1952.0));
        assert_eq!(parse_gib("8GiB"), Some(8.0));
        assert_eq!(parse_gib("NA"), None);
        assert_eq!(parse_gib("8 GB"), None);
    }

    #[test]
    fn test_ram_tolerance() {
        assert!(ram_matches(8.05, 8.0));
        assert!(ram_matches(8.1, 8.0));
        assert!(!ram_matches(8.2, 8.0));
        assert!(!ram_matches(7.85, 8.0));
    }

    #[test]
    fn test_compute_matches_requires_exact_vcpu() {
        let specs = ComputeSpecs { vcpu: 2, ram_gib: 8.0 };
        assert!(compute_matches(&specs, 2, 8.0));
        assert!(!compute_matches(&specs, 4, 8.0));
    }

    #[test]
    fn test_gb_month_units() {
        assert!(is_gb_month_unit("GB-Mo"));
        assert!(is_gb_month_unit("gb-month"));
        assert!(is_gb_month_unit("1 GB/Month"));
        assert!(is_gb_month_unit("GiBy.mo"));
        assert!(!is_gb_month_unit("Requests"));
        assert!(!is_gb_month_unit("1 Hour"));
    }
}

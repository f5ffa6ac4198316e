//! Text rendering of the region and tier mapping tables.

use std::fmt::Write;

use domain_pricing::mapping;
use domain_pricing::{CloudProvider, Region, StorageTier};
use strum::IntoEnumIterator;

/// Renders the tables of `provider`, or of every provider when `None`.
pub fn render(provider: Option<CloudProvider>) -> String {
    let mut out = String::new();

    for provider in CloudProvider::iter().filter(|p| provider.is_none_or(|only| only == *p)) {
        let (regions, tiers) = mapping::for_provider(provider);

        let _ = writeln!(out, "{} (regions {}, tiers {})", provider, regions.version(), tiers.version());
        for geography in Region::GEOGRAPHIES {
            let concrete = regions.geography(geography);
            if concrete.is_empty() {
                continue;
            }
            let _ = writeln!(out, "  {}", geography);
            for region in concrete {
                let _ = writeln!(out, "    {:<24} {}", region.code, region.display_name);
            }
        }

        let _ = writeln!(out, "  tiers");
        for tier in StorageTier::iter() {
            let classes = tiers.classes(tier);
            let listed = if classes.is_empty() {
                "-".to_string()
            } else {
                classes.join(", ")
            };
            let _ = writeln!(out, "    {:<24} {}", tier.to_string(), listed);
        }
    }

    out
}

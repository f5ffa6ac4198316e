//! AWS regions keyed by their Pricing API `location` attribute, and S3
//! `volumeType` values per storage tier.

use super::{ProviderRegion, RegionTable, TierTable};
use crate::models::{Region, StorageTier};

pub const REGION_TABLE_VERSION: &str = "aws-2024.06";

static REGIONS: RegionTable = RegionTable::new(
    REGION_TABLE_VERSION,
    &[
        (
            Region::NorthAmerica,
            &[
                ProviderRegion::new("us-east-1", "US East (N. Virginia)"),
                ProviderRegion::new("us-east-2", "US East (Ohio)"),
                ProviderRegion::new("us-west-1", "US West (N. California)"),
                ProviderRegion::new("us-west-2", "US West (Oregon)"),
                ProviderRegion::new("ca-central-1", "Canada (Central)"),
                ProviderRegion::new("ca-west-1", "Canada West (Calgary)"),
                ProviderRegion::new("mx-central-1", "Mexico (Central)"),
            ],
        ),
        (
            Region::SouthAmerica,
            &[ProviderRegion::new("sa-east-1", "South America (Sao Paulo)")],
        ),
        (
            Region::Europe,
            &[
                ProviderRegion::new("eu-central-1", "EU (Frankfurt)"),
                ProviderRegion::new("eu-central-2", "EU (Zurich)"),
                ProviderRegion::new("eu-west-1", "EU (Ireland)"),
                ProviderRegion::new("eu-west-2", "EU (London)"),
                ProviderRegion::new("eu-west-3", "EU (Paris)"),
                ProviderRegion::new("eu-south-1", "EU (Milan)"),
                ProviderRegion::new("eu-south-2", "EU (Spain)"),
                ProviderRegion::new("eu-north-1", "EU (Stockholm)"),
            ],
        ),
        (
            Region::Asia,
            &[
                ProviderRegion::new("ap-east-1", "Asia Pacific (Hong Kong)"),
                ProviderRegion::new("ap-south-1", "Asia Pacific (Mumbai)"),
                ProviderRegion::new("ap-south-2", "Asia Pacific (Hyderabad)"),
                ProviderRegion::new("ap-northeast-1", "Asia Pacific (Tokyo)"),
                ProviderRegion::new("ap-northeast-2", "Asia Pacific (Seoul)"),
                ProviderRegion::new("ap-northeast-3", "Asia Pacific (Osaka)"),
                ProviderRegion::new("ap-southeast-1", "Asia Pacific (Singapore)"),
                ProviderRegion::new("ap-southeast-3", "Asia Pacific (Jakarta)"),
                ProviderRegion::new("ap-southeast-5", "Asia Pacific (Malaysia)"),
                ProviderRegion::new("ap-southeast-7", "Asia Pacific (Thailand)"),
                ProviderRegion::new("il-central-1", "Israel (Tel Aviv)"),
                ProviderRegion::new("me-south-1", "Middle East (Bahrain)"),
                ProviderRegion::new("me-central-1", "Middle East (UAE)"),
            ],
        ),
        (
            Region::Africa,
            &[ProviderRegion::new("af-south-1", "Africa (Cape Town)")],
        ),
        // Sydney and Melbourne are listed here only, so ALL never queries them twice.
        (
            Region::Oceania,
            &[
                ProviderRegion::new("ap-southeast-2", "Asia Pacific (Sydney)"),
                ProviderRegion::new("ap-southeast-4", "Asia Pacific (Melbourne)"),
            ],
        ),
        (Region::Antarctica, &[]),
        (Region::MultiRegion, &[]),
    ],
);

static TIERS: TierTable = TierTable::new(
    REGION_TABLE_VERSION,
    &[
        (
            StorageTier::Smart,
            &[
                "Intelligent-Tiering Frequent Access",
                "Intelligent-Tiering Infrequent Access",
                "Intelligent-Tiering Archive Instant Access",
            ],
        ),
        (StorageTier::FrequentAccess, &["Standard"]),
        (
            StorageTier::OccasionalAccess,
            &["Standard - Infrequent Access", "One Zone - Infrequent Access"],
        ),
        (StorageTier::RareAccess, &["Glacier Instant Retrieval"]),
        (StorageTier::ShortTermArchive, &["Amazon Glacier"]),
        (StorageTier::LongTermArchive, &["Glacier Deep Archive"]),
    ],
);

pub fn region_table() -> &'static RegionTable {
    &REGIONS
}

pub fn tier_table() -> &'static TierTable {
    &TIERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oceania_regions_are_not_in_asia() {
        let asia = region_table().regions(Region::Asia);
        assert!(asia.iter().all(|r| r.code != "ap-southeast-2"));
        assert_eq!(
            region_table().find("ap-southeast-2").map(|(r, _)| r),
            Some(Region::Oceania)
        );
    }

    #[test]
    fn test_ireland_location_name() {
        let (_, ireland) = region_table().find("eu-west-1").unwrap();
        assert_eq!(ireland.display_name, "EU (Ireland)");
    }

    #[test]
    fn test_deep_archive_class() {
        assert_eq!(
            tier_table().classes(StorageTier::LongTermArchive),
            ["Glacier Deep Archive"]
        );
    }
}

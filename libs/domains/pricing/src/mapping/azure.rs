//! Azure `armRegionName` codes and blob `skuName` values per storage tier.

use super::{ProviderRegion, RegionTable, TierTable};
use crate::models::{Region, StorageTier};

pub const REGION_TABLE_VERSION: &str = "azure-2024.06";

static REGIONS: RegionTable = RegionTable::new(
    REGION_TABLE_VERSION,
    &[
        (
            Region::NorthAmerica,
            &[
                ProviderRegion::new("eastus", "East US"),
                ProviderRegion::new("eastus2", "East US 2"),
                ProviderRegion::new("centralus", "Central US"),
                ProviderRegion::new("northcentralus", "North Central US"),
                ProviderRegion::new("southcentralus", "South Central US"),
                ProviderRegion::new("westus", "West US"),
                ProviderRegion::new("westus2", "West US 2"),
                ProviderRegion::new("westus3", "West US 3"),
                ProviderRegion::new("westcentralus", "West Central US"),
                ProviderRegion::new("mexicocentral", "Mexico Central"),
                ProviderRegion::new("canadacentral", "Canada Central"),
                ProviderRegion::new("canadaeast", "Canada East"),
            ],
        ),
        (
            Region::SouthAmerica,
            &[
                ProviderRegion::new("brazilsouth", "Brazil South"),
                ProviderRegion::new("brazilsoutheast", "Brazil Southeast"),
                ProviderRegion::new("chilecentral", "Chile Central"),
            ],
        ),
        (
            Region::Europe,
            &[
                ProviderRegion::new("westeurope", "West Europe"),
                ProviderRegion::new("northeurope", "North Europe"),
                ProviderRegion::new("uksouth", "UK South"),
                ProviderRegion::new("ukwest", "UK West"),
                ProviderRegion::new("francecentral", "France Central"),
                ProviderRegion::new("francesouth", "France South"),
                ProviderRegion::new("swedencentral", "Sweden Central"),
                ProviderRegion::new("germanywestcentral", "Germany West Central"),
                ProviderRegion::new("germanynorth", "Germany North"),
                ProviderRegion::new("switzerlandnorth", "Switzerland North"),
                ProviderRegion::new("switzerlandwest", "Switzerland West"),
                ProviderRegion::new("norwayeast", "Norway East"),
                ProviderRegion::new("norwaywest", "Norway West"),
                ProviderRegion::new("italynorth", "Italy North"),
                ProviderRegion::new("spaincentral", "Spain Central"),
                ProviderRegion::new("polandcentral", "Poland Central"),
            ],
        ),
        (
            Region::Asia,
            &[
                ProviderRegion::new("eastasia", "East Asia"),
                ProviderRegion::new("southeastasia", "Southeast Asia"),
                ProviderRegion::new("japaneast", "Japan East"),
                ProviderRegion::new("japanwest", "Japan West"),
                ProviderRegion::new("koreacentral", "Korea Central"),
                ProviderRegion::new("koreasouth", "Korea South"),
                ProviderRegion::new("centralindia", "Central India"),
                ProviderRegion::new("southindia", "South India"),
                ProviderRegion::new("westindia", "West India"),
                ProviderRegion::new("jioindiacentral", "Jio India Central"),
                ProviderRegion::new("jioindiawest", "Jio India West"),
                ProviderRegion::new("indonesiacentral", "Indonesia Central"),
                ProviderRegion::new("malaysiawest", "Malaysia West"),
                ProviderRegion::new("uaecentral", "UAE Central"),
                ProviderRegion::new("uaenorth", "UAE North"),
                ProviderRegion::new("qatarcentral", "Qatar Central"),
                ProviderRegion::new("israelcentral", "Israel Central"),
            ],
        ),
        (
            Region::Africa,
            &[
                ProviderRegion::new("southafricanorth", "South Africa North"),
                ProviderRegion::new("southafricawest", "South Africa West"),
            ],
        ),
        (
            Region::Oceania,
            &[
                ProviderRegion::new("australiaeast", "Australia East"),
                ProviderRegion::new("australiasoutheast", "Australia Southeast"),
                ProviderRegion::new("australiacentral", "Australia Central"),
                ProviderRegion::new("australiacentral2", "Australia Central 2"),
                ProviderRegion::new("newzealandnorth", "New Zealand North"),
            ],
        ),
        (Region::Antarctica, &[]),
        (Region::MultiRegion, &[]),
    ],
);

// Azure has no auto-tiering blob class and Archive is its only archive tier.
static TIERS: TierTable = TierTable::new(
    REGION_TABLE_VERSION,
    &[
        (StorageTier::Smart, &[]),
        (StorageTier::FrequentAccess, &["Hot LRS", "Premium LRS"]),
        (StorageTier::OccasionalAccess, &["Cool LRS"]),
        (StorageTier::RareAccess, &["Cold LRS"]),
        (StorageTier::ShortTermArchive, &["Archive LRS"]),
        (StorageTier::LongTermArchive, &[]),
    ],
);

pub fn region_table() -> &'static RegionTable {
    &REGIONS
}

pub fn tier_table() -> &'static TierTable {
    &TIERS
}

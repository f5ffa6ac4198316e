//! GCP regions as they appear in Cloud Billing `serviceRegions`, Cloud
//! Storage classes per tier, and the predefined machine-family catalog used to
//! synthesize compute prices from per-core and per-GiB rates.

use super::{ProviderRegion, RegionTable, TierTable};
use crate::models::{Region, StorageTier};

pub const REGION_TABLE_VERSION: &str = "gcp-2024.06";

static REGIONS: RegionTable = RegionTable::new(
    REGION_TABLE_VERSION,
    &[
        (
            Region::NorthAmerica,
            &[
                ProviderRegion::new("us-central1", "Iowa"),
                ProviderRegion::new("us-east1", "South Carolina"),
                ProviderRegion::new("us-east4", "Northern Virginia"),
                ProviderRegion::new("us-east5", "Columbus"),
                ProviderRegion::new("us-south1", "Dallas"),
                ProviderRegion::new("us-west1", "Oregon"),
                ProviderRegion::new("us-west2", "Los Angeles"),
                ProviderRegion::new("us-west3", "Salt Lake City"),
                ProviderRegion::new("us-west4", "Las Vegas"),
                ProviderRegion::new("northamerica-northeast1", "Montreal"),
                ProviderRegion::new("northamerica-northeast2", "Toronto"),
                ProviderRegion::new("northamerica-south1", "Queretaro"),
            ],
        ),
        (
            Region::SouthAmerica,
            &[
                ProviderRegion::new("southamerica-east1", "Sao Paulo"),
                ProviderRegion::new("southamerica-west1", "Santiago"),
            ],
        ),
        (
            Region::Europe,
            &[
                ProviderRegion::new("europe-west1", "Belgium"),
                ProviderRegion::new("europe-west2", "London"),
                ProviderRegion::new("europe-west3", "Frankfurt"),
                ProviderRegion::new("europe-west4", "Netherlands"),
                ProviderRegion::new("europe-west6", "Zurich"),
                ProviderRegion::new("europe-west8", "Milan"),
                ProviderRegion::new("europe-west9", "Paris"),
                ProviderRegion::new("europe-west10", "Berlin"),
                ProviderRegion::new("europe-west12", "Turin"),
                ProviderRegion::new("europe-north1", "Finland"),
                ProviderRegion::new("europe-central2", "Warsaw"),
                ProviderRegion::new("europe-southwest1", "Madrid"),
            ],
        ),
        (
            Region::Asia,
            &[
                ProviderRegion::new("asia-east1", "Taiwan"),
                ProviderRegion::new("asia-east2", "Hong Kong"),
                ProviderRegion::new("asia-northeast1", "Tokyo"),
                ProviderRegion::new("asia-northeast2", "Osaka"),
                ProviderRegion::new("asia-northeast3", "Seoul"),
                ProviderRegion::new("asia-south1", "Mumbai"),
                ProviderRegion::new("asia-south2", "Delhi"),
                ProviderRegion::new("asia-southeast1", "Singapore"),
                ProviderRegion::new("asia-southeast2", "Jakarta"),
                ProviderRegion::new("me-central1", "Doha"),
                ProviderRegion::new("me-central2", "Dammam"),
                ProviderRegion::new("me-west1", "Tel Aviv"),
            ],
        ),
        (
            Region::Africa,
            &[ProviderRegion::new("africa-south1", "Johannesburg")],
        ),
        (
            Region::Oceania,
            &[
                ProviderRegion::new("australia-southeast1", "Sydney"),
                ProviderRegion::new("australia-southeast2", "Melbourne"),
            ],
        ),
        (Region::Antarctica, &[]),
        (
            Region::MultiRegion,
            &[
                ProviderRegion::new("us", "United States multi-region"),
                ProviderRegion::new("eu", "European Union multi-region"),
                ProviderRegion::new("asia", "Asia multi-region"),
            ],
        ),
    ],
);

// Autoclass is billed as the underlying classes, so SMART has no class of its own.
static TIERS: TierTable = TierTable::new(
    REGION_TABLE_VERSION,
    &[
        (StorageTier::Smart, &[]),
        (StorageTier::FrequentAccess, &["STANDARD"]),
        (StorageTier::OccasionalAccess, &["NEARLINE"]),
        (StorageTier::RareAccess, &["COLDLINE"]),
        (StorageTier::ShortTermArchive, &["ARCHIVE"]),
        (StorageTier::LongTermArchive, &[]),
    ],
);

pub fn region_table() -> &'static RegionTable {
    &REGIONS
}

pub fn tier_table() -> &'static TierTable {
    &TIERS
}

/// Billing catalog description prefix for a Cloud Storage class, e.g.
/// `Standard Storage Belgium`.
pub fn storage_description_prefix(class: &str) -> Option<&'static str> {
    match class {
        "STANDARD" => Some("Standard Storage"),
        "NEARLINE" => Some("Nearline Storage"),
        "COLDLINE" => Some("Coldline Storage"),
        "ARCHIVE" => Some("Archive Storage"),
        _ => None,
    }
}

/// A predefined machine shape: `<family>-<shape>-<vcpu>` with a fixed
/// GiB-per-vCPU ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineShape {
    pub name: &'static str,
    pub ram_per_vcpu: f64,
    pub vcpus: &'static [u32],
}

/// A machine family priced per vCPU-hour and per GiB-hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineFamily {
    /// Lower-case machine-type prefix, e.g. `n2`
    pub prefix: &'static str,
    /// On-demand core SKU description, followed by the region name
    pub core_description: &'static str,
    /// On-demand RAM SKU description, followed by the region name
    pub ram_description: &'static str,
    pub shapes: &'static [MachineShape],
}

impl MachineFamily {
    pub fn machine_type(&self, shape: &MachineShape, vcpu: u32) -> String {
        format!("{}-{}-{}", self.prefix, shape.name, vcpu)
    }
}

const GENERAL_VCPUS: &[u32] = &[2, 4, 8, 16, 32, 48, 64, 80, 96, 128];

pub static MACHINE_FAMILIES: &[MachineFamily] = &[
    MachineFamily {
        prefix: "e2",
        core_description: "E2 Instance Core running in",
        ram_description: "E2 Instance Ram running in",
        shapes: &[
            MachineShape { name: "standard", ram_per_vcpu: 4.0, vcpus: &[2, 4, 8, 16, 32] },
            MachineShape { name: "highmem", ram_per_vcpu: 8.0, vcpus: &[2, 4, 8, 16] },
            MachineShape { name: "highcpu", ram_per_vcpu: 1.0, vcpus: &[2, 4, 8, 16, 32] },
        ],
    },
    MachineFamily {
        prefix: "n1",
        core_description: "N1 Predefined Instance Core running in",
        ram_description: "N1 Predefined Instance Ram running in",
        shapes: &[
            MachineShape { name: "standard", ram_per_vcpu: 3.75, vcpus: &[1, 2, 4, 8, 16, 32, 64, 96] },
            MachineShape { name: "highmem", ram_per_vcpu: 6.5, vcpus: &[2, 4, 8, 16, 32, 64, 96] },
            MachineShape { name: "highcpu", ram_per_vcpu: 0.9, vcpus: &[2, 4, 8, 16, 32, 64, 96] },
        ],
    },
    MachineFamily {
        prefix: "n2",
        core_description: "N2 Instance Core running in",
        ram_description: "N2 Instance Ram running in",
        shapes: &[
            MachineShape { name: "standard", ram_per_vcpu: 4.0, vcpus: GENERAL_VCPUS },
            MachineShape { name: "highmem", ram_per_vcpu: 8.0, vcpus: GENERAL_VCPUS },
            MachineShape { name: "highcpu", ram_per_vcpu: 1.0, vcpus: GENERAL_VCPUS },
        ],
    },
    MachineFamily {
        prefix: "n2d",
        core_description: "N2D AMD Instance Core running in",
        ram_description: "N2D AMD Instance Ram running in",
        shapes: &[
            MachineShape { name: "standard", ram_per_vcpu: 4.0, vcpus: GENERAL_VCPUS },
            MachineShape { name: "highmem", ram_per_vcpu: 8.0, vcpus: GENERAL_VCPUS },
            MachineShape { name: "highcpu", ram_per_vcpu: 1.0, vcpus: GENERAL_VCPUS },
        ],
    },
    MachineFamily {
        prefix: "c2",
        core_description: "Compute optimized Core running in",
        ram_description: "Compute optimized Ram running in",
        shapes: &[MachineShape { name: "standard", ram_per_vcpu: 4.0, vcpus: &[4, 8, 16, 30, 60] }],
    },
];

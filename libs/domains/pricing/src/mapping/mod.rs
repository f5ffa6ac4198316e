//! Static lookup tables from the abstract [`Region`] and [`StorageTier`]
//! vocabulary onto each provider's concrete region codes and storage classes.
//!
//! Tables are plain `static` data. A geography or tier with no entries means
//! "not offered by this provider", which yields zero results rather than an
//! error. Each table carries a version string so a catalog refresh shows up
//! in logs and collector output.

pub mod aws;
pub mod azure;
pub mod gcp;

use std::collections::HashSet;

use serde::Serialize;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::models::{CloudProvider, Region, StorageTier};

/// A concrete provider region: the API code and the provider's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProviderRegion {
    pub code: &'static str,
    pub display_name: &'static str,
}

impl ProviderRegion {
    pub const fn new(code: &'static str, display_name: &'static str) -> Self {
        Self { code, display_name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("region table {version} has no entry for {region}")]
    MissingRegion { version: &'static str, region: Region },

    #[error("region table {version} maps the wildcard region explicitly")]
    ExplicitWildcard { version: &'static str },

    #[error("region table {version} lists {code} more than once")]
    DuplicateCode {
        version: &'static str,
        code: &'static str,
    },

    #[error("tier table {version} has no entry for {tier}")]
    MissingTier {
        version: &'static str,
        tier: StorageTier,
    },
}

/// Ordered `Region -> [ProviderRegion]` table for one provider.
#[derive(Debug)]
pub struct RegionTable {
    version: &'static str,
    entries: &'static [(Region, &'static [ProviderRegion])],
}

impl RegionTable {
    pub const fn new(
        version: &'static str,
        entries: &'static [(Region, &'static [ProviderRegion])],
    ) -> Self {
        Self { version, entries }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Concrete regions mapped to one geography. `Region::All` has no
    /// entries of its own; use [`RegionTable::regions`] to expand it.
    pub fn geography(&self, region: Region) -> &'static [ProviderRegion] {
        self.entries
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, list)| *list)
            .unwrap_or(&[])
    }

    /// Resolves an abstract region into the concrete regions to query, in
    /// table order. `Region::All` is every geography concatenated in
    /// declaration order.
    pub fn regions(&self, region: Region) -> Vec<ProviderRegion> {
        if region.is_all() {
            Region::GEOGRAPHIES
                .iter()
                .flat_map(|geo| self.geography(*geo).iter().copied())
                .collect()
        } else {
            self.geography(region).to_vec()
        }
    }

    /// Looks up a concrete region code.
    pub fn find(&self, code: &str) -> Option<(Region, ProviderRegion)> {
        self.entries.iter().find_map(|(region, list)| {
            list.iter()
                .find(|pr| pr.code == code)
                .map(|pr| (*region, *pr))
        })
    }

    /// Every geography must have an entry (possibly empty), the wildcard must
    /// not, and region codes are unique across the table.
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.entries.iter().any(|(r, _)| r.is_all()) {
            return Err(MappingError::ExplicitWildcard {
                version: self.version,
            });
        }

        for region in Region::GEOGRAPHIES {
            if !self.entries.iter().any(|(r, _)| *r == region) {
                return Err(MappingError::MissingRegion {
                    version: self.version,
                    region,
                });
            }
        }

        let mut seen = HashSet::new();
        for (_, list) in self.entries {
            for pr in *list {
                if !seen.insert(pr.code) {
                    return Err(MappingError::DuplicateCode {
                        version: self.version,
                        code: pr.code,
                    });
                }
            }
        }

        Ok(())
    }
}

/// `StorageTier -> [provider storage class]` table for one provider.
#[derive(Debug)]
pub struct TierTable {
    version: &'static str,
    entries: &'static [(StorageTier, &'static [&'static str])],
}

impl TierTable {
    pub const fn new(
        version: &'static str,
        entries: &'static [(StorageTier, &'static [&'static str])],
    ) -> Self {
        Self { version, entries }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn classes(&self, tier: StorageTier) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, classes)| *classes)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        for tier in StorageTier::iter() {
            if !self.entries.iter().any(|(t, _)| *t == tier) {
                return Err(MappingError::MissingTier {
                    version: self.version,
                    tier,
                });
            }
        }
        Ok(())
    }
}

/// Canonical tables for a provider.
pub fn for_provider(provider: CloudProvider) -> (&'static RegionTable, &'static TierTable) {
    match provider {
        CloudProvider::Aws => (aws::region_table(), aws::tier_table()),
        CloudProvider::Azure => (azure::region_table(), azure::tier_table()),
        CloudProvider::Gcp => (gcp::region_table(), gcp::tier_table()),
    }
}

/// Validates both canonical tables of a provider.
pub fn validate(provider: CloudProvider) -> Result<(), MappingError> {
    let (regions, tiers) = for_provider(provider);
    regions.validate()?;
    tiers.validate()
}

//! Read-only provider/region/zone reference data.
//!
//! Tasks consult these lookups to validate a placement before constructing an
//! updater; nothing in the mutation path writes reference data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cloud provider record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub uuid: Uuid,
    pub code: String,
    pub name: String,
}

/// Region within a given provider. Typically maps to a single cloud
/// provider region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub uuid: Uuid,
    pub provider_uuid: Uuid,
    pub code: String,
    pub name: String,
    pub active: bool,
}

/// Availability zone within a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub uuid: Uuid,
    pub region_uuid: Uuid,
    pub code: String,
    pub name: String,
    pub active: bool,
}

/// Immutable snapshot of reference data, queryable by identifier or code.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    providers: Vec<Provider>,
    regions: Vec<Region>,
    zones: Vec<AvailabilityZone>,
}

impl ReferenceData {
    pub fn new(
        providers: Vec<Provider>,
        regions: Vec<Region>,
        zones: Vec<AvailabilityZone>,
    ) -> Self {
        Self {
            providers,
            regions,
            zones,
        }
    }

    pub fn provider_by_code(&self, code: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.code == code)
    }

    pub fn region_by_code(&self, provider_code: &str, code: &str) -> Option<&Region> {
        let provider = self.provider_by_code(provider_code)?;
        self.regions
            .iter()
            .find(|r| r.provider_uuid == provider.uuid && r.code == code)
    }

    pub fn zone_by_code(&self, code: &str) -> Option<&AvailabilityZone> {
        self.zones.iter().find(|z| z.code == code)
    }

    /// Active regions for a provider, by code
    pub fn active_regions(&self, provider_code: &str) -> Vec<&Region> {
        match self.provider_by_code(provider_code) {
            Some(provider) => self
                .regions
                .iter()
                .filter(|r| r.provider_uuid == provider.uuid && r.active)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Check that every region and zone code in a placement exists and is
    /// active under the named provider.
    pub fn placement_is_valid(&self, placement: &crate::models::PlacementSpec) -> bool {
        if self.provider_by_code(&placement.provider_code).is_none() {
            return false;
        }
        let regions_ok = placement
            .region_codes
            .iter()
            .all(|code| {
                self.region_by_code(&placement.provider_code, code)
                    .is_some_and(|r| r.active)
            });
        let zones_ok = placement
            .zone_codes
            .iter()
            .all(|code| self.zone_by_code(code).is_some_and(|z| z.active));
        regions_ok && zones_ok
    }
}

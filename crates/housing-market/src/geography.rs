//! Zone-to-region geography.
//!
//! The [`Geography`] is fixed once setup completes: every zone belongs to
//! exactly one region and that mapping never changes during a run. It is
//! shared read-only (behind an `Arc`) by the inventory, the statistics scan
//! and the relocation search.

use std::collections::{BTreeMap, BTreeSet};

use housing_types::{Region, RegionId, Zone, ZoneId};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// The set of regions and the zones they are made of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    /// All zones indexed by their identifier.
    zones: BTreeMap<ZoneId, Zone>,
    /// All regions indexed by their identifier.
    regions: BTreeMap<RegionId, Region>,
}

impl Geography {
    /// Create an empty geography.
    pub const fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
            regions: BTreeMap::new(),
        }
    }

    /// Build a geography from `(zone, region)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DuplicateZone`] if a zone appears twice.
    pub fn from_zones(
        pairs: impl IntoIterator<Item = (ZoneId, RegionId)>,
    ) -> Result<Self, MarketError> {
        let mut geography = Self::new();
        for (zone, region) in pairs {
            geography.add_zone(zone, region)?;
        }
        Ok(geography)
    }

    /// Register a region without zones. Existing regions are left untouched.
    pub fn add_region(&mut self, id: RegionId) {
        self.regions.entry(id).or_insert_with(|| Region {
            id,
            zones: BTreeSet::new(),
        });
    }

    /// Assign a zone to a region, creating the region if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DuplicateZone`] if the zone is already assigned.
    pub fn add_zone(&mut self, zone: ZoneId, region: RegionId) -> Result<(), MarketError> {
        if let Some(existing) = self.zones.get(&zone) {
            return Err(MarketError::DuplicateZone {
                zone,
                region: existing.region,
            });
        }
        self.zones.insert(zone, Zone { id: zone, region });
        self.add_region(region);
        if let Some(entry) = self.regions.get_mut(&region) {
            entry.zones.insert(zone);
        }
        Ok(())
    }

    /// Region containing the given zone.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownZone`] if the zone is not registered.
    pub fn region_of(&self, zone: ZoneId) -> Result<RegionId, MarketError> {
        self.zones
            .get(&zone)
            .map(|z| z.region)
            .ok_or(MarketError::UnknownZone(zone))
    }

    /// Look up a region.
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Whether the region is registered.
    pub fn contains_region(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    /// All region ids in ascending order.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.keys().copied()
    }

    /// Iterate over all regions in ascending id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Iterate over all zones in ascending id order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Number of zones.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

//! The dwelling inventory: ground truth for every dwelling and its residency.
//!
//! [`DwellingInventory`] exclusively owns all dwelling records together with
//! the [`VacancyIndex`] derived from them. Residency changes go through
//! [`DwellingInventory::set_resident`], which updates the dwelling and fires
//! the matching vacancy-index transition as a single operation. No other path
//! hands out mutable access to a dwelling's residency.
//!
//! Dwelling ids are unique for the lifetime of the inventory. The counter
//! behind [`DwellingInventory::next_id`] only moves forward, and ids of
//! removed dwellings are retired so they cannot be added again.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use housing_types::{Dwelling, DwellingId, RegionId, Residency};
use tracing::{debug, info};

use crate::error::MarketError;
use crate::geography::Geography;
use crate::vacancy::VacancyIndex;

/// Outcome of a [`DwellingInventory::set_resident`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidencyChange {
    /// A vacant dwelling was occupied and left the vacancy index.
    Occupied,
    /// An occupied dwelling was vacated and entered the vacancy index.
    Vacated,
    /// An occupied dwelling changed from one household to another.
    Reassigned,
    /// The requested residency equals the current one.
    Unchanged,
}

/// Counts reported after a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Dwellings inserted.
    pub loaded: usize,
    /// Of those, dwellings indexed as vacant.
    pub vacant: usize,
}

/// Owner of all dwellings and of the per-region vacancy index.
#[derive(Debug, Clone)]
pub struct DwellingInventory {
    /// Zone-to-region lookup shared with the rest of the model.
    geography: Arc<Geography>,
    /// Number of quality levels; dwelling quality must lie in `1..=levels`.
    quality_levels: u8,
    /// All dwellings indexed by id.
    dwellings: BTreeMap<DwellingId, Dwelling>,
    /// Vacant dwellings per region.
    vacancy: VacancyIndex,
    /// Highest id ever issued or loaded (0 when none).
    highest_id: DwellingId,
    /// Ids of removed dwellings.
    retired: BTreeSet<DwellingId>,
    /// Largest bedroom count of any dwelling added so far.
    largest_bedrooms: u32,
}

impl DwellingInventory {
    /// Create an empty inventory over the given geography.
    pub const fn new(geography: Arc<Geography>, quality_levels: u8) -> Self {
        Self {
            geography,
            quality_levels,
            dwellings: BTreeMap::new(),
            vacancy: VacancyIndex::new(),
            highest_id: DwellingId::new(0),
            retired: BTreeSet::new(),
            largest_bedrooms: 0,
        }
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Insert the dwellings produced by the setup collaborator and index
    /// the vacant ones by region.
    ///
    /// # Errors
    ///
    /// Stops at the first dwelling [`DwellingInventory::add`] rejects.
    pub fn load(
        &mut self,
        dwellings: impl IntoIterator<Item = Dwelling>,
    ) -> Result<LoadReport, MarketError> {
        let mut report = LoadReport::default();
        for dwelling in dwellings {
            let vacant = dwelling.is_vacant();
            self.add(dwelling)?;
            report.loaded = report.loaded.saturating_add(1);
            if vacant {
                report.vacant = report.vacant.saturating_add(1);
            }
        }
        info!(
            loaded = report.loaded,
            vacant = report.vacant,
            highest_id = %self.highest_id,
            "Dwellings loaded and vacant dwellings identified"
        );
        Ok(report)
    }

    /// Add a dwelling. A vacant dwelling is indexed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DuplicateDwelling`] or
    /// [`MarketError::RetiredDwellingId`] for an id that is or was in use,
    /// [`MarketError::UnknownZone`] for a zone outside the geography, and
    /// [`MarketError::QualityOutOfRange`] for an invalid quality level.
    pub fn add(&mut self, dwelling: Dwelling) -> Result<(), MarketError> {
        let id = dwelling.id;
        if self.dwellings.contains_key(&id) {
            return Err(MarketError::DuplicateDwelling(id));
        }
        if self.retired.contains(&id) {
            return Err(MarketError::RetiredDwellingId(id));
        }
        if dwelling.quality == 0 || dwelling.quality > self.quality_levels {
            return Err(MarketError::QualityOutOfRange {
                dwelling: id,
                quality: dwelling.quality,
                levels: self.quality_levels,
            });
        }
        let region = self.geography.region_of(dwelling.zone)?;

        if dwelling.is_vacant() {
            self.vacancy.on_became_vacant(id, region)?;
        }
        self.highest_id = self.highest_id.max(id);
        self.largest_bedrooms = self.largest_bedrooms.max(dwelling.bedrooms);
        self.dwellings.insert(id, dwelling);
        Ok(())
    }

    /// Remove (demolish) a dwelling, detaching it from the vacancy index
    /// first when it is vacant. The id is retired for the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DwellingNotFound`] for an unknown id.
    pub fn remove(&mut self, id: DwellingId) -> Result<Dwelling, MarketError> {
        let Some(dwelling) = self.dwellings.get(&id) else {
            return Err(MarketError::DwellingNotFound(id));
        };
        if dwelling.is_vacant() {
            let region = self.geography.region_of(dwelling.zone)?;
            self.vacancy.on_became_occupied(id, region)?;
        }
        self.retired.insert(id);
        let removed = self
            .dwellings
            .remove(&id)
            .ok_or(MarketError::DwellingNotFound(id))?;
        debug!(dwelling = %id, vacant = removed.is_vacant(), "Dwelling removed");
        Ok(removed)
    }

    /// Issue the next unused dwelling id, advancing the counter.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::IdSpaceExhausted`] once `u64::MAX` is reached.
    pub fn next_id(&mut self) -> Result<DwellingId, MarketError> {
        let next = self
            .highest_id
            .checked_next()
            .ok_or(MarketError::IdSpaceExhausted)?;
        self.highest_id = next;
        Ok(next)
    }

    // -------------------------------------------------------------------
    // Residency
    // -------------------------------------------------------------------

    /// Set who lives in a dwelling, keeping the vacancy index in step.
    ///
    /// Vacant to occupied removes the dwelling from its region's vacancy
    /// list; occupied to vacant inserts it. Household-to-household and
    /// same-state requests leave the index alone.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DwellingNotFound`] for an unknown id, or an
    /// index error if the vacancy index disagrees with the dwelling. State
    /// is unchanged on error.
    pub fn set_resident(
        &mut self,
        id: DwellingId,
        residency: Residency,
    ) -> Result<ResidencyChange, MarketError> {
        let Some(dwelling) = self.dwellings.get_mut(&id) else {
            return Err(MarketError::DwellingNotFound(id));
        };
        let region = self.geography.region_of(dwelling.zone)?;

        if dwelling.residency == residency {
            return Ok(ResidencyChange::Unchanged);
        }
        let change = match (dwelling.residency, residency) {
            (Residency::Vacant, Residency::Occupied(_)) => {
                self.vacancy.on_became_occupied(id, region)?;
                ResidencyChange::Occupied
            }
            (Residency::Occupied(_), Residency::Vacant) => {
                self.vacancy.on_became_vacant(id, region)?;
                ResidencyChange::Vacated
            }
            _ => ResidencyChange::Reassigned,
        };
        dwelling.residency = residency;
        Ok(change)
    }

    /// Set residency from a raw resident id as used by external setup data
    /// (`-1` for vacant, a positive household id otherwise).
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidResident`] for any other raw value,
    /// otherwise see [`DwellingInventory::set_resident`].
    pub fn set_resident_raw(
        &mut self,
        id: DwellingId,
        raw: i64,
    ) -> Result<ResidencyChange, MarketError> {
        let residency = Residency::from_raw(raw)
            .map_err(|source| MarketError::InvalidResident { dwelling: id, source })?;
        self.set_resident(id, residency)
    }

    /// Mark a dwelling vacant.
    ///
    /// # Errors
    ///
    /// See [`DwellingInventory::set_resident`].
    pub fn vacate(&mut self, id: DwellingId) -> Result<ResidencyChange, MarketError> {
        self.set_resident(id, Residency::Vacant)
    }

    // -------------------------------------------------------------------
    // Attribute updates (never touch residency)
    // -------------------------------------------------------------------

    /// Update the price of a dwelling.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DwellingNotFound`] for an unknown id.
    pub fn set_price(&mut self, id: DwellingId, price: u32) -> Result<(), MarketError> {
        let dwelling = self
            .dwellings
            .get_mut(&id)
            .ok_or(MarketError::DwellingNotFound(id))?;
        dwelling.price = price;
        Ok(())
    }

    /// Update the quality level of a dwelling.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DwellingNotFound`] for an unknown id and
    /// [`MarketError::QualityOutOfRange`] for an invalid level.
    pub fn set_quality(&mut self, id: DwellingId, quality: u8) -> Result<(), MarketError> {
        if quality == 0 || quality > self.quality_levels {
            return Err(MarketError::QualityOutOfRange {
                dwelling: id,
                quality,
                levels: self.quality_levels,
            });
        }
        let dwelling = self
            .dwellings
            .get_mut(&id)
            .ok_or(MarketError::DwellingNotFound(id))?;
        dwelling.quality = quality;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Look up a dwelling.
    pub fn get(&self, id: DwellingId) -> Option<&Dwelling> {
        self.dwellings.get(&id)
    }

    /// Iterate over all dwellings in ascending id order.
    pub fn all(&self) -> impl Iterator<Item = &Dwelling> {
        self.dwellings.values()
    }

    /// Number of dwellings.
    pub fn len(&self) -> usize {
        self.dwellings.len()
    }

    /// Whether the inventory holds no dwellings.
    pub fn is_empty(&self) -> bool {
        self.dwellings.is_empty()
    }

    /// Region a dwelling is located in.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DwellingNotFound`] for an unknown id.
    pub fn region_of_dwelling(&self, id: DwellingId) -> Result<RegionId, MarketError> {
        let dwelling = self
            .dwellings
            .get(&id)
            .ok_or(MarketError::DwellingNotFound(id))?;
        self.geography.region_of(dwelling.zone)
    }

    /// Read-only view of the vacancy index.
    pub const fn vacancy(&self) -> &VacancyIndex {
        &self.vacancy
    }

    /// Vacant dwellings in a region, in vacancy-list order.
    pub fn dwellings_vacant_in_region(
        &self,
        region: RegionId,
    ) -> impl Iterator<Item = &Dwelling> {
        self.vacancy
            .dwellings_vacant_in_region(region)
            .iter()
            .filter_map(|id| self.dwellings.get(id))
    }

    /// Number of vacant dwellings in a region.
    pub fn vacant_count_in_region(&self, region: RegionId) -> usize {
        self.vacancy.count_vacant_in_region(region)
    }

    /// The geography the inventory is partitioned by.
    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    /// Shared handle to the geography.
    pub fn shared_geography(&self) -> Arc<Geography> {
        Arc::clone(&self.geography)
    }

    /// Number of configured quality levels.
    pub const fn quality_levels(&self) -> u8 {
        self.quality_levels
    }

    /// Largest bedroom count of any dwelling added so far.
    pub const fn largest_bedrooms(&self) -> u32 {
        self.largest_bedrooms
    }

    /// Highest id issued or loaded so far.
    pub const fn highest_id(&self) -> DwellingId {
        self.highest_id
    }

    /// Mutable vacancy index, for corrupting state in audit tests.
    #[cfg(test)]
    pub(crate) const fn vacancy_mut(&mut self) -> &mut VacancyIndex {
        &mut self.vacancy
    }
}

#[cfg(test)]
mod tests {
    use housing_types::{DwellingType, HouseholdId, ZoneId};

    use super::*;

    fn geography() -> Arc<Geography> {
        let geography = Geography::from_zones([
            (ZoneId::new(1), RegionId::new(1)),
            (ZoneId::new(2), RegionId::new(1)),
            (ZoneId::new(3), RegionId::new(2)),
        ]);
        Arc::new(geography.unwrap_or_default())
    }

    fn dwelling(id: u64, zone: u32, residency: Residency) -> Dwelling {
        Dwelling {
            id: DwellingId::new(id),
            zone: ZoneId::new(zone),
            coordinate: None,
            dwelling_type: DwellingType::MultiFamilySmall,
            bedrooms: 2,
            quality: 2,
            price: 800,
            year_built: 1990,
            residency,
        }
    }

    fn occupied(household: u64) -> Residency {
        Residency::Occupied(HouseholdId::new(household))
    }

    fn inventory() -> DwellingInventory {
        let mut inventory = DwellingInventory::new(geography(), 4);
        let report = inventory.load([
            dwelling(1, 1, Residency::Vacant),
            dwelling(2, 2, occupied(10)),
            dwelling(5, 3, Residency::Vacant),
        ]);
        assert_eq!(report, Ok(LoadReport { loaded: 3, vacant: 2 }));
        inventory
    }

    #[test]
    fn load_indexes_vacant_dwellings_by_region() {
        let inventory = inventory();
        assert_eq!(inventory.vacant_count_in_region(RegionId::new(1)), 1);
        assert_eq!(inventory.vacant_count_in_region(RegionId::new(2)), 1);
        assert_eq!(inventory.highest_id(), DwellingId::new(5));
    }

    #[test]
    fn occupying_removes_from_index() {
        let mut inventory = inventory();
        let change = inventory.set_resident(DwellingId::new(1), occupied(11));
        assert_eq!(change, Ok(ResidencyChange::Occupied));
        assert_eq!(inventory.vacant_count_in_region(RegionId::new(1)), 0);
        assert!(!inventory.vacancy().contains(DwellingId::new(1)));
    }

    #[test]
    fn vacating_adds_to_index() {
        let mut inventory = inventory();
        assert_eq!(inventory.vacate(DwellingId::new(2)), Ok(ResidencyChange::Vacated));
        let vacant: Vec<DwellingId> = inventory
            .dwellings_vacant_in_region(RegionId::new(1))
            .map(|d| d.id)
            .collect();
        assert_eq!(vacant, vec![DwellingId::new(1), DwellingId::new(2)]);
    }

    #[test]
    fn reassignment_and_no_op_leave_index_alone() {
        let mut inventory = inventory();
        let before = inventory.vacancy().clone();
        assert_eq!(
            inventory.set_resident(DwellingId::new(2), occupied(12)),
            Ok(ResidencyChange::Reassigned)
        );
        assert_eq!(
            inventory.set_resident(DwellingId::new(1), Residency::Vacant),
            Ok(ResidencyChange::Unchanged)
        );
        assert_eq!(inventory.vacancy(), &before);
    }

    #[test]
    fn unknown_dwelling_is_a_fault_and_no_op() {
        let mut inventory = inventory();
        let before = inventory.vacancy().clone();
        assert_eq!(
            inventory.set_resident(DwellingId::new(99), occupied(1)),
            Err(MarketError::DwellingNotFound(DwellingId::new(99)))
        );
        assert_eq!(inventory.vacancy(), &before);
        assert!(inventory.remove(DwellingId::new(99)).is_err());
    }

    #[test]
    fn remove_vacant_detaches_from_index_and_retires_id() {
        let mut inventory = inventory();
        let removed = inventory.remove(DwellingId::new(5));
        assert!(removed.is_ok());
        assert_eq!(inventory.vacant_count_in_region(RegionId::new(2)), 0);
        assert_eq!(
            inventory.add(dwelling(5, 3, Residency::Vacant)),
            Err(MarketError::RetiredDwellingId(DwellingId::new(5)))
        );
    }

    #[test]
    fn next_id_is_monotonic_and_never_reused() {
        let mut inventory = inventory();
        let first = inventory.next_id();
        assert_eq!(first, Ok(DwellingId::new(6)));
        assert!(inventory.remove(DwellingId::new(5)).is_ok());
        assert_eq!(inventory.next_id(), Ok(DwellingId::new(7)));
        assert!(inventory.add(dwelling(6, 1, Residency::Vacant)).is_ok());
        assert_eq!(inventory.next_id(), Ok(DwellingId::new(8)));
    }

    #[test]
    fn add_rejects_bad_records() {
        let mut inventory = inventory();
        assert_eq!(
            inventory.add(dwelling(1, 1, Residency::Vacant)),
            Err(MarketError::DuplicateDwelling(DwellingId::new(1)))
        );
        assert_eq!(
            inventory.add(dwelling(20, 77, Residency::Vacant)),
            Err(MarketError::UnknownZone(ZoneId::new(77)))
        );
        let mut bad_quality = dwelling(21, 1, Residency::Vacant);
        bad_quality.quality = 9;
        assert!(matches!(
            inventory.add(bad_quality),
            Err(MarketError::QualityOutOfRange { quality: 9, .. })
        ));
        assert!(!inventory.vacancy().contains(DwellingId::new(20)));
    }

    #[test]
    fn raw_resident_ids_follow_sentinels() {
        let mut inventory = inventory();
        assert_eq!(
            inventory.set_resident_raw(DwellingId::new(1), 44),
            Ok(ResidencyChange::Occupied)
        );
        assert_eq!(
            inventory.set_resident_raw(DwellingId::new(1), -1),
            Ok(ResidencyChange::Vacated)
        );
        assert!(matches!(
            inventory.set_resident_raw(DwellingId::new(1), -2),
            Err(MarketError::InvalidResident { .. })
        ));
        assert!(inventory.vacancy().contains(DwellingId::new(1)));
    }

    #[test]
    fn attribute_updates_do_not_touch_residency() {
        let mut inventory = inventory();
        assert!(inventory.set_price(DwellingId::new(1), 1_250).is_ok());
        assert!(inventory.set_quality(DwellingId::new(1), 4).is_ok());
        assert!(inventory.set_quality(DwellingId::new(1), 5).is_err());
        let updated = inventory.get(DwellingId::new(1)).cloned();
        assert_eq!(updated.as_ref().map(|d| d.price), Some(1_250));
        assert_eq!(updated.as_ref().map(|d| d.quality), Some(4));
        assert!(inventory.vacancy().contains(DwellingId::new(1)));
    }
}

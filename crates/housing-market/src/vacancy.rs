//! Per-region index of vacant dwellings.
//!
//! The [`VacancyIndex`] mirrors the residency state held by the inventory:
//! region `R` lists dwelling `d` exactly when `d` is vacant and located in a
//! zone of `R`. A side table records where each entry sits so that removal
//! is `O(log n)` instead of a linear scan of the region list.
//!
//! Removal swaps the last entry of the list into the freed slot. List order
//! therefore depends only on the sequence of index operations, which keeps
//! replay deterministic under a fixed seed. A vacate followed immediately by
//! an occupy of the same dwelling restores the index exactly.

use std::collections::BTreeMap;

use housing_types::{DwellingId, RegionId};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Region-partitioned list of vacant dwellings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacancyIndex {
    /// Vacant dwellings per region, in index-operation order.
    by_region: BTreeMap<RegionId, Vec<DwellingId>>,
    /// Location of every indexed dwelling: region and slot within its list.
    slots: BTreeMap<DwellingId, (RegionId, usize)>,
}

impl VacancyIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            by_region: BTreeMap::new(),
            slots: BTreeMap::new(),
        }
    }

    /// Record that a dwelling in `region` became vacant.
    ///
    /// The region list is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AlreadyIndexedAsVacant`] if the dwelling is
    /// already listed in any region; the index is left unchanged.
    pub fn on_became_vacant(
        &mut self,
        dwelling: DwellingId,
        region: RegionId,
    ) -> Result<(), MarketError> {
        if let Some(&(existing, _)) = self.slots.get(&dwelling) {
            return Err(MarketError::AlreadyIndexedAsVacant {
                dwelling,
                region: existing,
            });
        }
        let list = self.by_region.entry(region).or_default();
        let slot = list.len();
        list.push(dwelling);
        self.slots.insert(dwelling, (region, slot));
        Ok(())
    }

    /// Record that a vacant dwelling in `region` became occupied.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotIndexedAsVacant`] if the dwelling is not
    /// listed under `region`; the index is left unchanged.
    pub fn on_became_occupied(
        &mut self,
        dwelling: DwellingId,
        region: RegionId,
    ) -> Result<(), MarketError> {
        let not_indexed = MarketError::NotIndexedAsVacant { dwelling, region };
        let Some(&(indexed_region, slot)) = self.slots.get(&dwelling) else {
            return Err(not_indexed);
        };
        if indexed_region != region {
            return Err(not_indexed);
        }
        let Some(list) = self.by_region.get_mut(&region) else {
            return Err(not_indexed);
        };
        if slot >= list.len() {
            return Err(not_indexed);
        }

        list.swap_remove(slot);
        if let Some(&moved) = list.get(slot) {
            self.slots.insert(moved, (region, slot));
        }
        if list.is_empty() {
            self.by_region.remove(&region);
        }
        self.slots.remove(&dwelling);
        Ok(())
    }

    /// Vacant dwellings in a region. Empty for regions with no vacancy.
    pub fn dwellings_vacant_in_region(&self, region: RegionId) -> &[DwellingId] {
        self.by_region.get(&region).map_or(&[], Vec::as_slice)
    }

    /// Number of vacant dwellings in a region.
    pub fn count_vacant_in_region(&self, region: RegionId) -> usize {
        self.by_region.get(&region).map_or(0, Vec::len)
    }

    /// Number of vacant dwellings across all regions.
    pub fn total_vacant(&self) -> usize {
        self.slots.len()
    }

    /// Whether the dwelling is listed as vacant.
    pub fn contains(&self, dwelling: DwellingId) -> bool {
        self.slots.contains_key(&dwelling)
    }

    /// Region under which a dwelling is listed, if any.
    pub fn indexed_region(&self, dwelling: DwellingId) -> Option<RegionId> {
        self.slots.get(&dwelling).map(|&(region, _)| region)
    }

    /// Iterate over `(region, vacant dwellings)` for regions with vacancy.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &[DwellingId])> {
        self.by_region
            .iter()
            .map(|(region, list)| (*region, list.as_slice()))
    }

    /// Immutable per-region counts, for parallel work that must not observe
    /// later mutations.
    pub fn snapshot(&self) -> VacancySnapshot {
        VacancySnapshot {
            counts: self
                .by_region
                .iter()
                .map(|(region, list)| (*region, list.len()))
                .collect(),
            total: self.slots.len(),
        }
    }
}

/// Frozen vacancy counts taken before the relocation searches of a year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancySnapshot {
    /// Vacant dwellings per region (regions without vacancy are absent).
    counts: BTreeMap<RegionId, usize>,
    /// Vacant dwellings across all regions.
    total: usize,
}

impl VacancySnapshot {
    /// Vacant dwellings in a region at snapshot time.
    pub fn count(&self, region: RegionId) -> usize {
        self.counts.get(&region).copied().unwrap_or(0)
    }

    /// Total vacant dwellings at snapshot time.
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Share of all vacancies located in a region; 0 when nothing is vacant.
    pub fn share(&self, region: RegionId) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(region) as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(id: u64) -> DwellingId {
        DwellingId::new(id)
    }

    fn r(id: u32) -> RegionId {
        RegionId::new(id)
    }

    #[test]
    fn vacate_then_occupy_restores_index() {
        let mut index = VacancyIndex::new();
        assert!(index.on_became_vacant(d(1), r(1)).is_ok());
        assert!(index.on_became_vacant(d(2), r(1)).is_ok());
        let before = index.clone();

        assert!(index.on_became_vacant(d(3), r(1)).is_ok());
        assert!(index.on_became_occupied(d(3), r(1)).is_ok());
        assert_eq!(index, before);

        assert!(index.on_became_vacant(d(9), r(4)).is_ok());
        assert!(index.on_became_occupied(d(9), r(4)).is_ok());
        assert_eq!(index, before);
    }

    #[test]
    fn removal_from_middle_keeps_slots_consistent() {
        let mut index = VacancyIndex::new();
        for id in 1..=5 {
            assert!(index.on_became_vacant(d(id), r(1)).is_ok());
        }
        assert!(index.on_became_occupied(d(2), r(1)).is_ok());
        assert_eq!(index.dwellings_vacant_in_region(r(1)), &[d(1), d(5), d(3), d(4)]);
        // The moved entry must still be removable through its new slot.
        assert!(index.on_became_occupied(d(5), r(1)).is_ok());
        assert_eq!(index.dwellings_vacant_in_region(r(1)), &[d(1), d(4), d(3)]);
        assert_eq!(index.total_vacant(), 3);
    }

    #[test]
    fn double_vacate_is_rejected() {
        let mut index = VacancyIndex::new();
        assert!(index.on_became_vacant(d(1), r(1)).is_ok());
        assert_eq!(
            index.on_became_vacant(d(1), r(2)),
            Err(MarketError::AlreadyIndexedAsVacant {
                dwelling: d(1),
                region: r(1),
            })
        );
        assert_eq!(index.count_vacant_in_region(r(2)), 0);
    }

    #[test]
    fn occupy_of_unlisted_dwelling_is_rejected() {
        let mut index = VacancyIndex::new();
        assert!(index.on_became_vacant(d(1), r(1)).is_ok());
        assert!(index.on_became_occupied(d(2), r(1)).is_err());
        assert!(index.on_became_occupied(d(1), r(2)).is_err());
        assert_eq!(index.count_vacant_in_region(r(1)), 1);
    }

    #[test]
    fn unknown_region_reads_as_empty() {
        let index = VacancyIndex::new();
        assert!(index.dwellings_vacant_in_region(r(42)).is_empty());
        assert_eq!(index.count_vacant_in_region(r(42)), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut index = VacancyIndex::new();
        assert!(index.on_became_vacant(d(1), r(1)).is_ok());
        assert!(index.on_became_vacant(d(2), r(2)).is_ok());
        assert!(index.on_became_vacant(d(3), r(2)).is_ok());
        let snapshot = index.snapshot();
        assert!(index.on_became_occupied(d(2), r(2)).is_ok());

        assert_eq!(snapshot.count(r(2)), 2);
        assert_eq!(snapshot.total(), 3);
        assert!((snapshot.share(r(1)) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(index.count_vacant_in_region(r(2)), 1);
    }

    #[test]
    fn share_is_zero_without_vacancy() {
        let snapshot = VacancyIndex::new().snapshot();
        assert!(snapshot.share(r(1)).abs() < f64::EPSILON);
    }
}

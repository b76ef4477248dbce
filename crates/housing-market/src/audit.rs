//! Vacancy index consistency audit.
//!
//! The index is maintained incrementally by the inventory. The audit
//! rebuilds the expected index from scratch and compares:
//!
//! ```text
//! for every dwelling d:  d.is_vacant() <=> index[region(d)] contains d
//! every indexed id appears in exactly one region list
//! ```
//!
//! It is a test and end-of-run check, never a step inside the year loop.

use std::collections::BTreeMap;

use housing_types::{DwellingId, RegionId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::inventory::DwellingInventory;

/// Discrepancies between the incremental index and a full rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyDiscrepancy {
    /// Vacant dwellings absent from their region's list.
    pub missing: Vec<(DwellingId, RegionId)>,
    /// Indexed ids that are not vacant dwellings of the inventory.
    pub unexpected: Vec<(DwellingId, RegionId)>,
    /// Vacant dwellings listed under the wrong region: (id, listed, actual).
    pub misplaced: Vec<(DwellingId, RegionId, RegionId)>,
    /// Ids appearing more than once across all region lists.
    pub duplicated: Vec<DwellingId>,
}

impl VacancyDiscrepancy {
    /// Total number of individual discrepancies.
    pub fn count(&self) -> usize {
        self.missing
            .len()
            .saturating_add(self.unexpected.len())
            .saturating_add(self.misplaced.len())
            .saturating_add(self.duplicated.len())
    }
}

/// The result of a vacancy index audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VacancyAudit {
    /// The incremental index equals a full rebuild.
    Consistent,
    /// At least one discrepancy was found.
    Inconsistent(VacancyDiscrepancy),
}

impl VacancyAudit {
    /// Whether the index passed the audit.
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Rebuild the vacancy index from the inventory and compare it with the
/// incrementally maintained one.
pub fn audit_vacancy_index(inventory: &DwellingInventory) -> VacancyAudit {
    let geography = inventory.geography();
    let mut report = VacancyDiscrepancy::default();

    // Where each indexed id is listed, with multiplicity.
    let mut listed: BTreeMap<DwellingId, Vec<RegionId>> = BTreeMap::new();
    for (region, ids) in inventory.vacancy().regions() {
        for id in ids {
            listed.entry(*id).or_default().push(region);
        }
    }

    for dwelling in inventory.all().filter(|d| d.is_vacant()) {
        let Ok(actual) = geography.region_of(dwelling.zone) else {
            continue;
        };
        match listed.get(&dwelling.id).and_then(|regions| regions.first()) {
            None => report.missing.push((dwelling.id, actual)),
            Some(listed_region) if *listed_region != actual => {
                report.misplaced.push((dwelling.id, *listed_region, actual));
            }
            Some(_) => {}
        }
    }

    for (id, regions) in &listed {
        if regions.len() > 1 {
            report.duplicated.push(*id);
        }
        let vacant = inventory.get(*id).is_some_and(|d| d.is_vacant());
        if !vacant {
            for region in regions {
                report.unexpected.push((*id, *region));
            }
        }
    }

    if report.count() == 0 {
        VacancyAudit::Consistent
    } else {
        warn!(
            missing = report.missing.len(),
            unexpected = report.unexpected.len(),
            misplaced = report.misplaced.len(),
            duplicated = report.duplicated.len(),
            "VACANCY_INDEX_INCONSISTENT: incremental index differs from rebuild"
        );
        VacancyAudit::Inconsistent(report)
    }
}

//! Yearly population counts and group shares by region.
//!
//! Counted once per year from the households' current dwellings before any
//! relocation search runs. The counts feed the population normalizers of
//! stage 1 and the group-share utility strategy.

use std::collections::BTreeMap;

use housing_market::DwellingInventory;
use housing_types::{Household, RegionId, ZoneId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persons per region and zone, and persons per group label per region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalDemographics {
    /// Persons per region; every region of the geography is present.
    persons_by_region: BTreeMap<RegionId, u64>,
    /// Persons per zone.
    persons_by_zone: BTreeMap<ZoneId, u64>,
    /// Persons per group label, per region.
    labels_by_region: BTreeMap<RegionId, BTreeMap<String, u64>>,
}

impl RegionalDemographics {
    /// Count persons of every housed household by the region of its dwelling.
    ///
    /// A person's own label wins over the household label. Households
    /// without a dwelling, or whose dwelling is unknown, are not counted.
    pub fn compute<'a>(
        households: impl IntoIterator<Item = &'a Household>,
        inventory: &DwellingInventory,
    ) -> Self {
        let geography = inventory.geography();
        let mut demographics = Self {
            persons_by_region: geography.region_ids().map(|id| (id, 0)).collect(),
            ..Self::default()
        };

        let mut unhoused = 0_u64;
        for household in households {
            let Some(zone) = household
                .dwelling
                .and_then(|id| inventory.get(id))
                .map(|dwelling| dwelling.zone)
            else {
                unhoused = unhoused.saturating_add(1);
                continue;
            };
            let Ok(region) = geography.region_of(zone) else {
                unhoused = unhoused.saturating_add(1);
                continue;
            };
            let persons = u64::try_from(household.persons.len()).unwrap_or(u64::MAX);

            let by_region = demographics.persons_by_region.entry(region).or_insert(0);
            *by_region = by_region.saturating_add(persons);
            let by_zone = demographics.persons_by_zone.entry(zone).or_insert(0);
            *by_zone = by_zone.saturating_add(persons);

            let labels = demographics.labels_by_region.entry(region).or_default();
            for person in &household.persons {
                if let Some(label) = person.group.as_ref().or(household.group.as_ref()) {
                    let count = labels.entry(label.clone()).or_insert(0);
                    *count = count.saturating_add(1);
                }
            }
        }

        debug!(
            regions = demographics.persons_by_region.len(),
            unhoused, "Regional demographics counted"
        );
        demographics
    }

    /// Persons living in a region.
    pub fn population(&self, region: RegionId) -> u64 {
        self.persons_by_region.get(&region).copied().unwrap_or(0)
    }

    /// Persons living in a zone.
    pub fn zone_population(&self, zone: ZoneId) -> u64 {
        self.persons_by_zone.get(&zone).copied().unwrap_or(0)
    }

    /// Share of a region's persons carrying `label`; 0 for an empty region.
    pub fn group_share(&self, region: RegionId, label: &str) -> f64 {
        let population = self.population(region);
        if population == 0 {
            return 0.0;
        }
        let count = self
            .labels_by_region
            .get(&region)
            .and_then(|labels| labels.get(label))
            .copied()
            .unwrap_or(0);
        count as f64 / population as f64
    }

    /// All group labels seen in any region, in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        let mut labels: Vec<&str> = self
            .labels_by_region
            .values()
            .flat_map(|labels| labels.keys().map(String::as_str))
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels.into_iter()
    }
}

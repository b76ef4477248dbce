//! Yearly precomputation of regional utilities per household group.
//!
//! Regional utility depends only on the household group and on yearly
//! market data, so it is computed once per year for every group before the
//! first search. Groups are independent and are spread over the rayon pool;
//! every task reads the same immutable [`UtilityContext`].

use std::collections::{BTreeMap, BTreeSet};

use housing_types::{IncomeCategory, RegionId};
use rayon::prelude::*;
use tracing::info;

use crate::demographics::RegionalDemographics;
use crate::error::SearchError;
use crate::group::{HouseholdGroup, RegionGroup};
use crate::utility::{UtilityContext, UtilityEngine};

/// Base region utility per (group, region).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionalUtilityTable {
    /// Utilities per group, per region.
    utilities: BTreeMap<RegionGroup, BTreeMap<RegionId, f64>>,
}

impl RegionalUtilityTable {
    /// Every income category crossed with "no label", every label seen in
    /// this year's demographics and every label a searcher classifies to.
    ///
    /// Searchers look up the row of their own classified group, so a label
    /// that only appears on a searching household still gets a row.
    pub fn groups_for<'a>(
        demographics: &RegionalDemographics,
        searchers: impl IntoIterator<Item = &'a HouseholdGroup>,
    ) -> Vec<RegionGroup> {
        let mut labels: BTreeSet<Option<String>> = BTreeSet::new();
        labels.insert(None);
        labels.extend(demographics.labels().map(|label| Some(label.to_owned())));
        labels.extend(searchers.into_iter().map(|group| group.label.clone()));
        IncomeCategory::ALL
            .iter()
            .flat_map(|income| {
                labels.iter().map(|label| RegionGroup {
                    income: *income,
                    label: label.clone(),
                })
            })
            .collect()
    }

    /// Evaluate the engine's region utility for every group and region.
    ///
    /// Non-finite or negative utilities are stored as 0.
    pub fn compute(
        engine: &UtilityEngine,
        groups: &[RegionGroup],
        regions: &[RegionId],
        context: &UtilityContext<'_>,
    ) -> Self {
        let rows: Vec<(RegionGroup, BTreeMap<RegionId, f64>)> = groups
            .par_iter()
            .map(|group| {
                let row = regions
                    .iter()
                    .map(|region| {
                        let utility = engine.region_utility(group, *region, context);
                        let utility = if utility.is_finite() { utility.max(0.0) } else { 0.0 };
                        (*region, utility)
                    })
                    .collect();
                (group.clone(), row)
            })
            .collect();

        info!(
            groups = rows.len(),
            regions = regions.len(),
            strategy = engine.key(),
            "Regional utilities computed"
        );
        Self {
            utilities: rows.into_iter().collect(),
        }
    }

    /// Base utility of `region` for `group`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MissingGroup`] or [`SearchError::UnknownRegion`]
    /// when the pair was not precomputed.
    pub fn utility(&self, group: &RegionGroup, region: RegionId) -> Result<f64, SearchError> {
        let row = self.utilities.get(group).ok_or_else(|| SearchError::MissingGroup {
            group: group.to_string(),
        })?;
        row.get(&region)
            .copied()
            .ok_or(SearchError::UnknownRegion(region))
    }

    /// Number of precomputed groups.
    pub fn group_count(&self) -> usize {
        self.utilities.len()
    }
}

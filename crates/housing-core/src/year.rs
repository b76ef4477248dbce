//! The simulated year: statistics, regional precomputation, and the
//! sequential relocation loop.
//!
//! Each year runs in three steps:
//!
//! 1. **Prepare** -- recompute [`MarketStatistics`] from a full inventory
//!    scan, count regional demographics, and precompute regional utilities
//!    for every household group (parallel, over immutable data).
//! 2. **Select** -- ask the [`MobilitySource`] which households relocate and
//!    in what order.
//! 3. **Relocate** -- for each household in turn, run the two-stage search
//!    against the live vacancy index and apply a successful choice through
//!    [`move_household`] before the next household searches.
//!
//! Consistency faults are logged, counted in the [`YearSummary`], and the
//! year continues. "No match" outcomes are counted per reason and region.

use std::collections::BTreeMap;

use housing_choice::{
    Accessibility, CommutingTimeProbability, GroupClassifier, HouseholdGroup, NoMatchReason,
    RegionalDemographics, RegionalUtilityTable, RelocationSearch, SearchError, SearchInputs,
    SearchOutcome, SimulationRng, TravelTimes, UtilityContext, UtilityEngine,
};
use housing_market::{
    DwellingInventory, MarketError, MarketReference, MarketStatistics, RentShareTable,
};
use housing_types::{DwellingId, DwellingType, Household, HouseholdId, RegionId, Residency, TransportMode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::YearClock;
use crate::config::{ConfigError, MarketConfig, SimulationConfig};
use crate::mobility::MobilitySource;

/// Errors that can occur while running a year or moving a household.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum YearError {
    /// Every year of the run has already been simulated.
    #[error("no years left to simulate")]
    RunFinished,

    /// The household is not part of the population.
    #[error("household not found: {0}")]
    UnknownHousehold(HouseholdId),

    /// The target dwelling of a move is occupied.
    #[error("dwelling {0} is not vacant")]
    DwellingNotVacant(DwellingId),

    /// The household's recorded dwelling has a different resident.
    #[error("dwelling {dwelling} is not occupied by household {household}")]
    ResidentMismatch {
        /// The dwelling the household claims to live in.
        dwelling: DwellingId,
        /// The household.
        household: HouseholdId,
    },

    /// An inventory operation failed.
    #[error("market error: {source}")]
    Market {
        /// The underlying market error.
        #[from]
        source: MarketError,
    },

    /// A relocation search hit an internal fault.
    #[error("search error: {source}")]
    Search {
        /// The underlying search error.
        #[from]
        source: SearchError,
    },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The mutable state owned by the year driver.
#[derive(Debug)]
pub struct MarketState {
    /// The year clock.
    pub clock: YearClock,
    /// All dwellings and the vacancy index.
    pub inventory: DwellingInventory,
    /// The population, by id.
    pub households: BTreeMap<HouseholdId, Household>,
    /// Values frozen at setup.
    pub reference: MarketReference,
    /// The most recent statistics snapshot.
    pub statistics: MarketStatistics,
    /// The run-wide random source.
    pub rng: SimulationRng,
}

impl MarketState {
    /// Assemble the initial state: compute first statistics and rent
    /// shares, freeze the market reference, and seed the random source.
    pub fn setup(
        inventory: DwellingInventory,
        households: impl IntoIterator<Item = Household>,
        market: &MarketConfig,
        classifier: &dyn GroupClassifier,
        clock: YearClock,
        seed: u64,
    ) -> Self {
        let households: BTreeMap<HouseholdId, Household> = households
            .into_iter()
            .map(|household| (household.id, household))
            .collect();
        let statistics = MarketStatistics::compute_chunked(&inventory, market.statistics_chunk_size);
        let rent_shares = RentShareTable::compute(
            &inventory,
            market.rent_category_width,
            market.rent_categories,
            |id| {
                households
                    .get(&id)
                    .map(|household| classifier.classify(household).income())
            },
        );
        let reference = MarketReference::capture(&inventory, &statistics, rent_shares);

        info!(
            dwellings = inventory.len(),
            vacant = inventory.vacancy().total_vacant(),
            households = households.len(),
            regions = inventory.geography().region_count(),
            seed,
            "Market state assembled"
        );

        Self {
            clock,
            inventory,
            households,
            reference,
            statistics,
            rng: SimulationRng::from_seed(seed),
        }
    }

    /// Number of vacant dwellings currently in a region.
    pub fn vacant_count_in_region(&self, region: RegionId) -> usize {
        self.inventory.vacant_count_in_region(region)
    }

    /// Replace the statistics snapshot with a fresh full scan.
    pub fn recompute_statistics(&mut self, chunk_size: usize) -> &MarketStatistics {
        self.statistics = MarketStatistics::compute_chunked(&self.inventory, chunk_size);
        &self.statistics
    }
}

// ---------------------------------------------------------------------------
// Choice model
// ---------------------------------------------------------------------------

/// The relocation choice model and its transport collaborators.
pub struct ChoiceModel {
    /// Active utility strategy.
    pub engine: UtilityEngine,
    /// Search parameters.
    pub search: RelocationSearch,
    /// Household classifier.
    pub classifier: Box<dyn GroupClassifier>,
    /// Accessibility indicators.
    pub accessibility: Box<dyn Accessibility>,
    /// Travel-time provider.
    pub travel_times: Box<dyn TravelTimes>,
    /// Commute duration to factor.
    pub commute: Box<dyn CommutingTimeProbability>,
    /// Departure time for commute queries, seconds after midnight.
    pub peak_hour_s: u32,
    /// Mode for commute queries.
    pub mode: TransportMode,
    /// Dwellings per parallel statistics task.
    pub statistics_chunk_size: usize,
}

impl std::fmt::Debug for ChoiceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceModel")
            .field("engine", &self.engine)
            .field("search", &self.search)
            .field("peak_hour_s", &self.peak_hour_s)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ChoiceModel {
    /// Build the model from configuration and the transport collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown strategy key or invalid
    /// search parameters.
    pub fn from_config(
        config: &SimulationConfig,
        accessibility: Box<dyn Accessibility>,
        travel_times: Box<dyn TravelTimes>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: config.utility_engine()?,
            search: config.search_model()?,
            classifier: Box::new(config.classifier()),
            accessibility,
            travel_times,
            commute: Box::new(config.commute()),
            peak_hour_s: config.transport.peak_hour_seconds,
            mode: config.transport.mode,
            statistics_chunk_size: config.market.statistics_chunk_size,
        })
    }

    /// Utility inputs for the current year.
    pub fn context<'a>(
        &'a self,
        statistics: &'a MarketStatistics,
        reference: &'a MarketReference,
        demographics: &'a RegionalDemographics,
    ) -> UtilityContext<'a> {
        UtilityContext {
            statistics,
            reference,
            demographics,
            accessibility: self.accessibility.as_ref(),
            travel_times: self.travel_times.as_ref(),
            commute: self.commute.as_ref(),
            peak_hour_s: self.peak_hour_s,
            mode: self.mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Year inputs
// ---------------------------------------------------------------------------

/// Data computed once at the start of a year and read by every search.
#[derive(Debug, Clone)]
pub struct YearInputs {
    /// The simulated year.
    pub year: u32,
    /// Population counts per region.
    pub demographics: RegionalDemographics,
    /// Regional utilities per household group.
    pub regional: RegionalUtilityTable,
}

/// Recompute statistics and precompute regional data for `year`.
///
/// Must run before the first search of the year.
pub fn prepare_year(state: &mut MarketState, model: &ChoiceModel, year: u32) -> YearInputs {
    state.recompute_statistics(model.statistics_chunk_size);
    let demographics = RegionalDemographics::compute(state.households.values(), &state.inventory);
    let searchers: Vec<HouseholdGroup> = state
        .households
        .values()
        .map(|household| model.classifier.classify(household))
        .collect();
    let groups = RegionalUtilityTable::groups_for(&demographics, &searchers);
    let regions: Vec<RegionId> = state.inventory.geography().region_ids().collect();
    let regional = {
        let context = model.context(&state.statistics, &state.reference, &demographics);
        RegionalUtilityTable::compute(&model.engine, &groups, &regions, &context)
    };
    YearInputs {
        year,
        demographics,
        regional,
    }
}

// ---------------------------------------------------------------------------
// Search and move
// ---------------------------------------------------------------------------

/// Run the two-stage search for one household.
///
/// # Errors
///
/// Returns [`YearError::UnknownHousehold`] or a wrapped [`SearchError`].
pub fn find_dwelling_for(
    state: &mut MarketState,
    model: &ChoiceModel,
    inputs: &YearInputs,
    household: HouseholdId,
) -> Result<SearchOutcome, YearError> {
    let record = state
        .households
        .get(&household)
        .ok_or(YearError::UnknownHousehold(household))?;
    let group = model.classifier.classify(record);
    let context = model.context(&state.statistics, &state.reference, &inputs.demographics);
    let search_inputs = SearchInputs {
        inventory: &state.inventory,
        regional: &inputs.regional,
        engine: &model.engine,
        context: &context,
    };
    Ok(model
        .search
        .find_dwelling_for(record, &group, &search_inputs, &mut state.rng)?)
}

/// Move a household into a vacant dwelling, vacating its previous one.
///
/// Both residency changes go through the inventory so the vacancy index
/// stays in step. All preconditions are checked before anything changes;
/// if vacating the old dwelling still fails, the new dwelling is released
/// again.
///
/// # Errors
///
/// Returns [`YearError`] when the household or dwelling is unknown, the
/// target is occupied, or the household's recorded dwelling names another
/// resident. State is unchanged on error.
pub fn move_household(
    state: &mut MarketState,
    household: HouseholdId,
    dwelling: DwellingId,
) -> Result<(), YearError> {
    let record = state
        .households
        .get_mut(&household)
        .ok_or(YearError::UnknownHousehold(household))?;
    let target = state
        .inventory
        .get(dwelling)
        .ok_or(MarketError::DwellingNotFound(dwelling))?;
    if !target.is_vacant() {
        return Err(YearError::DwellingNotVacant(dwelling));
    }
    let previous = record.dwelling;
    if let Some(old) = previous {
        let resident = state
            .inventory
            .get(old)
            .ok_or(MarketError::DwellingNotFound(old))?
            .residency
            .household();
        if resident != Some(household) {
            return Err(YearError::ResidentMismatch {
                dwelling: old,
                household,
            });
        }
    }

    state
        .inventory
        .set_resident(dwelling, Residency::Occupied(household))?;
    if let Some(old) = previous
        && let Err(error) = state.inventory.vacate(old)
    {
        if let Err(rollback) = state.inventory.vacate(dwelling) {
            warn!(dwelling = %dwelling, error = %rollback, "Rollback of move failed");
        }
        return Err(error.into());
    }
    record.dwelling = Some(dwelling);
    debug!(
        household = %household,
        from = ?previous,
        to = %dwelling,
        "Household moved"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// End-of-year report of relocation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    /// The simulated year.
    pub year: u32,
    /// Households that searched.
    pub relocating: usize,
    /// Successful moves.
    pub moved: usize,
    /// Searches ending without a dwelling.
    pub no_match: usize,
    /// Successful moves per destination region and dwelling type.
    pub moves_by_region_and_type: BTreeMap<RegionId, BTreeMap<DwellingType, usize>>,
    /// No-match outcomes per reason.
    pub no_match_by_reason: BTreeMap<String, usize>,
    /// No-match outcomes per region chosen in stage 1.
    pub no_match_by_region: BTreeMap<RegionId, usize>,
    /// Consistency faults logged and skipped.
    pub consistency_faults: usize,
    /// Vacant dwellings at the end of the year.
    pub vacant_at_end: usize,
}

impl YearSummary {
    /// Start a summary for `year`.
    pub fn new(year: u32, relocating: usize) -> Self {
        Self {
            year,
            relocating,
            ..Self::default()
        }
    }

    /// Count a successful move.
    pub fn record_move(&mut self, region: RegionId, dwelling_type: DwellingType) {
        self.moved = self.moved.saturating_add(1);
        let count = self
            .moves_by_region_and_type
            .entry(region)
            .or_default()
            .entry(dwelling_type)
            .or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Count a no-match outcome.
    pub fn record_no_match(&mut self, reason: NoMatchReason) {
        self.no_match = self.no_match.saturating_add(1);
        let by_reason = self
            .no_match_by_reason
            .entry(reason.kind().to_owned())
            .or_insert(0);
        *by_reason = by_reason.saturating_add(1);
        if let Some(region) = reason.region() {
            let by_region = self.no_match_by_region.entry(region).or_insert(0);
            *by_region = by_region.saturating_add(1);
        }
    }

    /// Log and count a consistency fault.
    pub fn record_fault(&mut self, household: HouseholdId, error: &YearError) {
        self.consistency_faults = self.consistency_faults.saturating_add(1);
        warn!(
            year = self.year,
            household = %household,
            error = %error,
            "CONSISTENCY_FAULT: relocation skipped"
        );
    }
}

// ---------------------------------------------------------------------------
// Year
// ---------------------------------------------------------------------------

/// Simulate the next year of the clock.
///
/// # Errors
///
/// Returns [`YearError::RunFinished`] when the clock is exhausted. Faults
/// of individual relocations never abort the year.
pub fn run_year(
    state: &mut MarketState,
    model: &ChoiceModel,
    mobility: &mut dyn MobilitySource,
) -> Result<YearSummary, YearError> {
    let year = state.clock.advance().ok_or(YearError::RunFinished)?;
    let inputs = prepare_year(state, model, year);
    let relocating = mobility.relocating(year, &state.households, &mut state.rng);
    let mut summary = YearSummary::new(year, relocating.len());

    for household in relocating {
        match find_dwelling_for(state, model, &inputs, household) {
            Ok(SearchOutcome::Found { dwelling, region }) => {
                let dwelling_type = state.inventory.get(dwelling).map(|d| d.dwelling_type);
                match (move_household(state, household, dwelling), dwelling_type) {
                    (Ok(()), Some(dwelling_type)) => summary.record_move(region, dwelling_type),
                    (Ok(()), None) => {}
                    (Err(error), _) => summary.record_fault(household, &error),
                }
            }
            Ok(SearchOutcome::NoMatch(reason)) => summary.record_no_match(reason),
            Err(error) => summary.record_fault(household, &error),
        }
    }

    summary.vacant_at_end = state.inventory.vacancy().total_vacant();
    info!(
        year,
        relocating = summary.relocating,
        moved = summary.moved,
        no_match = summary.no_match,
        faults = summary.consistency_faults,
        vacant = summary.vacant_at_end,
        "Year complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_reason_and_region() {
        let mut summary = YearSummary::new(2011, 4);
        summary.record_move(RegionId::new(1), DwellingType::MobileHome);
        summary.record_move(RegionId::new(1), DwellingType::MobileHome);
        summary.record_no_match(NoMatchReason::NoRegionWeight);
        summary.record_no_match(NoMatchReason::NoVacancy(RegionId::new(2)));
        summary.record_fault(HouseholdId::new(9), &YearError::UnknownHousehold(HouseholdId::new(9)));

        assert_eq!(summary.moved, 2);
        assert_eq!(
            summary
                .moves_by_region_and_type
                .get(&RegionId::new(1))
                .and_then(|types| types.get(&DwellingType::MobileHome)),
            Some(&2)
        );
        assert_eq!(summary.no_match, 2);
        assert_eq!(summary.no_match_by_reason.get("no_region_weight"), Some(&1));
        assert_eq!(summary.no_match_by_region.get(&RegionId::new(2)), Some(&1));
        assert_eq!(summary.consistency_faults, 1);
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut summary = YearSummary::new(2011, 1);
        summary.record_move(RegionId::new(3), DwellingType::SingleFamilyAttached);
        let json = serde_json::to_string(&summary).unwrap_or_default();
        assert!(json.contains("\"single_family_attached\":1"));
    }
}

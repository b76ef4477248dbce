//! The two-stage relocation search.
//!
//! For one relocating household, [`RelocationSearch::find_dwelling_for`]
//! first draws a region, then a vacant dwelling inside it:
//!
//! 1. **Region.** For every region, weight = precomputed base utility for
//!    the household's group x product over workers of
//!    `commute(travel time from job zone to region)` x normalizer factor.
//!    A zero weight sum ends the search with no match.
//! 2. **Dwelling.** Each vacant dwelling of the chosen region is evaluated
//!    with probability `min(cap, n) / n` (an independent per-dwelling filter,
//!    so fewer than `min(cap, n)` may be evaluated). Evaluated dwellings are
//!    weighted by the shaped utility, relative to the best one evaluated; a
//!    zero weight sum ends the search with no match.
//!
//! Searches run strictly one household at a time against the live vacancy
//! index, so a dwelling taken by one household is gone for the next.
//! "No match" is a [`SearchOutcome`], not an error; [`SearchError`] is
//! reserved for internal faults.

use housing_market::{DwellingInventory, VacancySnapshot};
use housing_types::{DwellingId, Household, RegionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SearchError, StrategyError};
use crate::group::HouseholdGroup;
use crate::normalizer::{RegionNormalizer, RegionSignals};
use crate::probability::ProbabilityShape;
use crate::regional::RegionalUtilityTable;
use crate::selector::{SimulationRng, select_weighted};
use crate::utility::{UtilityContext, UtilityEngine};

/// Default cap on dwellings evaluated per search.
pub const DEFAULT_MAX_EVALUATED_DWELLINGS: usize = 20;

/// Why a search ended without a dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoMatchReason {
    /// Every region weight was 0; stage 2 did not run.
    NoRegionWeight,
    /// The chosen region has no vacant dwelling.
    NoVacancy(RegionId),
    /// No evaluated dwelling of the chosen region had positive weight
    /// (including the case where none passed the sampling filter).
    NoDwellingWeight(RegionId),
}

impl NoMatchReason {
    /// Region chosen in stage 1, if stage 1 succeeded.
    pub const fn region(self) -> Option<RegionId> {
        match self {
            Self::NoRegionWeight => None,
            Self::NoVacancy(region) | Self::NoDwellingWeight(region) => Some(region),
        }
    }

    /// Reason without the region, for per-reason counts.
    pub const fn kind(self) -> &'static str {
        match self {
            Self::NoRegionWeight => "no_region_weight",
            Self::NoVacancy(_) => "no_vacancy",
            Self::NoDwellingWeight(_) => "no_dwelling_weight",
        }
    }
}

/// Result of one relocation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A vacant dwelling was chosen.
    Found {
        /// The chosen dwelling.
        dwelling: DwellingId,
        /// Its region.
        region: RegionId,
    },
    /// The household stays where it is this year.
    NoMatch(NoMatchReason),
}

impl SearchOutcome {
    /// The chosen dwelling, if any.
    pub const fn dwelling(self) -> Option<DwellingId> {
        match self {
            Self::Found { dwelling, .. } => Some(dwelling),
            Self::NoMatch(_) => None,
        }
    }
}

/// Everything a search reads for the current year.
#[derive(Clone, Copy)]
pub struct SearchInputs<'a> {
    /// Live inventory; its vacancy index reflects all earlier moves.
    pub inventory: &'a DwellingInventory,
    /// Regional utilities precomputed for this year.
    pub regional: &'a RegionalUtilityTable,
    /// Active utility strategy.
    pub engine: &'a UtilityEngine,
    /// Yearly utility inputs.
    pub context: &'a UtilityContext<'a>,
}

/// Search parameters fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelocationSearch {
    /// Cap on dwellings evaluated in stage 2.
    max_evaluated: usize,
    /// Stage-1 normalizer policy.
    normalizer: RegionNormalizer,
    /// Stage-2 utility-to-weight shape.
    shape: ProbabilityShape,
}

impl Default for RelocationSearch {
    fn default() -> Self {
        Self {
            max_evaluated: DEFAULT_MAX_EVALUATED_DWELLINGS,
            normalizer: RegionNormalizer::default(),
            shape: ProbabilityShape::default(),
        }
    }
}

impl RelocationSearch {
    /// Create a search with validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::InvalidParameter`] for a zero cap or an
    /// invalid normalizer or shape parameter.
    pub fn new(
        max_evaluated: usize,
        normalizer: RegionNormalizer,
        shape: ProbabilityShape,
    ) -> Result<Self, StrategyError> {
        if max_evaluated == 0 {
            return Err(StrategyError::InvalidParameter {
                name: "search.max_evaluated_dwellings",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        normalizer.validate()?;
        shape.validate()?;
        Ok(Self {
            max_evaluated,
            normalizer,
            shape,
        })
    }

    /// The active normalizer policy.
    pub const fn normalizer(&self) -> RegionNormalizer {
        self.normalizer
    }

    /// Cap on dwellings evaluated per search.
    pub const fn max_evaluated(&self) -> usize {
        self.max_evaluated
    }

    /// Run both stages for one household.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on an internal fault (a region or group
    /// missing from the regional table, or a vacancy entry pointing at an
    /// unknown dwelling).
    pub fn find_dwelling_for(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        inputs: &SearchInputs<'_>,
        rng: &mut SimulationRng,
    ) -> Result<SearchOutcome, SearchError> {
        let Some(region) = self.select_region(household, group, inputs, rng)? else {
            debug!(household = %household.id, "No region with positive weight");
            return Ok(SearchOutcome::NoMatch(NoMatchReason::NoRegionWeight));
        };
        let outcome = match self.select_dwelling(household, group, region, inputs, rng)? {
            DwellingDraw::Chosen(dwelling) => SearchOutcome::Found { dwelling, region },
            DwellingDraw::NoVacancy => SearchOutcome::NoMatch(NoMatchReason::NoVacancy(region)),
            DwellingDraw::NoWeight => {
                SearchOutcome::NoMatch(NoMatchReason::NoDwellingWeight(region))
            }
        };
        debug!(household = %household.id, region = %region, ?outcome, "Relocation search finished");
        Ok(outcome)
    }

    /// Stage 1: draw a region, or `None` if every weight is 0.
    ///
    /// # Errors
    ///
    /// See [`RelocationSearch::find_dwelling_for`].
    pub fn select_region(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        inputs: &SearchInputs<'_>,
        rng: &mut SimulationRng,
    ) -> Result<Option<RegionId>, SearchError> {
        let context = inputs.context;
        let key = group.region_group();
        let vacancy = inputs.inventory.vacancy();
        let total_vacant = vacancy.total_vacant();
        let regions: Vec<RegionId> = inputs.inventory.geography().region_ids().collect();

        let mut weights = Vec::with_capacity(regions.len());
        let mut sum = 0.0;
        for region in &regions {
            let base = inputs.regional.utility(&key, *region)?;
            let commute = commute_factor(household, *region, context);
            let signals = RegionSignals {
                vacant: vacancy.count_vacant_in_region(*region),
                total_vacant,
                vacancy_rate: context.statistics.regional_vacancy_rate(*region),
                population: context.demographics.population(*region),
            };
            let weight = sanitize(base * commute * self.normalizer.factor(&signals));
            sum += weight;
            weights.push(weight);
        }

        if sum <= 0.0 {
            return Ok(None);
        }
        Ok(select_weighted(&weights, sum, rng).and_then(|index| regions.get(index).copied()))
    }

    /// Stage 2: draw a vacant dwelling in `region`.
    fn select_dwelling(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        region: RegionId,
        inputs: &SearchInputs<'_>,
        rng: &mut SimulationRng,
    ) -> Result<DwellingDraw, SearchError> {
        let candidates = inputs.inventory.vacancy().dwellings_vacant_in_region(region);
        if candidates.is_empty() {
            return Ok(DwellingDraw::NoVacancy);
        }
        let inclusion = inclusion_probability(self.max_evaluated, candidates.len());

        let mut evaluated = Vec::new();
        let mut utilities = Vec::new();
        for id in candidates {
            if rng.unit() > inclusion {
                continue;
            }
            let dwelling = inputs
                .inventory
                .get(*id)
                .ok_or(SearchError::DanglingVacancy(*id))?;
            utilities.push(
                inputs
                    .engine
                    .dwelling_utility(household, group, dwelling, inputs.context),
            );
            evaluated.push(*id);
        }
        debug!(
            household = %household.id,
            region = %region,
            pool = candidates.len(),
            evaluated = evaluated.len(),
            "Dwellings evaluated"
        );

        let weights = self.shape.pool_weights(&utilities);
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            return Ok(DwellingDraw::NoWeight);
        }
        Ok(select_weighted(&weights, sum, rng)
            .and_then(|index| evaluated.get(index).copied())
            .map_or(DwellingDraw::NoWeight, DwellingDraw::Chosen))
    }

    /// Region weights for a household under an explicit vacancy snapshot,
    /// without drawing. Used for reporting and tests.
    ///
    /// # Errors
    ///
    /// See [`RelocationSearch::find_dwelling_for`].
    pub fn region_weights(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        inputs: &SearchInputs<'_>,
        snapshot: &VacancySnapshot,
    ) -> Result<Vec<(RegionId, f64)>, SearchError> {
        let context = inputs.context;
        let key = group.region_group();
        inputs
            .inventory
            .geography()
            .region_ids()
            .map(|region| {
                let base = inputs.regional.utility(&key, region)?;
                let signals = RegionSignals {
                    vacant: snapshot.count(region),
                    total_vacant: snapshot.total(),
                    vacancy_rate: context.statistics.regional_vacancy_rate(region),
                    population: context.demographics.population(region),
                };
                let weight = base
                    * commute_factor(household, region, context)
                    * self.normalizer.factor(&signals);
                Ok((region, sanitize(weight)))
            })
            .collect()
    }
}

/// Stage-2 result before it is mapped onto a [`SearchOutcome`].
enum DwellingDraw {
    Chosen(DwellingId),
    NoVacancy,
    NoWeight,
}

/// Per-dwelling inclusion probability `min(cap, pool) / pool`.
pub fn inclusion_probability(cap: usize, pool: usize) -> f64 {
    if pool == 0 {
        return 0.0;
    }
    cap.min(pool) as f64 / pool as f64
}

/// Product of commute factors from every worker's job zone to `region`.
fn commute_factor(household: &Household, region: RegionId, context: &UtilityContext<'_>) -> f64 {
    household.job_zones().fold(1.0, |product, job| {
        let minutes = context.travel_times.travel_time_to_region(
            job,
            region,
            context.peak_hour_s,
            context.mode,
        );
        product * context.commute.probability(minutes, context.mode)
    })
}

/// Negative and non-finite weights count as 0.
fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use housing_market::{Geography, MarketReference, MarketStatistics, RentShareTable};
    use housing_types::{
        Dwelling, DwellingType, HouseholdId, Occupation, Person, PersonId, Residency, ZoneId,
    };

    use super::*;
    use crate::accessibility::{AccessibilityTable, ExponentialCommute, TravelTimeTable};
    use crate::demographics::RegionalDemographics;
    use crate::group::{GroupClassifier, IncomeClassifier, RegionGroup};
    use crate::utility::UtilityStrategy;

    const REGION: RegionId = RegionId::new(1);

    /// Counts dwelling evaluations; utilities come from a fixed table.
    struct CountingUtility {
        calls: Arc<AtomicUsize>,
        utilities: BTreeMap<DwellingId, f64>,
        default: f64,
    }

    impl UtilityStrategy for CountingUtility {
        fn key(&self) -> &'static str {
            "counting"
        }

        fn dwelling_utility(
            &self,
            _household: &Household,
            _group: &HouseholdGroup,
            dwelling: &Dwelling,
            _context: &UtilityContext<'_>,
        ) -> f64 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.utilities.get(&dwelling.id).copied().unwrap_or(self.default)
        }

        fn region_utility(
            &self,
            _group: &RegionGroup,
            _region: RegionId,
            _context: &UtilityContext<'_>,
        ) -> f64 {
            1.0
        }
    }

    /// Run `searches` searches for one household against a single region
    /// holding `vacant` vacant dwellings.
    fn run_searches(
        vacant: u64,
        search: RelocationSearch,
        strategy: CountingUtility,
        searches: usize,
    ) -> Vec<SearchOutcome> {
        let geography = Geography::from_zones([(ZoneId::new(1), REGION)]).unwrap_or_default();
        let mut inventory = DwellingInventory::new(Arc::new(geography), 4);
        let loaded = inventory.load((1..=vacant).map(|id| Dwelling {
            id: DwellingId::new(id),
            zone: ZoneId::new(1),
            coordinate: None,
            dwelling_type: DwellingType::SingleFamilyDetached,
            bedrooms: 2,
            quality: 2,
            price: 800,
            year_built: 2000,
            residency: Residency::Vacant,
        }));
        assert!(loaded.is_ok());

        let household = Household {
            id: HouseholdId::new(1),
            persons: vec![Person {
                id: PersonId::new(1),
                occupation: Occupation::Employed,
                income: 30_000,
                job_zone: None,
                group: None,
            }],
            autos: 1,
            dwelling: None,
            group: None,
            attributes: BTreeMap::new(),
        };
        let group = IncomeClassifier::default().classify(&household);

        let statistics = MarketStatistics::compute(&inventory);
        let reference =
            MarketReference::capture(&inventory, &statistics, RentShareTable::default());
        let demographics = RegionalDemographics::compute(std::slice::from_ref(&household), &inventory);
        let accessibility = AccessibilityTable::default();
        let travel = TravelTimeTable::new(inventory.geography(), 30.0);
        let commute = ExponentialCommute::default();
        let context = UtilityContext {
            statistics: &statistics,
            reference: &reference,
            demographics: &demographics,
            accessibility: &accessibility,
            travel_times: &travel,
            commute: &commute,
            peak_hour_s: 28_800,
            mode: housing_types::TransportMode::Car,
        };
        let engine = UtilityEngine::new(Box::new(strategy));
        let groups = RegionalUtilityTable::groups_for(&demographics, [&group]);
        let regional = RegionalUtilityTable::compute(&engine, &groups, &[REGION], &context);
        let inputs = SearchInputs {
            inventory: &inventory,
            regional: &regional,
            engine: &engine,
            context: &context,
        };

        let mut rng = SimulationRng::from_seed(42);
        (0..searches)
            .map(|_| {
                search
                    .find_dwelling_for(&household, &group, &inputs, &mut rng)
                    .unwrap_or(SearchOutcome::NoMatch(NoMatchReason::NoRegionWeight))
            })
            .collect()
    }

    fn counting(default: f64) -> (Arc<AtomicUsize>, CountingUtility) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = CountingUtility {
            calls: Arc::clone(&calls),
            utilities: BTreeMap::new(),
            default,
        };
        (calls, strategy)
    }

    #[test]
    fn large_pool_evaluates_about_the_cap() {
        let (calls, strategy) = counting(1.0);
        let search = RelocationSearch::new(20, RegionNormalizer::NoNormalization, ProbabilityShape::Linear);
        let Ok(search) = search else {
            panic!("valid parameters");
        };
        let searches = 500;
        let outcomes = run_searches(200, search, strategy, searches);

        assert!(outcomes.iter().all(|o| matches!(o, SearchOutcome::Found { region: REGION, .. })));
        let mean = calls.load(Ordering::Relaxed) as f64 / searches as f64;
        assert!((18.5..21.5).contains(&mean), "mean evaluated {mean}");
    }

    #[test]
    fn small_pool_evaluates_every_dwelling() {
        let (calls, strategy) = counting(1.0);
        let search = RelocationSearch::new(20, RegionNormalizer::NoNormalization, ProbabilityShape::Linear);
        let Ok(search) = search else {
            panic!("valid parameters");
        };
        run_searches(5, search, strategy, 10);
        assert_eq!(calls.load(Ordering::Relaxed), 50);
    }

    #[test]
    fn all_zero_dwelling_weights_end_without_a_match() {
        let (calls, strategy) = counting(0.0);
        let search = RelocationSearch::new(20, RegionNormalizer::NoNormalization, ProbabilityShape::Linear);
        let Ok(search) = search else {
            panic!("valid parameters");
        };
        let outcomes = run_searches(8, search, strategy, 5);

        assert!(calls.load(Ordering::Relaxed) > 0);
        assert!(
            outcomes
                .iter()
                .all(|o| *o == SearchOutcome::NoMatch(NoMatchReason::NoDwellingWeight(REGION)))
        );
    }

    #[test]
    fn overflowing_utility_stays_the_favourite() {
        let (_, mut strategy) = counting(0.0);
        strategy.utilities.insert(DwellingId::new(3), 1_000.0);
        let search = RelocationSearch::new(
            20,
            RegionNormalizer::NoNormalization,
            ProbabilityShape::Exponential { scale: 1.0 },
        );
        let Ok(search) = search else {
            panic!("valid parameters");
        };
        let outcomes = run_searches(5, search, strategy, 20);

        assert!(outcomes.iter().all(|o| o.dwelling() == Some(DwellingId::new(3))));
    }

    #[test]
    fn inclusion_is_one_when_pool_fits_the_cap() {
        assert!((inclusion_probability(20, 5) - 1.0).abs() < f64::EPSILON);
        assert!((inclusion_probability(20, 20) - 1.0).abs() < f64::EPSILON);
        assert!((inclusion_probability(20, 80) - 0.25).abs() < 1e-12);
        assert!(inclusion_probability(20, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_cap_is_a_configuration_fault() {
        assert!(RelocationSearch::new(0, RegionNormalizer::default(), ProbabilityShape::default()).is_err());
        let search = RelocationSearch::new(5, RegionNormalizer::VacantDwellings, ProbabilityShape::Linear);
        assert_eq!(search.map(|s| s.max_evaluated()).ok(), Some(5));
    }

    #[test]
    fn no_match_reason_exposes_region() {
        let region = RegionId::new(4);
        assert_eq!(NoMatchReason::NoRegionWeight.region(), None);
        assert_eq!(NoMatchReason::NoVacancy(region).region(), Some(region));
        assert_eq!(NoMatchReason::NoDwellingWeight(region).kind(), "no_dwelling_weight");
        assert_eq!(SearchOutcome::NoMatch(NoMatchReason::NoRegionWeight).dwelling(), None);
    }

    #[test]
    fn sanitize_clamps() {
        assert!(sanitize(f64::NAN).abs() < f64::EPSILON);
        assert!(sanitize(-2.0).abs() < f64::EPSILON);
        assert!((sanitize(2.0) - 2.0).abs() < f64::EPSILON);
    }
}

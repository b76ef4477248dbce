//! Shared fixture for the year-cycle integration tests.
//!
//! Three regions: region 1 (zones 10, 11) holds five vacant dwellings,
//! region 2 (zones 20, 21) three occupied ones and region 3 (zone 30) one
//! occupied one. Households 1 to 4 live in regions 2 and 3, households 5
//! and 6 have no dwelling yet.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use housing_choice::{
    AccessibilityTable, ExponentialCommute, HouseholdGroup, IncomeClassifier, ProbabilityShape,
    RegionGroup, RegionNormalizer, RelocationSearch, TravelTimeTable, UtilityContext,
    UtilityEngine, UtilityStrategy,
};
use housing_core::clock::YearClock;
use housing_core::config::MarketConfig;
use housing_core::year::{ChoiceModel, MarketState};
use housing_market::{DwellingInventory, Geography};
use housing_types::{
    Dwelling, DwellingId, DwellingType, Household, HouseholdId, Occupation, Person, PersonId,
    RegionId, Residency, TransportMode, ZoneId,
};

pub const R1: RegionId = RegionId::new(1);
pub const R2: RegionId = RegionId::new(2);
pub const R3: RegionId = RegionId::new(3);

/// Utilities read from fixed tables; missing entries use the defaults.
#[derive(Debug, Clone, Default)]
pub struct FixedUtility {
    pub regions: BTreeMap<RegionId, f64>,
    pub dwellings: BTreeMap<DwellingId, f64>,
    pub default_dwelling: f64,
}

impl FixedUtility {
    pub fn regions(weights: &[(RegionId, f64)]) -> Self {
        Self {
            regions: weights.iter().copied().collect(),
            dwellings: BTreeMap::new(),
            default_dwelling: 1.0,
        }
    }

    pub fn with_dwellings(mut self, weights: &[(u64, f64)], default: f64) -> Self {
        self.dwellings = weights
            .iter()
            .map(|(id, weight)| (DwellingId::new(*id), *weight))
            .collect();
        self.default_dwelling = default;
        self
    }
}

impl UtilityStrategy for FixedUtility {
    fn key(&self) -> &'static str {
        "fixed"
    }

    fn dwelling_utility(
        &self,
        _household: &Household,
        _group: &HouseholdGroup,
        dwelling: &Dwelling,
        _context: &UtilityContext<'_>,
    ) -> f64 {
        self.dwellings
            .get(&dwelling.id)
            .copied()
            .unwrap_or(self.default_dwelling)
    }

    fn region_utility(
        &self,
        _group: &RegionGroup,
        region: RegionId,
        _context: &UtilityContext<'_>,
    ) -> f64 {
        self.regions.get(&region).copied().unwrap_or(0.0)
    }
}

pub fn geography() -> Arc<Geography> {
    let pairs = [(10, 1), (11, 1), (20, 2), (21, 2), (30, 3)]
        .into_iter()
        .map(|(zone, region)| (ZoneId::new(zone), RegionId::new(region)));
    Arc::new(Geography::from_zones(pairs).unwrap())
}

pub fn dwelling(id: u64, zone: u32, price: u32, residency: Residency) -> Dwelling {
    Dwelling {
        id: DwellingId::new(id),
        zone: ZoneId::new(zone),
        coordinate: None,
        dwelling_type: if matches!(id, 2 | 4 | 6 | 8) {
            DwellingType::MultiFamilyLarge
        } else {
            DwellingType::SingleFamilyDetached
        },
        bedrooms: 2,
        quality: 3,
        price,
        year_built: 1990,
        residency,
    }
}

pub fn household(id: u64, income: u32, dwelling: Option<u64>) -> Household {
    Household {
        id: HouseholdId::new(id),
        persons: vec![Person {
            id: PersonId::new(id),
            occupation: Occupation::Employed,
            income,
            job_zone: Some(ZoneId::new(20)),
            group: None,
        }],
        autos: 1,
        dwelling: dwelling.map(DwellingId::new),
        group: None,
        attributes: BTreeMap::new(),
    }
}

fn occupied(household: u64) -> Residency {
    Residency::Occupied(HouseholdId::new(household))
}

pub fn inventory() -> DwellingInventory {
    let mut inventory = DwellingInventory::new(geography(), 4);
    let dwellings = vec![
        dwelling(1, 10, 600, Residency::Vacant),
        dwelling(2, 10, 700, Residency::Vacant),
        dwelling(3, 11, 800, Residency::Vacant),
        dwelling(4, 11, 900, Residency::Vacant),
        dwelling(5, 11, 1000, Residency::Vacant),
        dwelling(6, 20, 500, occupied(1)),
        dwelling(7, 20, 550, occupied(2)),
        dwelling(8, 21, 650, occupied(3)),
        dwelling(9, 30, 400, occupied(4)),
    ];
    inventory.load(dwellings).unwrap();
    inventory
}

pub fn households() -> Vec<Household> {
    vec![
        household(1, 15_000, Some(6)),
        household(2, 35_000, Some(7)),
        household(3, 55_000, Some(8)),
        household(4, 75_000, Some(9)),
        household(5, 25_000, None),
        household(6, 45_000, None),
    ]
}

pub fn state(seed: u64) -> MarketState {
    state_with(households(), seed)
}

pub fn state_with(households: Vec<Household>, seed: u64) -> MarketState {
    let market = MarketConfig {
        statistics_chunk_size: 2,
        ..MarketConfig::default()
    };
    MarketState::setup(
        inventory(),
        households,
        &market,
        &IncomeClassifier::default(),
        YearClock::new(2011, 2013).unwrap(),
        seed,
    )
}

pub fn model(utility: FixedUtility, normalizer: RegionNormalizer) -> ChoiceModel {
    let geography = geography();
    ChoiceModel {
        engine: UtilityEngine::new(Box::new(utility)),
        search: RelocationSearch::new(20, normalizer, ProbabilityShape::Linear).unwrap(),
        classifier: Box::new(IncomeClassifier::default()),
        accessibility: Box::new(AccessibilityTable::default()),
        travel_times: Box::new(TravelTimeTable::new(&geography, 10.0)),
        commute: Box::new(ExponentialCommute::default()),
        peak_hour_s: 28_800,
        mode: TransportMode::Car,
        statistics_chunk_size: 2,
    }
}

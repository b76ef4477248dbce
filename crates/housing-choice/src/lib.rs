//! Utility strategies and the two-stage relocation search for the housing
//! market simulation.
//!
//! A relocating household first picks a region, weighted by precomputed
//! regional utility, commute factors and a normalizer policy, then a vacant
//! dwelling inside it from a bounded, randomly filtered sample.
//!
//! # Modules
//!
//! - [`accessibility`] -- Travel-time, accessibility and commute collaborator
//!   traits, with in-memory table providers.
//! - [`demographics`] -- Yearly persons and group shares per region.
//! - [`error`] -- Search faults and setup-time strategy errors.
//! - [`group`] -- Household classification into utility groups.
//! - [`normalizer`] -- Closed set of stage-1 normalizer policies.
//! - [`probability`] -- Utility-to-weight shapes for stage 2.
//! - [`regional`] -- Parallel yearly regional utility precomputation.
//! - [`search`] -- [`RelocationSearch`], the two-stage choice.
//! - [`selector`] -- Weighted draw and the run-wide [`SimulationRng`].
//! - [`utility`] -- [`UtilityEngine`] and the built-in strategies.

pub mod accessibility;
pub mod demographics;
pub mod error;
pub mod group;
pub mod normalizer;
pub mod probability;
pub mod regional;
pub mod search;
pub mod selector;
pub mod utility;

// Re-export primary types at crate root.
pub use accessibility::{
    Accessibility, AccessibilityTable, CommutingTimeProbability, ExponentialCommute,
    TravelTimeTable, TravelTimes,
};
pub use demographics::RegionalDemographics;
pub use error::{SearchError, StrategyError};
pub use group::{
    DEFAULT_INCOME_THRESHOLDS, GroupClassifier, HouseholdGroup, IncomeClassifier, RegionGroup,
};
pub use normalizer::{RegionNormalizer, RegionSignals};
pub use probability::ProbabilityShape;
pub use regional::RegionalUtilityTable;
pub use search::{
    DEFAULT_MAX_EVALUATED_DWELLINGS, NoMatchReason, RelocationSearch, SearchInputs, SearchOutcome,
    inclusion_probability,
};
pub use selector::{SimulationRng, select_weighted};
pub use utility::{
    GroupShareUtility, STRATEGY_KEYS, StandardUtility, UtilityCoefficients, UtilityContext,
    UtilityEngine, UtilityStrategy,
};

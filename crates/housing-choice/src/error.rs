//! Error types for the `housing-choice` crate.
//!
//! "No match" is not an error: it is a [`SearchOutcome`] value. The types
//! here cover internal faults during a search and invalid strategy
//! selection at setup.
//!
//! [`SearchOutcome`]: crate::search::SearchOutcome

use housing_market::MarketError;
use housing_types::{DwellingId, RegionId};

/// Internal faults raised while resolving one relocation request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A candidate region has no entry in the regional utility table.
    #[error("region {0} missing from the regional utility table")]
    UnknownRegion(RegionId),

    /// The household's group was not precomputed for this year.
    #[error("household group {group} missing from the regional utility table")]
    MissingGroup {
        /// Display form of the group key.
        group: String,
    },

    /// The vacancy index references a dwelling the inventory does not hold.
    #[error("vacancy index lists unknown dwelling {0}")]
    DanglingVacancy(DwellingId),

    /// An inventory lookup failed.
    #[error(transparent)]
    Market(#[from] MarketError),
}

/// Invalid strategy or policy selection, detected at setup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    /// No utility strategy is registered under this key.
    #[error("unknown utility strategy '{key}' (expected one of: {expected})")]
    UnknownStrategy {
        /// The rejected key.
        key: String,
        /// Comma-separated list of valid keys.
        expected: String,
    },

    /// A numeric parameter lies outside its valid range.
    #[error("invalid {name}: {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the valid range is.
        reason: &'static str,
    },
}

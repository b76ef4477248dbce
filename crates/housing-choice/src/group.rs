//! Household group classification.
//!
//! Utility strategies never look at raw household attributes directly; a
//! [`GroupClassifier`] first maps a household to a [`HouseholdGroup`]. The
//! regional stage only needs the coarser [`RegionGroup`] (income category
//! plus the optional demographic label), which is the key of the yearly
//! regional utility table.

use std::fmt;

use housing_types::{Household, HouseholdSizeClass, HouseholdType, IncomeCategory};
use serde::{Deserialize, Serialize};

/// Default upper income bounds of the first three income categories.
pub const DEFAULT_INCOME_THRESHOLDS: [u32; 3] = [20_000, 40_000, 60_000];

/// Key of the regional utility table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionGroup {
    /// Income category.
    pub income: IncomeCategory,
    /// Optional demographic group label.
    pub label: Option<String>,
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{:?}/{label}", self.income),
            None => write!(f, "{:?}", self.income),
        }
    }
}

/// Classification of one household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdGroup {
    /// Size and income bracket.
    pub household_type: HouseholdType,
    /// Optional demographic group label.
    pub label: Option<String>,
}

impl HouseholdGroup {
    /// Income category of the group.
    pub const fn income(&self) -> IncomeCategory {
        self.household_type.income
    }

    /// Key into the regional utility table.
    pub fn region_group(&self) -> RegionGroup {
        RegionGroup {
            income: self.household_type.income,
            label: self.label.clone(),
        }
    }
}

/// Maps raw household attributes to a group.
pub trait GroupClassifier: Send + Sync {
    /// Classify a household.
    fn classify(&self, household: &Household) -> HouseholdGroup;
}

/// Classifies by household size, total income against fixed thresholds,
/// and the household's own group label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeClassifier {
    /// Upper income bounds of the first three categories.
    pub thresholds: [u32; 3],
}

impl IncomeClassifier {
    /// Create a classifier with the given income thresholds.
    pub const fn new(thresholds: [u32; 3]) -> Self {
        Self { thresholds }
    }

    /// Income category of a household.
    pub fn income_category(&self, household: &Household) -> IncomeCategory {
        IncomeCategory::from_income(household.income(), &self.thresholds)
    }
}

impl Default for IncomeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INCOME_THRESHOLDS)
    }
}

impl GroupClassifier for IncomeClassifier {
    fn classify(&self, household: &Household) -> HouseholdGroup {
        HouseholdGroup {
            household_type: HouseholdType {
                size: HouseholdSizeClass::from_size(household.size()),
                income: self.income_category(household),
            },
            label: household.group.clone(),
        }
    }
}

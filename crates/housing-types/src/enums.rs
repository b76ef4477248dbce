//! Categorical attributes shared across the housing market simulation.
//!
//! Every categorical set here is closed: statistics are indexed by the
//! `ALL` arrays, so adding a variant means extending that array too.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dwelling types
// ---------------------------------------------------------------------------

/// Structural type of a dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellingType {
    /// Single-family detached house.
    SingleFamilyDetached,
    /// Single-family attached house (row or semi-detached).
    SingleFamilyAttached,
    /// Multi-family building with two to four units.
    MultiFamilySmall,
    /// Multi-family building with five or more units.
    MultiFamilyLarge,
    /// Mobile home.
    MobileHome,
}

impl DwellingType {
    /// Every dwelling type, in statistics order.
    pub const ALL: [Self; 5] = [
        Self::SingleFamilyDetached,
        Self::SingleFamilyAttached,
        Self::MultiFamilySmall,
        Self::MultiFamilyLarge,
        Self::MobileHome,
    ];

    /// Position of this type in [`DwellingType::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::SingleFamilyDetached => 0,
            Self::SingleFamilyAttached => 1,
            Self::MultiFamilySmall => 2,
            Self::MultiFamilyLarge => 3,
            Self::MobileHome => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Household attributes
// ---------------------------------------------------------------------------

/// Income bracket of a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeCategory {
    /// Lowest income bracket.
    Low,
    /// Middle income bracket.
    Medium,
    /// Upper income bracket.
    High,
    /// Highest income bracket.
    VeryHigh,
}

impl IncomeCategory {
    /// Every income category, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    /// The highest income category.
    pub const HIGHEST: Self = Self::VeryHigh;

    /// Classify an annual household income against ascending upper bounds.
    ///
    /// `upper_bounds[i]` is the exclusive upper income limit of category `i`;
    /// anything at or above the last bound is [`IncomeCategory::VeryHigh`].
    pub const fn from_income(income: u32, upper_bounds: &[u32; 3]) -> Self {
        if income < upper_bounds[0] {
            Self::Low
        } else if income < upper_bounds[1] {
            Self::Medium
        } else if income < upper_bounds[2] {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// Size bracket of a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdSizeClass {
    /// Single-person household.
    One,
    /// Two persons.
    Two,
    /// Three persons.
    Three,
    /// Four or more persons.
    FourPlus,
}

impl HouseholdSizeClass {
    /// Every size class, smallest first.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::FourPlus];

    /// Classify a household by its member count. Empty households count as one.
    pub const fn from_size(size: u32) -> Self {
        match size {
            0 | 1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            _ => Self::FourPlus,
        }
    }
}

/// Labour-market status of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    /// Holds a job with a workplace zone.
    Employed,
    /// Working age without a job.
    Unemployed,
    /// In school or university.
    Student,
    /// Retired or otherwise outside the labour force.
    Retired,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Travel mode used when querying travel times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Private car.
    Car,
    /// Public transport.
    Transit,
    /// Autonomous vehicle (lower value of travel time).
    Autonomous,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dwelling_type_index_matches_all_order() {
        for (position, dwelling_type) in DwellingType::ALL.iter().enumerate() {
            assert_eq!(dwelling_type.index(), position);
        }
    }

    #[test]
    fn income_category_boundaries() {
        let bounds = [20_000, 40_000, 80_000];
        assert_eq!(IncomeCategory::from_income(0, &bounds), IncomeCategory::Low);
        assert_eq!(IncomeCategory::from_income(20_000, &bounds), IncomeCategory::Medium);
        assert_eq!(IncomeCategory::from_income(79_999, &bounds), IncomeCategory::High);
        assert_eq!(IncomeCategory::from_income(80_000, &bounds), IncomeCategory::VeryHigh);
    }

    #[test]
    fn size_class_from_member_count() {
        assert_eq!(HouseholdSizeClass::from_size(0), HouseholdSizeClass::One);
        assert_eq!(HouseholdSizeClass::from_size(3), HouseholdSizeClass::Three);
        assert_eq!(HouseholdSizeClass::from_size(7), HouseholdSizeClass::FourPlus);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&DwellingType::MultiFamilyLarge).ok();
        assert_eq!(json.as_deref(), Some("\"multi_family_large\""));
    }
}

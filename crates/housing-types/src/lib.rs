//! Shared type definitions for the housing market simulation.
//!
//! This crate is the single source of truth for the plain data types used
//! across the workspace: identifiers, categorical attributes, and the
//! dwelling, zone, region and household records.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for all entity identifiers
//! - [`enums`] -- Categorical attributes (dwelling type, income category, modes)
//! - [`structs`] -- Dwelling, zone, region, household and person records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DwellingType, HouseholdSizeClass, IncomeCategory, Occupation, TransportMode};
pub use ids::{DwellingId, HouseholdId, PersonId, RegionId, ZoneId};
pub use structs::{
    AttributeValue, Coordinate, Dwelling, Household, HouseholdType, Person, Region, Residency,
    ResidencyError, VACANT_SENTINEL, Zone,
};

//! Dwelling inventory, vacancy index, and market statistics for the housing
//! market simulation.
//!
//! This crate owns the mutable market state: every dwelling record, the
//! per-region index of vacant dwellings derived from it, and the yearly
//! aggregate statistics the relocation choice reads.
//!
//! # Modules
//!
//! - [`audit`] -- Full-rebuild comparison of the incremental vacancy index.
//! - [`error`] -- Consistency faults raised by inventory operations.
//! - [`geography`] -- Fixed zone-to-region partition.
//! - [`inventory`] -- [`DwellingInventory`], the single owner of dwellings and
//!   the only path for residency changes.
//! - [`reference`] -- Values frozen at setup (initial quality shares, largest
//!   bedroom count, rent shares).
//! - [`rent_share`] -- Rent category shares by income category.
//! - [`statistics`] -- Parallel yearly recomputation of prices and vacancy
//!   rates.
//! - [`vacancy`] -- [`VacancyIndex`] and its immutable snapshot.

pub mod audit;
pub mod error;
pub mod geography;
pub mod inventory;
pub mod reference;
pub mod rent_share;
pub mod statistics;
pub mod vacancy;

// Re-export primary types at crate root.
pub use audit::{VacancyAudit, VacancyDiscrepancy, audit_vacancy_index};
pub use error::MarketError;
pub use geography::Geography;
pub use inventory::{DwellingInventory, LoadReport, ResidencyChange};
pub use reference::MarketReference;
pub use rent_share::{DEFAULT_RENT_CATEGORIES, DEFAULT_RENT_CATEGORY_WIDTH, RentShareTable};
pub use statistics::{
    DEFAULT_CHUNK_SIZE, MarketStatistics, OccupancySummary, RegionStatistics,
};
pub use vacancy::{VacancyIndex, VacancySnapshot};

//! Setup-time market reference values.
//!
//! Values the original market state fixes once and every later year compares
//! against: the number of quality levels, the largest bedroom count, the
//! initial quality distribution, and the rent shares by income category.
//! One [`MarketReference`] is built at setup, owned by the simulation
//! context, and lent to whoever needs it.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::inventory::DwellingInventory;
use crate::rent_share::RentShareTable;
use crate::statistics::MarketStatistics;

/// Market values frozen at setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketReference {
    /// Number of dwelling quality levels.
    pub quality_levels: u8,
    /// Largest bedroom count in the initial inventory (at least 1).
    pub largest_bedrooms: u32,
    /// Share of dwellings per quality level at setup (index `level - 1`).
    pub initial_quality_shares: Vec<f64>,
    /// Rent shares by income category.
    pub rent_shares: RentShareTable,
}

impl MarketReference {
    /// Freeze reference values from the initial inventory and its first
    /// statistics snapshot.
    pub fn capture(
        inventory: &DwellingInventory,
        statistics: &MarketStatistics,
        rent_shares: RentShareTable,
    ) -> Self {
        let reference = Self {
            quality_levels: inventory.quality_levels(),
            largest_bedrooms: inventory.largest_bedrooms().max(1),
            initial_quality_shares: statistics.quality_shares().to_vec(),
            rent_shares,
        };
        info!(
            quality_levels = reference.quality_levels,
            largest_bedrooms = reference.largest_bedrooms,
            "Market reference captured"
        );
        reference
    }

    /// Initial share of a quality level (1-based); 0 outside the range.
    pub fn initial_quality_share(&self, quality: u8) -> f64 {
        usize::from(quality)
            .checked_sub(1)
            .and_then(|index| self.initial_quality_shares.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

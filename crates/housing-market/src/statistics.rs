//! Yearly market statistics computed from a full inventory scan.
//!
//! [`MarketStatistics`] is rebuilt wholesale once per simulated year, never
//! updated incrementally. The scan is split into fixed-size chunks of
//! dwellings processed on the rayon pool; each chunk fills its own
//! [`PartialCounts`], and the partials are merged in chunk order by a single
//! reduction afterwards. No accumulator is shared between workers.
//!
//! Prices are summed as integers, so the merged totals (and every derived
//! average) are identical regardless of chunking or thread count.
//!
//! # Derived values
//!
//! | value | definition | empty case |
//! |-------|------------|------------|
//! | average price | `sum(price) / count` | 0 |
//! | vacancy rate | `vacant / (vacant + occupied)` | 0 |
//! | quality share | `count(level) / count(all)` | 0 |

use std::collections::BTreeMap;

use housing_types::{Dwelling, DwellingType, RegionId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geography::Geography;
use crate::inventory::DwellingInventory;

/// Default number of dwellings handled by one parallel scan task.
pub const DEFAULT_CHUNK_SIZE: usize = 4_096;

const TYPE_COUNT: usize = DwellingType::ALL.len();

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Raw counts for one slice of dwellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    /// Vacant dwellings.
    vacant: u64,
    /// Occupied dwellings.
    occupied: u64,
    /// Sum of prices.
    price_sum: u64,
}

impl Tally {
    const fn record(&mut self, dwelling: &Dwelling) {
        if dwelling.is_vacant() {
            self.vacant = self.vacant.saturating_add(1);
        } else {
            self.occupied = self.occupied.saturating_add(1);
        }
        self.price_sum = self.price_sum.saturating_add(dwelling.price as u64);
    }

    const fn merge(&mut self, other: &Self) {
        self.vacant = self.vacant.saturating_add(other.vacant);
        self.occupied = self.occupied.saturating_add(other.occupied);
        self.price_sum = self.price_sum.saturating_add(other.price_sum);
    }

    const fn total(&self) -> u64 {
        self.vacant.saturating_add(self.occupied)
    }
}

/// Partition-local accumulator filled by one scan task.
#[derive(Debug, Clone)]
struct PartialCounts {
    /// Per dwelling type, market-wide.
    by_type: [Tally; TYPE_COUNT],
    /// Per region, split by dwelling type.
    by_region: BTreeMap<RegionId, [Tally; TYPE_COUNT]>,
    /// Dwellings per quality level (index `level - 1`).
    quality: Vec<u64>,
    /// Dwellings whose zone is missing from the geography.
    unlocated: u64,
}

impl PartialCounts {
    fn new(quality_levels: u8) -> Self {
        Self {
            by_type: [Tally::default(); TYPE_COUNT],
            by_region: BTreeMap::new(),
            quality: vec![0; usize::from(quality_levels)],
            unlocated: 0,
        }
    }

    fn scan(chunk: &[&Dwelling], geography: &Geography, quality_levels: u8) -> Self {
        let mut partial = Self::new(quality_levels);
        for dwelling in chunk {
            partial.record(dwelling, geography);
        }
        partial
    }

    fn record(&mut self, dwelling: &Dwelling, geography: &Geography) {
        let type_index = dwelling.dwelling_type.index();
        if let Some(tally) = self.by_type.get_mut(type_index) {
            tally.record(dwelling);
        }

        match geography.region_of(dwelling.zone) {
            Ok(region) => {
                let tallies = self
                    .by_region
                    .entry(region)
                    .or_insert([Tally::default(); TYPE_COUNT]);
                if let Some(tally) = tallies.get_mut(type_index) {
                    tally.record(dwelling);
                }
            }
            Err(_) => self.unlocated = self.unlocated.saturating_add(1),
        }

        let level = usize::from(dwelling.quality).saturating_sub(1);
        if let Some(count) = self.quality.get_mut(level) {
            *count = count.saturating_add(1);
        }
    }

    fn merge(mut self, other: &Self) -> Self {
        for (mine, theirs) in self.by_type.iter_mut().zip(&other.by_type) {
            mine.merge(theirs);
        }
        for (region, theirs) in &other.by_region {
            let mine = self
                .by_region
                .entry(*region)
                .or_insert([Tally::default(); TYPE_COUNT]);
            for (m, t) in mine.iter_mut().zip(theirs) {
                m.merge(t);
            }
        }
        for (mine, theirs) in self.quality.iter_mut().zip(&other.quality) {
            *mine = mine.saturating_add(*theirs);
        }
        self.unlocated = self.unlocated.saturating_add(other.unlocated);
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Occupancy and price summary for one group of dwellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancySummary {
    /// Number of dwellings.
    pub dwellings: u64,
    /// Vacant dwellings.
    pub vacant: u64,
    /// Occupied dwellings.
    pub occupied: u64,
    /// Average price; 0 when there are no dwellings.
    pub average_price: f64,
    /// `vacant / (vacant + occupied)`; 0 when there are no dwellings.
    pub vacancy_rate: f64,
}

impl OccupancySummary {
    fn from_tally(tally: &Tally) -> Self {
        let total = tally.total();
        let (average_price, vacancy_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                tally.price_sum as f64 / total as f64,
                tally.vacant as f64 / total as f64,
            )
        };
        Self {
            dwellings: total,
            vacant: tally.vacant,
            occupied: tally.occupied,
            average_price,
            vacancy_rate,
        }
    }
}

/// Statistics for one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStatistics {
    /// All dwellings of the region.
    pub overall: OccupancySummary,
    /// Split by dwelling type.
    pub by_type: BTreeMap<DwellingType, OccupancySummary>,
}

/// Market-wide statistics for one simulated year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStatistics {
    /// Region-wide (whole market) summary per dwelling type.
    by_type: BTreeMap<DwellingType, OccupancySummary>,
    /// Per-region summaries; every region of the geography is present.
    by_region: BTreeMap<RegionId, RegionStatistics>,
    /// Dwellings per quality level (index `level - 1`).
    quality_counts: Vec<u64>,
    /// Share of dwellings per quality level (index `level - 1`).
    quality_shares: Vec<f64>,
    /// Whole-market summary.
    overall: OccupancySummary,
}

impl MarketStatistics {
    /// Scan the inventory in parallel with the default chunk size.
    pub fn compute(inventory: &DwellingInventory) -> Self {
        Self::compute_chunked(inventory, DEFAULT_CHUNK_SIZE)
    }

    /// Scan the inventory in parallel, `chunk_size` dwellings per task.
    pub fn compute_chunked(inventory: &DwellingInventory, chunk_size: usize) -> Self {
        let quality_levels = inventory.quality_levels();
        let geography = inventory.geography();
        let dwellings: Vec<&Dwelling> = inventory.all().collect();

        let partials: Vec<PartialCounts> = dwellings
            .par_chunks(chunk_size.max(1))
            .map(|chunk| PartialCounts::scan(chunk, geography, quality_levels))
            .collect();
        let totals = partials
            .iter()
            .fold(PartialCounts::new(quality_levels), PartialCounts::merge);

        if totals.unlocated > 0 {
            warn!(
                unlocated = totals.unlocated,
                "Dwellings outside the geography were skipped in regional statistics"
            );
        }

        let statistics = Self::from_totals(&totals, geography);
        debug!(
            dwellings = statistics.overall.dwellings,
            vacant = statistics.overall.vacant,
            tasks = partials.len(),
            "Market statistics recomputed"
        );
        statistics
    }

    fn from_totals(totals: &PartialCounts, geography: &Geography) -> Self {
        let mut overall_tally = Tally::default();
        let by_type = DwellingType::ALL
            .iter()
            .zip(&totals.by_type)
            .map(|(dwelling_type, tally)| {
                overall_tally.merge(tally);
                (*dwelling_type, OccupancySummary::from_tally(tally))
            })
            .collect();

        let empty = [Tally::default(); TYPE_COUNT];
        let by_region = geography
            .region_ids()
            .chain(totals.by_region.keys().copied())
            .map(|region| {
                let tallies = totals.by_region.get(&region).unwrap_or(&empty);
                let mut region_tally = Tally::default();
                let by_type = DwellingType::ALL
                    .iter()
                    .zip(tallies)
                    .map(|(dwelling_type, tally)| {
                        region_tally.merge(tally);
                        (*dwelling_type, OccupancySummary::from_tally(tally))
                    })
                    .collect();
                (
                    region,
                    RegionStatistics {
                        overall: OccupancySummary::from_tally(&region_tally),
                        by_type,
                    },
                )
            })
            .collect();

        let quality_total: u64 = totals.quality.iter().sum();
        let quality_shares = totals
            .quality
            .iter()
            .map(|&count| {
                if quality_total == 0 {
                    0.0
                } else {
                    count as f64 / quality_total as f64
                }
            })
            .collect();

        Self {
            by_type,
            by_region,
            quality_counts: totals.quality.clone(),
            quality_shares,
            overall: OccupancySummary::from_tally(&overall_tally),
        }
    }

    /// Whole-market summary for a dwelling type.
    pub fn for_type(&self, dwelling_type: DwellingType) -> OccupancySummary {
        self.by_type.get(&dwelling_type).copied().unwrap_or_default()
    }

    /// Average price of a dwelling type across the market (0 if none exist).
    pub fn average_price(&self, dwelling_type: DwellingType) -> f64 {
        self.for_type(dwelling_type).average_price
    }

    /// Vacancy rate of a dwelling type across the market.
    pub fn vacancy_rate(&self, dwelling_type: DwellingType) -> f64 {
        self.for_type(dwelling_type).vacancy_rate
    }

    /// Statistics of a region, if it is part of the geography.
    pub fn region(&self, region: RegionId) -> Option<&RegionStatistics> {
        self.by_region.get(&region)
    }

    /// Iterate over per-region statistics in ascending region order.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &RegionStatistics)> {
        self.by_region.iter().map(|(id, stats)| (*id, stats))
    }

    /// Average price of all dwellings in a region (0 if it has none).
    pub fn regional_average_price(&self, region: RegionId) -> f64 {
        self.region(region).map_or(0.0, |r| r.overall.average_price)
    }

    /// Vacancy rate of all dwellings in a region.
    pub fn regional_vacancy_rate(&self, region: RegionId) -> f64 {
        self.region(region).map_or(0.0, |r| r.overall.vacancy_rate)
    }

    /// Vacancy rate of one dwelling type in one region.
    pub fn vacancy_rate_in_region(&self, region: RegionId, dwelling_type: DwellingType) -> f64 {
        self.region(region)
            .and_then(|r| r.by_type.get(&dwelling_type))
            .map_or(0.0, |s| s.vacancy_rate)
    }

    /// Number of dwellings of one type in one region.
    pub fn dwelling_count(&self, region: RegionId, dwelling_type: DwellingType) -> u64 {
        self.region(region)
            .and_then(|r| r.by_type.get(&dwelling_type))
            .map_or(0, |s| s.dwellings)
    }

    /// Dwellings per quality level (index `level - 1`).
    pub fn quality_counts(&self) -> &[u64] {
        &self.quality_counts
    }

    /// Share of dwellings per quality level (index `level - 1`).
    pub fn quality_shares(&self) -> &[f64] {
        &self.quality_shares
    }

    /// Whole-market summary.
    pub const fn overall(&self) -> OccupancySummary {
        self.overall
    }
}

//! Transport collaborators consumed by the choice model.
//!
//! Travel-time computation and accessibility indicators belong to the
//! transport model, which lives outside this workspace. The traits here are
//! the seam: [`TravelTimes`] answers scalar origin/destination queries,
//! [`Accessibility`] supplies zone and region indicators on a 0-100 scale,
//! and [`CommutingTimeProbability`] turns a commute duration into a
//! willingness-to-commute factor in `[0, 1]`.
//!
//! [`TravelTimeTable`] and [`AccessibilityTable`] are in-memory providers
//! for tests and the demo binary.

use std::collections::BTreeMap;

use housing_market::Geography;
use housing_types::{RegionId, TransportMode, ZoneId};
use serde::{Deserialize, Serialize};

/// Travel-time provider. All durations are in minutes.
pub trait TravelTimes: Send + Sync {
    /// Duration from `origin` to `destination` departing at `time_of_day_s`
    /// seconds after midnight.
    fn travel_time(
        &self,
        origin: ZoneId,
        destination: ZoneId,
        time_of_day_s: u32,
        mode: TransportMode,
    ) -> f64;

    /// Duration from `origin` to the closest zone of `region`.
    fn travel_time_to_region(
        &self,
        origin: ZoneId,
        region: RegionId,
        time_of_day_s: u32,
        mode: TransportMode,
    ) -> f64;
}

/// Accessibility indicators, each on a 0-100 scale.
pub trait Accessibility: Send + Sync {
    /// Car accessibility of a zone.
    fn auto_accessibility(&self, zone: ZoneId) -> f64;

    /// Public transport accessibility of a zone.
    fn transit_accessibility(&self, zone: ZoneId) -> f64;

    /// Aggregate accessibility of a region.
    fn regional_accessibility(&self, region: RegionId) -> f64;
}

/// Maps a commute duration to a factor in `[0, 1]`.
pub trait CommutingTimeProbability: Send + Sync {
    /// Factor for a commute of `minutes` by `mode`.
    fn probability(&self, minutes: f64, mode: TransportMode) -> f64;
}

// ---------------------------------------------------------------------------
// Exponential decay
// ---------------------------------------------------------------------------

/// `exp(-rate * minutes)` with a separate, steeper rate for autonomous
/// vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialCommute {
    /// Decay per minute for conventional modes.
    pub rate: f64,
    /// Decay per minute for [`TransportMode::Autonomous`].
    pub autonomous_rate: f64,
}

impl ExponentialCommute {
    /// Default decay per minute for conventional modes.
    pub const DEFAULT_RATE: f64 = 0.2;

    /// Default decay per minute for autonomous vehicles.
    pub const DEFAULT_AUTONOMOUS_RATE: f64 = 1.2;
}

impl Default for ExponentialCommute {
    fn default() -> Self {
        Self {
            rate: Self::DEFAULT_RATE,
            autonomous_rate: Self::DEFAULT_AUTONOMOUS_RATE,
        }
    }
}

impl CommutingTimeProbability for ExponentialCommute {
    fn probability(&self, minutes: f64, mode: TransportMode) -> f64 {
        let rate = match mode {
            TransportMode::Autonomous => self.autonomous_rate,
            TransportMode::Car | TransportMode::Transit => self.rate,
        };
        (-rate * minutes.max(0.0)).exp()
    }
}

// ---------------------------------------------------------------------------
// Table providers
// ---------------------------------------------------------------------------

/// Zone-to-zone travel times held in memory, independent of time of day
/// and mode.
#[derive(Debug, Clone, Default)]
pub struct TravelTimeTable {
    /// Minutes per (origin, destination) pair.
    times: BTreeMap<(ZoneId, ZoneId), f64>,
    /// Member zones per region.
    regions: BTreeMap<RegionId, Vec<ZoneId>>,
    /// Duration assumed for pairs missing from the table.
    fallback: f64,
}

impl TravelTimeTable {
    /// Create an empty table over the regions of `geography`.
    pub fn new(geography: &Geography, fallback: f64) -> Self {
        let regions = geography
            .regions()
            .map(|region| (region.id, region.zones.iter().copied().collect()))
            .collect();
        Self {
            times: BTreeMap::new(),
            regions,
            fallback,
        }
    }

    /// Set the duration between two zones in both directions.
    pub fn insert(&mut self, a: ZoneId, b: ZoneId, minutes: f64) {
        self.times.insert((a, b), minutes);
        self.times.insert((b, a), minutes);
    }

    fn lookup(&self, origin: ZoneId, destination: ZoneId) -> f64 {
        self.times
            .get(&(origin, destination))
            .copied()
            .unwrap_or(self.fallback)
    }
}

impl TravelTimes for TravelTimeTable {
    fn travel_time(
        &self,
        origin: ZoneId,
        destination: ZoneId,
        _time_of_day_s: u32,
        _mode: TransportMode,
    ) -> f64 {
        self.lookup(origin, destination)
    }

    fn travel_time_to_region(
        &self,
        origin: ZoneId,
        region: RegionId,
        _time_of_day_s: u32,
        _mode: TransportMode,
    ) -> f64 {
        self.regions
            .get(&region)
            .and_then(|zones| {
                zones
                    .iter()
                    .map(|zone| self.lookup(origin, *zone))
                    .min_by(f64::total_cmp)
            })
            .unwrap_or(self.fallback)
    }
}

/// Accessibility indicators held in memory; missing entries read as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessibilityTable {
    /// Car accessibility per zone.
    pub auto: BTreeMap<ZoneId, f64>,
    /// Transit accessibility per zone.
    pub transit: BTreeMap<ZoneId, f64>,
    /// Accessibility per region.
    pub regional: BTreeMap<RegionId, f64>,
}

impl Accessibility for AccessibilityTable {
    fn auto_accessibility(&self, zone: ZoneId) -> f64 {
        self.auto.get(&zone).copied().unwrap_or(0.0)
    }

    fn transit_accessibility(&self, zone: ZoneId) -> f64 {
        self.transit.get(&zone).copied().unwrap_or(0.0)
    }

    fn regional_accessibility(&self, region: RegionId) -> f64 {
        self.regional.get(&region).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_commute_decays_faster_for_autonomous() {
        let commute = ExponentialCommute::default();
        assert!((commute.probability(0.0, TransportMode::Car) - 1.0).abs() < 1e-12);
        assert!((commute.probability(10.0, TransportMode::Car) - (-2.0_f64).exp()).abs() < 1e-12);
        assert!((commute.probability(10.0, TransportMode::Autonomous) - (-12.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn region_time_is_the_closest_member_zone() {
        let geography = Geography::from_zones([
            (ZoneId::new(1), RegionId::new(1)),
            (ZoneId::new(2), RegionId::new(2)),
            (ZoneId::new(3), RegionId::new(2)),
        ])
        .unwrap_or_default();
        let mut table = TravelTimeTable::new(&geography, 60.0);
        table.insert(ZoneId::new(1), ZoneId::new(2), 25.0);
        table.insert(ZoneId::new(1), ZoneId::new(3), 12.0);

        let to_region = table.travel_time_to_region(ZoneId::new(1), RegionId::new(2), 28_800, TransportMode::Car);
        assert!((to_region - 12.0).abs() < 1e-12);
        let missing = table.travel_time(ZoneId::new(2), ZoneId::new(3), 28_800, TransportMode::Car);
        assert!((missing - 60.0).abs() < 1e-12);
        let unknown = table.travel_time_to_region(ZoneId::new(1), RegionId::new(9), 0, TransportMode::Car);
        assert!((unknown - 60.0).abs() < 1e-12);
    }

    #[test]
    fn accessibility_table_defaults_to_zero() {
        let mut table = AccessibilityTable::default();
        table.auto.insert(ZoneId::new(1), 80.0);
        assert!((table.auto_accessibility(ZoneId::new(1)) - 80.0).abs() < 1e-12);
        assert!(table.transit_accessibility(ZoneId::new(1)).abs() < f64::EPSILON);
        assert!(table.regional_accessibility(RegionId::new(1)).abs() < f64::EPSILON);
    }
}

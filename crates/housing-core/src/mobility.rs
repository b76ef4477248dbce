//! Who relocates in a given year.
//!
//! Demographic and mobility decisions belong to collaborators outside this
//! workspace. A [`MobilitySource`] is the seam: once per year it returns the
//! households that search for a new dwelling, in the order their searches
//! run.

use std::collections::BTreeMap;

use housing_choice::SimulationRng;
use housing_types::{Household, HouseholdId};

/// Decides which households relocate in a year.
pub trait MobilitySource {
    /// Households searching this year, in processing order.
    fn relocating(
        &mut self,
        year: u32,
        households: &BTreeMap<HouseholdId, Household>,
        rng: &mut SimulationRng,
    ) -> Vec<HouseholdId>;
}

/// Every household independently relocates with a fixed probability.
/// Processing order is ascending household id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRateMobility {
    /// Yearly relocation probability.
    rate: f64,
}

impl FixedRateMobility {
    /// Create a source with the given yearly rate, clamped to `[0, 1]`.
    pub const fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
        }
    }

    /// The yearly relocation probability.
    pub const fn rate(&self) -> f64 {
        self.rate
    }
}

impl MobilitySource for FixedRateMobility {
    fn relocating(
        &mut self,
        _year: u32,
        households: &BTreeMap<HouseholdId, Household>,
        rng: &mut SimulationRng,
    ) -> Vec<HouseholdId> {
        households
            .keys()
            .filter(|_| rng.chance(self.rate))
            .copied()
            .collect()
    }
}

/// Replays an explicit list of relocating households per year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedMobility {
    /// Relocating households per year, in processing order.
    by_year: BTreeMap<u32, Vec<HouseholdId>>,
}

impl ScriptedMobility {
    /// Create an empty script.
    pub const fn new() -> Self {
        Self {
            by_year: BTreeMap::new(),
        }
    }

    /// Set the households relocating in `year`.
    #[must_use]
    pub fn with_year(mut self, year: u32, households: Vec<HouseholdId>) -> Self {
        self.by_year.insert(year, households);
        self
    }
}

impl MobilitySource for ScriptedMobility {
    fn relocating(
        &mut self,
        year: u32,
        _households: &BTreeMap<HouseholdId, Household>,
        _rng: &mut SimulationRng,
    ) -> Vec<HouseholdId> {
        self.by_year.get(&year).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn households(count: u64) -> BTreeMap<HouseholdId, Household> {
        (1..=count)
            .map(|id| {
                (
                    HouseholdId::new(id),
                    Household {
                        id: HouseholdId::new(id),
                        persons: Vec::new(),
                        autos: 0,
                        dwelling: None,
                        group: None,
                        attributes: BTreeMap::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn fixed_rate_extremes() {
        let population = households(50);
        let mut rng = SimulationRng::from_seed(9);
        assert!(FixedRateMobility::new(0.0).relocating(2011, &population, &mut rng).is_empty());
        let everyone = FixedRateMobility::new(1.0).relocating(2011, &population, &mut rng);
        assert_eq!(everyone.len(), 50);
        assert!(everyone.windows(2).all(|pair| pair.first() < pair.last()));
        assert!((FixedRateMobility::new(3.0).rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fixed_rate_is_reproducible() {
        let population = households(200);
        let mut a = SimulationRng::from_seed(5);
        let mut b = SimulationRng::from_seed(5);
        let mut source = FixedRateMobility::new(0.3);
        assert_eq!(
            source.relocating(2011, &population, &mut a),
            source.relocating(2011, &population, &mut b)
        );
    }

    #[test]
    fn scripted_replays_per_year() {
        let population = households(3);
        let mut rng = SimulationRng::from_seed(1);
        let mut script = ScriptedMobility::new()
            .with_year(2012, vec![HouseholdId::new(3), HouseholdId::new(1)]);
        assert!(script.relocating(2011, &population, &mut rng).is_empty());
        assert_eq!(
            script.relocating(2012, &population, &mut rng),
            vec![HouseholdId::new(3), HouseholdId::new(1)]
        );
    }
}

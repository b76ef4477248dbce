//! Weighted random selection and the run-wide random source.
//!
//! Both search stages draw through [`select_weighted`]: one uniform draw
//! scaled by the weight sum, followed by a linear scan of the cumulative
//! weights. All randomness of a run comes from a single [`SimulationRng`],
//! seeded once at simulation start and never re-seeded, so a run replays
//! exactly under a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The run-wide random source.
#[derive(Debug, Clone)]
pub struct SimulationRng {
    /// Seed the generator was created from.
    seed: u64,
    /// Underlying generator.
    rng: StdRng,
}

impl SimulationRng {
    /// Seed the generator. Call once per run.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed the generator was created from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Bernoulli draw with success probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Direct access for collaborators that need other distributions.
    pub const fn inner_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Draw an index with probability proportional to its weight.
///
/// `sum` must be the sum of `weights`; callers short-circuit a zero sum
/// before calling. Returns `None` when no weight is positive. If rounding
/// leaves the scaled draw past the last cumulative weight, the last
/// positive weight is selected.
pub fn select_weighted(weights: &[f64], sum: f64, rng: &mut SimulationRng) -> Option<usize> {
    if sum <= 0.0 || !sum.is_finite() {
        return None;
    }
    let target = rng.unit() * sum;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(index);
        if target < cumulative {
            return Some(index);
        }
    }
    last_positive
}

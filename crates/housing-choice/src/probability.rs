//! Conversion of dwelling utilities to selection weights.

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// Shape applied to a dwelling utility to obtain its stage-2 weight.
///
/// Every shape yields a finite, non-negative weight. NaN and negative
/// results count as 0; results past the `f64` range saturate at
/// [`f64::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbabilityShape {
    /// `exp(scale * utility)`.
    Exponential {
        /// Multiplier on the utility.
        #[serde(default = "default_scale")]
        scale: f64,
    },
    /// The utility itself.
    Linear,
    /// `utility ^ exponent`.
    Power {
        /// Exponent on the utility.
        exponent: f64,
    },
}

const fn default_scale() -> f64 {
    1.0
}

impl Default for ProbabilityShape {
    fn default() -> Self {
        Self::Exponential {
            scale: default_scale(),
        }
    }
}

impl ProbabilityShape {
    /// Weight of a dwelling with the given utility.
    pub fn weight(self, utility: f64) -> f64 {
        let raw = match self {
            Self::Exponential { scale } => (scale * utility).exp(),
            Self::Linear => utility,
            Self::Power { exponent } => utility.max(0.0).powf(exponent),
        };
        saturate(raw)
    }

    /// Weights of a pool of utilities, in pool order.
    ///
    /// Only weight ratios matter to the draw. Exponential weights are taken
    /// relative to the largest scaled utility of the pool, so a dwelling
    /// whose `exp` would overflow keeps the top weight. If the weights of
    /// any shape would still sum past the `f64` range they are divided by
    /// the largest one.
    pub fn pool_weights(self, utilities: &[f64]) -> Vec<f64> {
        let weights: Vec<f64> = match self {
            Self::Exponential { scale } => {
                let peak = utilities
                    .iter()
                    .map(|utility| scale * utility)
                    .filter(|scaled| scaled.is_finite())
                    .fold(f64::NEG_INFINITY, f64::max);
                let peak = if peak.is_finite() { peak } else { 0.0 };
                utilities
                    .iter()
                    .map(|utility| saturate((scale * utility - peak).exp()))
                    .collect()
            }
            Self::Linear | Self::Power { .. } => {
                utilities.iter().map(|utility| self.weight(*utility)).collect()
            }
        };
        let sum: f64 = weights.iter().sum();
        let peak = weights.iter().copied().fold(0.0, f64::max);
        if sum.is_finite() || peak <= 0.0 {
            weights
        } else {
            weights.into_iter().map(|weight| weight / peak).collect()
        }
    }

    /// Check the shape's parameters are finite.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::InvalidParameter`] for a non-finite
    /// parameter.
    pub fn validate(self) -> Result<(), StrategyError> {
        let (name, value) = match self {
            Self::Exponential { scale } => ("search.probability_shape.scale", scale),
            Self::Linear => return Ok(()),
            Self::Power { exponent } => ("search.probability_shape.exponent", exponent),
        };
        if value.is_finite() {
            Ok(())
        } else {
            Err(StrategyError::InvalidParameter {
                name,
                value,
                reason: "must be finite",
            })
        }
    }
}

/// NaN and negatives to 0, overflow to [`f64::MAX`].
const fn saturate(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, f64::MAX) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_is_the_default() {
        let shape = ProbabilityShape::default();
        assert!((shape.weight(0.0) - 1.0).abs() < 1e-12);
        assert!((shape.weight(1.0) - 1.0_f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn negative_and_nan_weights_clamp_to_zero() {
        assert!(ProbabilityShape::Linear.weight(-0.5).abs() < f64::EPSILON);
        assert!(ProbabilityShape::Linear.weight(f64::NAN).abs() < f64::EPSILON);
        assert!(ProbabilityShape::default().weight(f64::NEG_INFINITY).abs() < f64::EPSILON);
        assert!((ProbabilityShape::Power { exponent: 2.0 }.weight(0.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn overflowing_weight_saturates() {
        let huge = ProbabilityShape::Exponential { scale: 1.0 }.weight(1_000.0);
        assert!(huge > 0.0);
        assert!(huge.is_finite());
        assert!(ProbabilityShape::Linear.weight(f64::INFINITY).is_finite());
    }

    #[test]
    fn pool_weights_keep_the_best_dwelling_on_top() {
        let shape = ProbabilityShape::Exponential { scale: 1.0 };
        let weights = shape.pool_weights(&[1.0, 1_000.0, 999.0, f64::NAN]);
        assert!(weights.iter().sum::<f64>().is_finite());
        let [low, best, runner_up, nan] = weights.as_slice() else {
            panic!("one weight per utility");
        };
        assert!((best - 1.0).abs() < 1e-12);
        assert!((runner_up - (-1.0_f64).exp()).abs() < 1e-12);
        assert!(low < runner_up);
        assert!(nan.abs() < f64::EPSILON);
    }

    #[test]
    fn pool_weights_keep_ratios_in_range() {
        let shape = ProbabilityShape::Exponential { scale: 0.5 };
        let weights = shape.pool_weights(&[0.0, 2.0, 4.0]);
        let [first, _, last] = weights.as_slice() else {
            panic!("one weight per utility");
        };
        let expected = shape.weight(4.0) / shape.weight(0.0);
        assert!((last / first - expected).abs() < 1e-9);

        let linear = ProbabilityShape::Linear.pool_weights(&[f64::MAX, f64::MAX, -1.0]);
        assert!(linear.iter().sum::<f64>().is_finite());
        assert!(linear.first().is_some_and(|w| (w - 1.0).abs() < f64::EPSILON));
        assert!(linear.last().is_some_and(|w| w.abs() < f64::EPSILON));
    }

    #[test]
    fn empty_pool_has_no_weights() {
        assert!(ProbabilityShape::default().pool_weights(&[]).is_empty());
    }

    #[test]
    fn deserializes_tagged_yaml() {
        let shape: Result<ProbabilityShape, _> = serde_yml::from_str("kind: exponential\n");
        assert_eq!(shape.ok(), Some(ProbabilityShape::Exponential { scale: 1.0 }));
        let power: Result<ProbabilityShape, _> = serde_yml::from_str("kind: power\nexponent: 2.0\n");
        assert_eq!(power.ok(), Some(ProbabilityShape::Power { exponent: 2.0 }));
        assert!(serde_yml::from_str::<ProbabilityShape>("kind: cubic\n").is_err());
    }

    #[test]
    fn non_finite_parameter_is_rejected() {
        assert!(ProbabilityShape::Power { exponent: f64::INFINITY }.validate().is_err());
        assert!(ProbabilityShape::Linear.validate().is_ok());
    }
}

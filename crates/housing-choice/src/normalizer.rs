//! Stage-1 region weight normalization.
//!
//! Raw regional utility is rescaled by a market signal before the region
//! draw. Exactly one policy is active per run; the enum is closed so a
//! policy can never fall through into another.
//!
//! | policy | factor |
//! |--------|--------|
//! | `no_normalization` | 1 |
//! | `vacant_dwellings` | vacant dwellings in the region |
//! | `vacant_share` | region vacancies / all vacancies (0 if none) |
//! | `dampened_vacancy_rate` | `min(5, poly(vacancy %)) / 100 * vacant`, 0 without vacancy |
//! | `population` | persons in the region |
//! | `power_of_population` | `population ^ exponent` |

use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// Market signals of one region at the time of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionSignals {
    /// Vacant dwellings currently in the region.
    pub vacant: usize,
    /// Vacant dwellings currently in all regions.
    pub total_vacant: usize,
    /// Regional vacancy rate from this year's statistics, in `[0, 1]`.
    pub vacancy_rate: f64,
    /// Persons living in the region this year.
    pub population: u64,
}

/// Stage-1 normalizer policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RegionNormalizer {
    /// Keep the raw utility.
    NoNormalization,
    /// Multiply by the number of vacant dwellings.
    VacantDwellings,
    /// Multiply by the region's share of all vacant dwellings.
    VacantShare,
    /// Multiply by the vacancies assumed ready to move in.
    DampenedVacancyRate,
    /// Multiply by the population.
    Population,
    /// Multiply by the population raised to `exponent`.
    PowerOfPopulation {
        /// Exponent on the population.
        #[serde(default = "default_population_exponent")]
        exponent: f64,
    },
}

const fn default_population_exponent() -> f64 {
    0.5
}

impl Default for RegionNormalizer {
    fn default() -> Self {
        Self::PowerOfPopulation {
            exponent: default_population_exponent(),
        }
    }
}

/// Cap on the share of vacancies (in percent) assumed ready to move in.
const DAMPENED_CAP_PERCENT: f64 = 5.0;

/// Percentage of vacancies ready to move in, given the vacancy rate in
/// percent.
fn dampened_ready_percent(vacancy_percent: f64) -> f64 {
    let x = vacancy_percent;
    let y = 1.4186e-3 * x.powi(3) - 6.7846e-2 * x.powi(2) + 1.0292 * x + 4.5485e-3;
    y.min(DAMPENED_CAP_PERCENT)
}

impl RegionNormalizer {
    /// Factor the region's raw utility is multiplied by.
    pub fn factor(self, signals: &RegionSignals) -> f64 {
        let vacant = signals.vacant as f64;
        match self {
            Self::NoNormalization => 1.0,
            Self::VacantDwellings => vacant,
            Self::VacantShare => {
                if signals.total_vacant == 0 {
                    0.0
                } else {
                    vacant / signals.total_vacant as f64
                }
            }
            Self::DampenedVacancyRate => {
                if signals.vacant == 0 {
                    0.0
                } else {
                    let ready = dampened_ready_percent(signals.vacancy_rate * 100.0);
                    (ready / 100.0 * vacant).max(0.0)
                }
            }
            Self::Population => signals.population as f64,
            Self::PowerOfPopulation { exponent } => (signals.population as f64).powf(exponent),
        }
    }

    /// Policy name as written in configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoNormalization => "no_normalization",
            Self::VacantDwellings => "vacant_dwellings",
            Self::VacantShare => "vacant_share",
            Self::DampenedVacancyRate => "dampened_vacancy_rate",
            Self::Population => "population",
            Self::PowerOfPopulation { .. } => "power_of_population",
        }
    }

    /// Check the policy's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::InvalidParameter`] for a non-finite or
    /// negative population exponent.
    pub fn validate(self) -> Result<(), StrategyError> {
        match self {
            Self::PowerOfPopulation { exponent } if !exponent.is_finite() || exponent < 0.0 => {
                Err(StrategyError::InvalidParameter {
                    name: "search.normalizer.exponent",
                    value: exponent,
                    reason: "must be finite and non-negative",
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> RegionSignals {
        RegionSignals {
            vacant: 10,
            total_vacant: 40,
            vacancy_rate: 0.05,
            population: 400,
        }
    }

    #[test]
    fn each_policy_applies_only_its_own_factor() {
        let s = signals();
        assert!((RegionNormalizer::NoNormalization.factor(&s) - 1.0).abs() < 1e-12);
        assert!((RegionNormalizer::VacantDwellings.factor(&s) - 10.0).abs() < 1e-12);
        assert!((RegionNormalizer::VacantShare.factor(&s) - 0.25).abs() < 1e-12);
        assert!((RegionNormalizer::Population.factor(&s) - 400.0).abs() < 1e-12);
        assert!((RegionNormalizer::default().factor(&s) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn dampened_vacancy_follows_capped_polynomial() {
        let s = signals();
        let x: f64 = 5.0;
        let expected = (1.4186e-3 * x.powi(3) - 6.7846e-2 * x.powi(2) + 1.0292 * x + 4.5485e-3)
            .min(5.0)
            / 100.0
            * 10.0;
        assert!((RegionNormalizer::DampenedVacancyRate.factor(&s) - expected).abs() < 1e-12);

        let saturated = RegionSignals {
            vacancy_rate: 0.5,
            ..s
        };
        assert!((RegionNormalizer::DampenedVacancyRate.factor(&saturated) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn no_vacancy_means_zero_for_vacancy_policies() {
        let empty = RegionSignals {
            vacant: 0,
            total_vacant: 0,
            vacancy_rate: 0.0,
            population: 10,
        };
        assert!(RegionNormalizer::VacantDwellings.factor(&empty).abs() < f64::EPSILON);
        assert!(RegionNormalizer::VacantShare.factor(&empty).abs() < f64::EPSILON);
        assert!(RegionNormalizer::DampenedVacancyRate.factor(&empty).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_policy_tags() {
        let parsed: Result<RegionNormalizer, _> = serde_yml::from_str("policy: vacant_share\n");
        assert_eq!(parsed.ok(), Some(RegionNormalizer::VacantShare));
        let power: Result<RegionNormalizer, _> = serde_yml::from_str("policy: power_of_population\n");
        assert_eq!(power.ok(), Some(RegionNormalizer::default()));
        assert!(serde_yml::from_str::<RegionNormalizer>("policy: vacDd\n").is_err());
    }

    #[test]
    fn negative_exponent_is_rejected() {
        assert!(RegionNormalizer::PowerOfPopulation { exponent: -1.0 }.validate().is_err());
        assert_eq!(RegionNormalizer::Population.name(), "population");
    }
}

//! Utility strategies and the engine that delegates to them.
//!
//! A [`UtilityStrategy`] turns dwelling or region attributes plus household
//! attributes into a scalar utility. The [`UtilityEngine`] holds exactly one
//! strategy, selected by key at setup, and only forwards calls to it.
//!
//! The sub-utility conversions shared by the built-in strategies live in
//! [`terms`]. Each maps a raw attribute onto `[0, 1]`:
//!
//! | term | conversion |
//! |------|------------|
//! | quality | `quality / quality_levels` |
//! | size | `min(bedrooms, largest) / largest` |
//! | accessibility | `accessibility / 100`, clamped |
//! | price | `max(0, 1 - cumulative rent share up to the price's category)` |
//! | work distance | product over workers of `commute(max(1, minutes))` |

use housing_market::{MarketReference, MarketStatistics};
use housing_types::{Dwelling, Household, RegionId, TransportMode};
use serde::{Deserialize, Serialize};

use crate::accessibility::{Accessibility, CommutingTimeProbability, TravelTimes};
use crate::demographics::RegionalDemographics;
use crate::error::StrategyError;
use crate::group::{HouseholdGroup, RegionGroup};

/// Read-only inputs shared by every utility evaluation within one year.
#[derive(Clone, Copy)]
pub struct UtilityContext<'a> {
    /// This year's market statistics.
    pub statistics: &'a MarketStatistics,
    /// Values frozen at setup.
    pub reference: &'a MarketReference,
    /// This year's population counts.
    pub demographics: &'a RegionalDemographics,
    /// Accessibility indicators.
    pub accessibility: &'a dyn Accessibility,
    /// Travel-time provider.
    pub travel_times: &'a dyn TravelTimes,
    /// Commute duration to factor.
    pub commute: &'a dyn CommutingTimeProbability,
    /// Departure time for commute queries, seconds after midnight.
    pub peak_hour_s: u32,
    /// Mode for commute queries.
    pub mode: TransportMode,
}

// ---------------------------------------------------------------------------
// Sub-utility terms
// ---------------------------------------------------------------------------

/// Conversions from raw attributes to `[0, 1]` sub-utilities.
pub mod terms {
    use housing_market::RentShareTable;
    use housing_types::{Household, IncomeCategory, ZoneId};

    use super::UtilityContext;

    /// Quality level relative to the number of levels.
    pub fn quality(quality: u8, levels: u8) -> f64 {
        if levels == 0 {
            return 0.0;
        }
        (f64::from(quality) / f64::from(levels)).clamp(0.0, 1.0)
    }

    /// Bedrooms relative to the largest dwelling of the initial market.
    pub fn size(bedrooms: u32, largest: u32) -> f64 {
        if largest == 0 {
            return 0.0;
        }
        f64::from(bedrooms.min(largest)) / f64::from(largest)
    }

    /// Accessibility on a 0-100 scale, rescaled.
    pub fn accessibility(value: f64) -> f64 {
        (value / 100.0).clamp(0.0, 1.0)
    }

    /// Affordability of a price for an income category.
    pub fn price(price: u32, income: IncomeCategory, rent_shares: &RentShareTable) -> f64 {
        (1.0 - rent_shares.cumulative_share(income, price)).max(0.0)
    }

    /// Product of commute factors from `zone` to every worker's job zone;
    /// 1 for households without workers.
    pub fn work_distance(household: &Household, zone: ZoneId, context: &UtilityContext<'_>) -> f64 {
        household.job_zones().fold(1.0, |product, job| {
            let minutes = context
                .travel_times
                .travel_time(zone, job, context.peak_hour_s, context.mode)
                .max(1.0);
            product * context.commute.probability(minutes, context.mode)
        })
    }
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// A pluggable utility function.
///
/// Implementations must be stateless across calls. Any caching of
/// sub-utilities belongs to a single call and must not survive it.
pub trait UtilityStrategy: Send + Sync {
    /// Key this strategy is registered under.
    fn key(&self) -> &'static str;

    /// Utility of a dwelling for one household.
    fn dwelling_utility(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        dwelling: &Dwelling,
        context: &UtilityContext<'_>,
    ) -> f64;

    /// Base utility of a region for a household group, before commute
    /// weighting and normalization.
    fn region_utility(
        &self,
        group: &RegionGroup,
        region: RegionId,
        context: &UtilityContext<'_>,
    ) -> f64;
}

/// Weights of the sub-utilities combined by the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilityCoefficients {
    /// Dwelling quality weight.
    #[serde(default = "default_quality")]
    pub quality: f64,
    /// Dwelling size weight.
    #[serde(default = "default_size")]
    pub size: f64,
    /// Dwelling price weight.
    #[serde(default = "default_price")]
    pub price: f64,
    /// Zone car accessibility weight.
    #[serde(default = "default_auto_access")]
    pub auto_access: f64,
    /// Zone transit accessibility weight.
    #[serde(default = "default_transit_access")]
    pub transit_access: f64,
    /// Regional price weight.
    #[serde(default = "default_region_price")]
    pub region_price: f64,
    /// Regional accessibility weight.
    #[serde(default = "default_region_access")]
    pub region_access: f64,
    /// Exponent applied to the group share by the group-share strategy.
    #[serde(default = "default_group_share_exponent")]
    pub group_share_exponent: f64,
}

const fn default_quality() -> f64 {
    0.2
}

const fn default_size() -> f64 {
    0.2
}

const fn default_price() -> f64 {
    0.3
}

const fn default_auto_access() -> f64 {
    0.15
}

const fn default_transit_access() -> f64 {
    0.15
}

const fn default_region_price() -> f64 {
    0.6
}

const fn default_region_access() -> f64 {
    0.4
}

const fn default_group_share_exponent() -> f64 {
    0.5
}

impl Default for UtilityCoefficients {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            size: default_size(),
            price: default_price(),
            auto_access: default_auto_access(),
            transit_access: default_transit_access(),
            region_price: default_region_price(),
            region_access: default_region_access(),
            group_share_exponent: default_group_share_exponent(),
        }
    }
}

impl UtilityCoefficients {
    /// Check every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::InvalidParameter`] for the first bad weight.
    pub fn validate(&self) -> Result<(), StrategyError> {
        let weights = [
            ("utility.coefficients.quality", self.quality),
            ("utility.coefficients.size", self.size),
            ("utility.coefficients.price", self.price),
            ("utility.coefficients.auto_access", self.auto_access),
            ("utility.coefficients.transit_access", self.transit_access),
            ("utility.coefficients.region_price", self.region_price),
            ("utility.coefficients.region_access", self.region_access),
            ("utility.coefficients.group_share_exponent", self.group_share_exponent),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(StrategyError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and non-negative",
                });
            }
        }
        Ok(())
    }

    /// Weighted mean of the dwelling sub-utilities (0 if all weights are 0).
    fn dwelling_mean(&self, size: f64, price: f64, quality: f64, auto: f64, transit: f64) -> f64 {
        let total = self.size + self.price + self.quality + self.auto_access + self.transit_access;
        if total <= 0.0 {
            return 0.0;
        }
        (self.size * size
            + self.price * price
            + self.quality * quality
            + self.auto_access * auto
            + self.transit_access * transit)
            / total
    }

    /// Weighted mean of the region sub-utilities (0 if both weights are 0).
    fn region_mean(&self, price: f64, access: f64) -> f64 {
        let total = self.region_price + self.region_access;
        if total <= 0.0 {
            return 0.0;
        }
        (self.region_price * price + self.region_access * access) / total
    }
}

// ---------------------------------------------------------------------------
// Built-in strategies
// ---------------------------------------------------------------------------

/// Weighted mean of quality, size, price and accessibility, scaled by the
/// household's work-distance term. Regions are scored by average price and
/// regional accessibility.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardUtility {
    /// Sub-utility weights.
    pub coefficients: UtilityCoefficients,
}

impl StandardUtility {
    /// Registration key.
    pub const KEY: &'static str = "standard";

    /// Create the strategy with the given weights.
    pub const fn new(coefficients: UtilityCoefficients) -> Self {
        Self { coefficients }
    }
}

impl UtilityStrategy for StandardUtility {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn dwelling_utility(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        dwelling: &Dwelling,
        context: &UtilityContext<'_>,
    ) -> f64 {
        let reference = context.reference;
        let quality = terms::quality(dwelling.quality, reference.quality_levels);
        let size = terms::size(dwelling.bedrooms, reference.largest_bedrooms);
        let price = terms::price(dwelling.price, group.income(), &reference.rent_shares);
        let auto = terms::accessibility(context.accessibility.auto_accessibility(dwelling.zone));
        let transit =
            terms::accessibility(context.accessibility.transit_accessibility(dwelling.zone));
        let work = terms::work_distance(household, dwelling.zone, context);

        self.coefficients
            .dwelling_mean(size, price, quality, auto, transit)
            * work
    }

    fn region_utility(
        &self,
        group: &RegionGroup,
        region: RegionId,
        context: &UtilityContext<'_>,
    ) -> f64 {
        // Regional rent is truncated to whole currency units before bucketing.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rent = context
            .statistics
            .regional_average_price(region)
            .clamp(0.0, f64::from(u32::MAX)) as u32;
        let price = terms::price(rent, group.income, &context.reference.rent_shares);
        let access =
            terms::accessibility(context.accessibility.regional_accessibility(region));
        self.coefficients.region_mean(price, access)
    }
}

/// [`StandardUtility`] with regions additionally scaled by the share of
/// residents sharing the household's group label, raised to
/// `group_share_exponent`. Households without a label are unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupShareUtility {
    /// The underlying standard strategy.
    standard: StandardUtility,
}

impl GroupShareUtility {
    /// Registration key.
    pub const KEY: &'static str = "group_share";

    /// Create the strategy with the given weights.
    pub const fn new(coefficients: UtilityCoefficients) -> Self {
        Self {
            standard: StandardUtility::new(coefficients),
        }
    }
}

impl UtilityStrategy for GroupShareUtility {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn dwelling_utility(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        dwelling: &Dwelling,
        context: &UtilityContext<'_>,
    ) -> f64 {
        self.standard
            .dwelling_utility(household, group, dwelling, context)
    }

    fn region_utility(
        &self,
        group: &RegionGroup,
        region: RegionId,
        context: &UtilityContext<'_>,
    ) -> f64 {
        let base = self.standard.region_utility(group, region, context);
        match &group.label {
            Some(label) => {
                let share = context.demographics.group_share(region, label);
                base * share.powf(self.standard.coefficients.group_share_exponent)
            }
            None => base,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Keys accepted by [`UtilityEngine::from_key`].
pub const STRATEGY_KEYS: [&str; 2] = [StandardUtility::KEY, GroupShareUtility::KEY];

/// Holds the active strategy and forwards every call to it.
pub struct UtilityEngine {
    /// The active strategy.
    strategy: Box<dyn UtilityStrategy>,
}

impl std::fmt::Debug for UtilityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtilityEngine")
            .field("strategy", &self.strategy.key())
            .finish()
    }
}

impl UtilityEngine {
    /// Wrap a custom strategy.
    pub fn new(strategy: Box<dyn UtilityStrategy>) -> Self {
        Self { strategy }
    }

    /// Build one of the built-in strategies by key.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::UnknownStrategy`] for an unregistered key
    /// and [`StrategyError::InvalidParameter`] for invalid weights.
    pub fn from_key(key: &str, coefficients: UtilityCoefficients) -> Result<Self, StrategyError> {
        coefficients.validate()?;
        let strategy: Box<dyn UtilityStrategy> = match key {
            StandardUtility::KEY => Box::new(StandardUtility::new(coefficients)),
            GroupShareUtility::KEY => Box::new(GroupShareUtility::new(coefficients)),
            other => {
                return Err(StrategyError::UnknownStrategy {
                    key: other.to_owned(),
                    expected: STRATEGY_KEYS.join(", "),
                });
            }
        };
        Ok(Self { strategy })
    }

    /// Key of the active strategy.
    pub fn key(&self) -> &'static str {
        self.strategy.key()
    }

    /// Utility of a dwelling for one household.
    pub fn dwelling_utility(
        &self,
        household: &Household,
        group: &HouseholdGroup,
        dwelling: &Dwelling,
        context: &UtilityContext<'_>,
    ) -> f64 {
        self.strategy
            .dwelling_utility(household, group, dwelling, context)
    }

    /// Base utility of a region for a household group.
    pub fn region_utility(
        &self,
        group: &RegionGroup,
        region: RegionId,
        context: &UtilityContext<'_>,
    ) -> f64 {
        self.strategy.region_utility(group, region, context)
    }
}

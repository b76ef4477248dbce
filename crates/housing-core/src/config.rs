//! Configuration loading and typed config structures for the housing market
//! simulation.
//!
//! The canonical configuration lives in `housing-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, a loader, environment overrides, and a validation step that
//! rejects unusable values before any model component is built.

use std::path::Path;

use housing_choice::{
    DEFAULT_INCOME_THRESHOLDS, DEFAULT_MAX_EVALUATED_DWELLINGS, ExponentialCommute,
    IncomeClassifier, ProbabilityShape, RegionNormalizer, RelocationSearch, STRATEGY_KEYS,
    StrategyError, UtilityCoefficients, UtilityEngine,
};
use housing_market::{DEFAULT_CHUNK_SIZE, DEFAULT_RENT_CATEGORIES, DEFAULT_RENT_CATEGORY_WIDTH};
use housing_types::TransportMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Environment variable overriding `run.seed`.
pub const ENV_SEED: &str = "HOUSING_SEED";

/// Environment variable overriding `run.end_year`.
pub const ENV_END_YEAR: &str = "HOUSING_END_YEAR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for environment variable {var}")]
    EnvOverride {
        /// The variable name.
        var: &'static str,
        /// The raw value.
        value: String,
    },

    /// A value is outside its valid range.
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A strategy key or strategy parameter is invalid.
    #[error("invalid strategy configuration: {source}")]
    Strategy {
        /// The underlying strategy error.
        #[from]
        source: StrategyError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `housing-config.yaml`. Every section and field
/// has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run identity, seed, and simulated years.
    #[serde(default)]
    pub run: RunConfig,

    /// Inventory and statistics settings.
    #[serde(default)]
    pub market: MarketConfig,

    /// Relocation search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Utility strategy selection.
    #[serde(default)]
    pub utility: UtilityConfig,

    /// Household classification.
    #[serde(default)]
    pub households: HouseholdsConfig,

    /// Built-in mobility source.
    #[serde(default)]
    pub mobility: MobilityConfig,

    /// Commute query settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generated demo market used by the engine binary.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `HOUSING_SEED` overrides `run.seed`
    /// - `HOUSING_END_YEAR` overrides `run.end_year`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::EnvOverride`] for an unparsable override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvOverride`] for an unparsable value.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvOverride`] for an unparsable value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_SEED) {
            self.run.seed = value.trim().parse().map_err(|_parse| ConfigError::EnvOverride {
                var: ENV_SEED,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_END_YEAR) {
            self.run.end_year =
                value.trim().parse().map_err(|_parse| ConfigError::EnvOverride {
                    var: ENV_END_YEAR,
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    /// Reject values no component can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::Strategy`] for
    /// the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.end_year < self.run.start_year {
            return Err(invalid("run.end_year", "must not precede run.start_year"));
        }
        if self.market.quality_levels == 0 {
            return Err(invalid("market.quality_levels", "must be at least 1"));
        }
        if self.market.rent_category_width == 0 {
            return Err(invalid("market.rent_category_width", "must be at least 1"));
        }
        if self.market.statistics_chunk_size == 0 {
            return Err(invalid("market.statistics_chunk_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mobility.rate) {
            return Err(invalid("mobility.rate", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.synthetic.vacancy_share) {
            return Err(invalid("synthetic.vacancy_share", "must lie in [0, 1]"));
        }
        if self.synthetic.regions == 0 || self.synthetic.zones_per_region == 0 {
            return Err(invalid("synthetic", "needs at least one region and one zone per region"));
        }
        if !self.transport.commute_rate.is_finite() || self.transport.commute_rate < 0.0 {
            return Err(invalid("transport.commute_rate", "must be finite and non-negative"));
        }
        if !self.transport.autonomous_commute_rate.is_finite()
            || self.transport.autonomous_commute_rate < 0.0
        {
            return Err(invalid(
                "transport.autonomous_commute_rate",
                "must be finite and non-negative",
            ));
        }
        let [low, medium, high] = self.households.income_thresholds;
        if !(low < medium && medium < high) {
            return Err(invalid("households.income_thresholds", "must be strictly increasing"));
        }
        if !STRATEGY_KEYS.contains(&self.utility.strategy.as_str()) {
            return Err(StrategyError::UnknownStrategy {
                key: self.utility.strategy.clone(),
                expected: STRATEGY_KEYS.join(", "),
            }
            .into());
        }
        self.utility.coefficients.validate()?;
        self.search_model()?;
        Ok(())
    }

    /// Build the utility engine for the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Strategy`] for an unknown key or bad weights.
    pub fn utility_engine(&self) -> Result<UtilityEngine, ConfigError> {
        Ok(UtilityEngine::from_key(
            &self.utility.strategy,
            self.utility.coefficients,
        )?)
    }

    /// Build the relocation search parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Strategy`] for invalid search parameters.
    pub fn search_model(&self) -> Result<RelocationSearch, ConfigError> {
        Ok(RelocationSearch::new(
            self.search.max_evaluated_dwellings,
            self.search.normalizer,
            self.search.probability_shape,
        )?)
    }

    /// Household classifier for the configured income thresholds.
    pub const fn classifier(&self) -> IncomeClassifier {
        IncomeClassifier::new(self.households.income_thresholds)
    }

    /// Commute probability for the configured decay rates.
    pub const fn commute(&self) -> ExponentialCommute {
        ExponentialCommute {
            rate: self.transport.commute_rate,
            autonomous_rate: self.transport.autonomous_commute_rate,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

/// Run identity and horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Human-readable run name.
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// First simulated year.
    #[serde(default = "default_start_year")]
    pub start_year: u32,

    /// Last simulated year (inclusive).
    #[serde(default = "default_end_year")]
    pub end_year: u32,

    /// Run identifier; a fresh time-ordered UUID unless set.
    #[serde(default = "Uuid::now_v7")]
    pub run_id: Uuid,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            seed: default_seed(),
            start_year: default_start_year(),
            end_year: default_end_year(),
            run_id: Uuid::now_v7(),
        }
    }
}

/// Inventory and statistics settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Number of dwelling quality levels.
    #[serde(default = "default_quality_levels")]
    pub quality_levels: u8,

    /// Price span of one rent category.
    #[serde(default = "default_rent_category_width")]
    pub rent_category_width: u32,

    /// Index of the top rent category.
    #[serde(default = "default_rent_categories")]
    pub rent_categories: u32,

    /// Dwellings per parallel statistics task.
    #[serde(default = "default_statistics_chunk_size")]
    pub statistics_chunk_size: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            quality_levels: default_quality_levels(),
            rent_category_width: default_rent_category_width(),
            rent_categories: default_rent_categories(),
            statistics_chunk_size: default_statistics_chunk_size(),
        }
    }
}

/// Relocation search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cap on dwellings evaluated per household.
    #[serde(default = "default_max_evaluated_dwellings")]
    pub max_evaluated_dwellings: usize,

    /// Stage-1 normalizer policy.
    #[serde(default)]
    pub normalizer: RegionNormalizer,

    /// Stage-2 utility-to-weight shape.
    #[serde(default)]
    pub probability_shape: ProbabilityShape,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_evaluated_dwellings: default_max_evaluated_dwellings(),
            normalizer: RegionNormalizer::default(),
            probability_shape: ProbabilityShape::default(),
        }
    }
}

/// Utility strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityConfig {
    /// Strategy key (`standard` or `group_share`).
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Sub-utility weights.
    #[serde(default)]
    pub coefficients: UtilityCoefficients,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            coefficients: UtilityCoefficients::default(),
        }
    }
}

/// Household classification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdsConfig {
    /// Upper income bounds of the first three income categories.
    #[serde(default = "default_income_thresholds")]
    pub income_thresholds: [u32; 3],
}

impl Default for HouseholdsConfig {
    fn default() -> Self {
        Self {
            income_thresholds: default_income_thresholds(),
        }
    }
}

/// Built-in mobility source settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobilityConfig {
    /// Probability that a household looks for a new dwelling in a year.
    #[serde(default = "default_mobility_rate")]
    pub rate: f64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            rate: default_mobility_rate(),
        }
    }
}

/// Commute query settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Departure time of commute queries, seconds after midnight.
    #[serde(default = "default_peak_hour_seconds")]
    pub peak_hour_seconds: u32,

    /// Mode of commute queries.
    #[serde(default = "default_mode")]
    pub mode: TransportMode,

    /// Commute decay per minute for conventional modes.
    #[serde(default = "default_commute_rate")]
    pub commute_rate: f64,

    /// Commute decay per minute for autonomous vehicles.
    #[serde(default = "default_autonomous_commute_rate")]
    pub autonomous_commute_rate: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            peak_hour_seconds: default_peak_hour_seconds(),
            mode: default_mode(),
            commute_rate: default_commute_rate(),
            autonomous_commute_rate: default_autonomous_commute_rate(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Generated demo market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of regions.
    #[serde(default = "default_synthetic_regions")]
    pub regions: u32,

    /// Zones per region.
    #[serde(default = "default_zones_per_region")]
    pub zones_per_region: u32,

    /// Total dwellings.
    #[serde(default = "default_synthetic_dwellings")]
    pub dwellings: u32,

    /// Share of dwellings left vacant at setup.
    #[serde(default = "default_vacancy_share")]
    pub vacancy_share: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            regions: default_synthetic_regions(),
            zones_per_region: default_zones_per_region(),
            dwellings: default_synthetic_dwellings(),
            vacancy_share: default_vacancy_share(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_run_name() -> String {
    "housing-market".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_start_year() -> u32 {
    2011
}

const fn default_end_year() -> u32 {
    2020
}

const fn default_quality_levels() -> u8 {
    4
}

const fn default_rent_category_width() -> u32 {
    DEFAULT_RENT_CATEGORY_WIDTH
}

const fn default_rent_categories() -> u32 {
    DEFAULT_RENT_CATEGORIES
}

const fn default_statistics_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

const fn default_max_evaluated_dwellings() -> usize {
    DEFAULT_MAX_EVALUATED_DWELLINGS
}

fn default_strategy() -> String {
    "standard".to_owned()
}

const fn default_income_thresholds() -> [u32; 3] {
    DEFAULT_INCOME_THRESHOLDS
}

const fn default_mobility_rate() -> f64 {
    0.1
}

const fn default_peak_hour_seconds() -> u32 {
    28_800
}

const fn default_mode() -> TransportMode {
    TransportMode::Car
}

const fn default_commute_rate() -> f64 {
    ExponentialCommute::DEFAULT_RATE
}

const fn default_autonomous_commute_rate() -> f64 {
    ExponentialCommute::DEFAULT_AUTONOMOUS_RATE
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_synthetic_regions() -> u32 {
    4
}

const fn default_zones_per_region() -> u32 {
    5
}

const fn default_synthetic_dwellings() -> u32 {
    2_000
}

const fn default_vacancy_share() -> f64 {
    0.05
}

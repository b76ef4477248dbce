//! Simulation binary for the housing market model.
//!
//! Wires configuration, a synthetic market, the relocation choice model and
//! the multi-year runner together, then audits the vacancy index once the
//! run is over.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `housing-config.yaml` (or the path given as
//!    the first argument) and validate it
//! 2. Initialize structured logging (tracing)
//! 3. Create the year clock
//! 4. Generate the synthetic market from the run seed
//! 5. Build the choice model and the mobility source
//! 6. Assemble the market state and run every year
//! 7. Audit the vacancy index and log the result

mod error;
mod synthetic;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use housing_core::clock::YearClock;
use housing_core::config::{LoggingConfig, SimulationConfig};
use housing_core::mobility::FixedRateMobility;
use housing_core::runner::{self, YearCallback};
use housing_core::year::{ChoiceModel, MarketState, YearSummary};
use housing_market::{VacancyAudit, audit_vacancy_index};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "housing-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step, the run, or the final
/// audit fails.
fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        run = config.run.name,
        run_id = %config.run.run_id,
        seed = config.run.seed,
        start_year = config.run.start_year,
        end_year = config.run.end_year,
        strategy = config.utility.strategy,
        normalizer = config.search.normalizer.name(),
        "Configuration loaded"
    );

    // 3. Create the year clock.
    let clock = YearClock::from_config(&config.run).map_err(EngineError::from)?;

    // 4. Generate the market.
    let market = synthetic::generate(&config.synthetic, &config.market, config.run.seed)
        .context("generating synthetic market")?;

    // 5. Build the choice model.
    let model = ChoiceModel::from_config(
        &config,
        Box::new(market.accessibility),
        Box::new(market.travel_times),
    )
    .map_err(EngineError::from)?;
    let mut mobility = FixedRateMobility::new(config.mobility.rate);

    // 6. Assemble the state and run.
    let mut state = MarketState::setup(
        market.inventory,
        market.households,
        &config.market,
        model.classifier.as_ref(),
        clock,
        config.run.seed,
    );
    let mut callback = LogCallback;
    let result = runner::run_simulation(
        &mut state,
        &model,
        &mut mobility,
        config.run.run_id,
        &mut callback,
    )
    .map_err(EngineError::from)?;

    // 7. Audit and report.
    runner::log_simulation_end(&result);
    if let VacancyAudit::Inconsistent(discrepancy) = audit_vacancy_index(&state.inventory) {
        return Err(EngineError::Inconsistent {
            discrepancies: discrepancy.count(),
        }
        .into());
    }
    match serde_json::to_string(&result) {
        Ok(json) => info!(result = %json, "Run result"),
        Err(e) => warn!(error = %e, "failed to serialize run result"),
    }
    info!(years = result.years, "housing-engine shutdown complete");
    Ok(())
}

/// Load and validate configuration, falling back to defaults when the
/// file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    let config = if path.exists() {
        SimulationConfig::from_file(path)?
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        config
    };
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Logs the vacancy position of every region after each year.
struct LogCallback;

impl YearCallback for LogCallback {
    fn on_year(&mut self, summary: &YearSummary, state: &MarketState) {
        for region in state.inventory.geography().region_ids() {
            info!(
                year = summary.year,
                region = %region,
                vacant = state.vacant_count_in_region(region),
                moved_in = summary
                    .moves_by_region_and_type
                    .get(&region)
                    .map_or(0, |types| types.values().sum::<usize>()),
                "Regional vacancy"
            );
        }
    }
}

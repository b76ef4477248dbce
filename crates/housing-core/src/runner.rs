//! Multi-year run driver.
//!
//! [`run_simulation`] advances the [`YearClock`] until it is exhausted,
//! running [`run_year`] for each year and handing every summary to a
//! [`YearCallback`]. The run is timed and tagged with its run id.
//!
//! [`YearClock`]: crate::clock::YearClock

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::mobility::MobilitySource;
use crate::year::{self, ChoiceModel, MarketState, YearError, YearSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A year failed to run.
    #[error("year error: {source}")]
    Year {
        /// The underlying year error.
        #[from]
        source: YearError,
    },
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Number of years simulated.
    pub years: u32,
    /// The last year summary, if any year ran.
    pub final_summary: Option<YearSummary>,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
}

/// Callback invoked after each year completes.
pub trait YearCallback {
    /// Called after a year completes.
    fn on_year(&mut self, summary: &YearSummary, state: &MarketState);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl YearCallback for NoOpCallback {
    fn on_year(&mut self, _summary: &YearSummary, _state: &MarketState) {}
}

/// A callback that keeps every year summary.
#[derive(Debug, Default)]
pub struct CollectingCallback {
    /// Summaries in year order.
    pub summaries: Vec<YearSummary>,
}

impl YearCallback for CollectingCallback {
    fn on_year(&mut self, summary: &YearSummary, _state: &MarketState) {
        self.summaries.push(summary.clone());
    }
}

/// Run every remaining year of the clock.
///
/// # Errors
///
/// Returns [`RunnerError`] if a year fails unrecoverably. Individual
/// relocation faults are counted in the year summaries instead.
pub fn run_simulation(
    state: &mut MarketState,
    model: &ChoiceModel,
    mobility: &mut dyn MobilitySource,
    run_id: Uuid,
    callback: &mut dyn YearCallback,
) -> Result<SimulationResult, RunnerError> {
    let started_at = Utc::now();
    let mut years: u32 = 0;
    let mut final_summary: Option<YearSummary> = None;

    info!(
        run_id = %run_id,
        start_year = state.clock.start(),
        end_year = state.clock.end(),
        strategy = model.engine.key(),
        normalizer = model.search.normalizer().name(),
        "Simulation starting"
    );

    while !state.clock.is_finished() {
        let summary = year::run_year(state, model, mobility)?;
        years = years.saturating_add(1);
        callback.on_year(&summary, state);
        final_summary = Some(summary);
    }

    Ok(SimulationResult {
        run_id,
        years,
        final_summary,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    let elapsed_ms = result
        .finished_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        run_id = %result.run_id,
        years = result.years,
        elapsed_ms,
        final_year = result.final_summary.as_ref().map(|s| s.year),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            year = summary.year,
            moved = summary.moved,
            no_match = summary.no_match,
            faults = summary.consistency_faults,
            vacant = summary.vacant_at_end,
            "Final year summary"
        );
    } else {
        warn!("Simulation ended with no years executed");
    }
}

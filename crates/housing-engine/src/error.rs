//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup, synthetic market
//! generation and the run itself, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: housing_core::config::ConfigError,
    },

    /// The year range is unusable.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: housing_core::clock::ClockError,
    },

    /// Building the synthetic market failed.
    #[error("market error: {source}")]
    Market {
        /// The underlying market error.
        #[from]
        source: housing_market::MarketError,
    },

    /// The run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: housing_core::runner::RunnerError,
    },

    /// The synthetic market generator ran out of identifiers.
    #[error("synthetic market error: {message}")]
    Synthetic {
        /// Description of the failure.
        message: String,
    },

    /// The vacancy index disagrees with the dwelling records at the end of
    /// the run.
    #[error("vacancy index inconsistent: {discrepancies} discrepancies")]
    Inconsistent {
        /// Number of discrepancies found by the audit.
        discrepancies: usize,
    },
}

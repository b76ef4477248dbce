//! Simulation year clock.
//!
//! The clock is the single source of truth for the simulated year. It walks
//! from `start_year` to `end_year` inclusive, one year per cycle, with
//! checked arithmetic throughout.

use crate::config::RunConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The end year precedes the start year.
    #[error("invalid year range: {start}..={end}")]
    InvalidRange {
        /// First year.
        start: u32,
        /// Last year.
        end: u32,
    },
}

/// Year counter for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearClock {
    /// First simulated year.
    start: u32,
    /// Last simulated year (inclusive).
    end: u32,
    /// Next year to simulate; `None` once the range is exhausted.
    next: Option<u32>,
}

impl YearClock {
    /// Create a clock over `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidRange`] if `end < start`.
    pub const fn new(start: u32, end: u32) -> Result<Self, ClockError> {
        if end < start {
            return Err(ClockError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            next: Some(start),
        })
    }

    /// Create a clock from the run configuration.
    ///
    /// # Errors
    ///
    /// See [`YearClock::new`].
    pub const fn from_config(config: &RunConfig) -> Result<Self, ClockError> {
        Self::new(config.start_year, config.end_year)
    }

    /// Take the next year to simulate, or `None` when the run is over.
    pub const fn advance(&mut self) -> Option<u32> {
        match self.next {
            Some(year) => {
                self.next = if year < self.end {
                    year.checked_add(1)
                } else {
                    None
                };
                Some(year)
            }
            None => None,
        }
    }

    /// Whether every year has been handed out.
    pub const fn is_finished(&self) -> bool {
        self.next.is_none()
    }

    /// First simulated year.
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Last simulated year.
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Number of years in the run.
    pub const fn total_years(&self) -> u32 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

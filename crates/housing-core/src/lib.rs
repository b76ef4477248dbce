//! Configuration, year cycle, and run orchestration for the housing market
//! simulation.
//!
//! This crate owns the yearly cycle: recompute market statistics, precompute
//! regional utilities, then relocate the year's movers one at a time against
//! the live vacancy index.
//!
//! # Modules
//!
//! - [`clock`] -- Simulated year counter.
//! - [`config`] -- Configuration loading from `housing-config.yaml` into
//!   strongly-typed structs.
//! - [`mobility`] -- [`MobilitySource`] trait and built-in sources of
//!   relocating households.
//! - [`runner`] -- Multi-year driver with per-year callbacks.
//! - [`year`] -- One simulated year and the household move operation.
//!
//! [`MobilitySource`]: mobility::MobilitySource

pub mod clock;
pub mod config;
pub mod mobility;
pub mod runner;
pub mod year;

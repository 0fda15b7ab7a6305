//! Metric storage for perftune.
//!
//! This crate provides a trait-based time-series store interface with a
//! bounded in-memory implementation, plus the rolling-window cache used for
//! seasonal pattern detection.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory_store;
pub mod rolling_window;

pub use trait_::{TimeSeriesStore, StorageError, Result};
pub use memory_store::InMemoryTimeSeriesStore;
pub use rolling_window::{RollingWindowCache, WindowSummary, hour_of_day_key};

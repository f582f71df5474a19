//! Aggregate statistics over accepted trace units.
//!
//! - [`OrderStatistics`]: percentiles, mean and population variance of a
//!   latency sample.
//! - [`HopCountAccumulator`]: hop-count histograms and the ratios derived
//!   from them.
//! - [`csv`]: rendering of both into the report formats.

pub mod csv;
mod hops;
mod order;

pub use hops::{HopCountAccumulator, HopCountReport, HopDistribution, MinimalHopReport};
pub use order::{percentile, percentile_index, OrderStatistics};

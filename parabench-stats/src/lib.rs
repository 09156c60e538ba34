#![warn(missing_docs)]
//! Parabench Statistical Engine
//!
//! Aggregates repeated wall-clock measurements and derives the metrics used to
//! contrast concurrent and parallel execution:
//! - Append-only sample sets of `Duration`s
//! - Mean and sample standard deviation (Bessel's correction)
//! - Speedup and efficiency relative to a parallelism ceiling

mod comparison;
mod sample;
mod summary;

pub use comparison::{LevelComparison, MetricError, compare_levels, efficiency, speedup};
pub use sample::SampleSet;
pub use summary::{Summary, compute_summary};

/// Scale factor turning a speedup ratio into an efficiency percentage
pub const EFFICIENCY_SCALE: f64 = 100.0;

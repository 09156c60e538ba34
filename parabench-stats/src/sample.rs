//! Sample Sets
//!
//! A `SampleSet` holds the elapsed times gathered from repeated runs of one
//! (scenario, parallelism level) pair. It only grows by `record`.

use crate::summary::{Summary, compute_summary};
use std::time::Duration;

/// Ordered, append-only collection of elapsed-time samples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    samples: Vec<Duration>,
}

impl SampleSet {
    /// Create an empty sample set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sample set sized for `capacity` runs
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append one measurement
    pub fn record(&mut self, sample: Duration) {
        self.samples.push(sample);
    }

    /// Number of recorded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded samples in insertion order
    pub fn as_slice(&self) -> &[Duration] {
        &self.samples
    }

    /// Arithmetic mean, `Duration::ZERO` for an empty set
    pub fn mean(&self) -> Duration {
        mean_of(&self.samples)
    }

    /// Sample standard deviation, `Duration::ZERO` when fewer than two samples
    pub fn stddev(&self) -> Duration {
        stddev_of(&self.samples)
    }

    /// Fresh summary of the current samples
    pub fn summary(&self) -> Summary {
        compute_summary(&self.samples)
    }
}

impl FromIterator<Duration> for SampleSet {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Integer mean over whole nanoseconds.
///
/// Accumulates in `u128` so the sum is exact and independent of sample order.
pub(crate) fn mean_of(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }

    let total: u128 = samples.iter().map(Duration::as_nanos).sum();
    nanos_to_duration(total / samples.len() as u128)
}

/// Square root of the mean squared deviation with divisor `n - 1`.
pub(crate) fn stddev_of(samples: &[Duration]) -> Duration {
    if samples.len() <= 1 {
        return Duration::ZERO;
    }

    let mean = mean_of(samples).as_nanos() as f64;
    let variance = samples
        .iter()
        .map(|d| {
            let diff = d.as_nanos() as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;

    // Truncate to whole nanoseconds
    Duration::from_nanos(variance.sqrt() as u64)
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

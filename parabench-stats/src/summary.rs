//! Summary Statistics
//!
//! A `Summary` is recomputed from its samples every time it is requested and
//! never cached alongside them.

use crate::sample::{mean_of, stddev_of};
use std::time::Duration;

/// Summary of one sample set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Arithmetic mean
    pub mean: Duration,
    /// Sample standard deviation
    pub stddev: Duration,
    /// Number of samples
    pub count: usize,
    /// Fastest sample
    pub min: Duration,
    /// Slowest sample
    pub max: Duration,
}

/// Compute the summary of a slice of samples
pub fn compute_summary(samples: &[Duration]) -> Summary {
    if samples.is_empty() {
        return Summary::default();
    }

    Summary {
        mean: mean_of(samples),
        stddev: stddev_of(samples),
        count: samples.len(),
        min: samples.iter().copied().min().unwrap_or_default(),
        max: samples.iter().copied().max().unwrap_or_default(),
    }
}

impl Summary {
    /// Relative standard deviation in percent (0 when the mean is zero)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean.is_zero() {
            0.0
        } else {
            (self.stddev.as_secs_f64() / self.mean.as_secs_f64()) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_summary() {
        let samples: Vec<Duration> = [10, 20, 30].into_iter().map(Duration::from_millis).collect();
        let summary = compute_summary(&samples);

        assert_eq!(summary.mean, Duration::from_millis(20));
        assert_eq!(summary.stddev, Duration::from_millis(10));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, Duration::from_millis(10));
        assert_eq!(summary.max, Duration::from_millis(30));
    }

    #[test]
    fn test_empty_samples() {
        let summary = compute_summary(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, Duration::ZERO);
        assert_eq!(summary.stddev, Duration::ZERO);
        assert!((summary.coefficient_of_variation() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let samples: Vec<Duration> = [90, 100, 110].into_iter().map(Duration::from_millis).collect();
        let summary = compute_summary(&samples);
        assert!((summary.coefficient_of_variation() - 10.0).abs() < 1e-6);
    }
}

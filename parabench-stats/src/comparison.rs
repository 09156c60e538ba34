//! Concurrent vs Parallel Comparison
//!
//! Derives speedup and efficiency from the summaries of the same workload run
//! under a single worker and under the full parallelism ceiling.

use crate::EFFICIENCY_SCALE;
use crate::summary::Summary;

/// Derived metrics for one concurrent/parallel pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelComparison {
    /// `mean(concurrent) / mean(parallel)`
    pub speedup: f64,
    /// Speedup as a percentage of linear scaling
    pub efficiency: f64,
    /// Best achievable speedup (the parallelism ceiling)
    pub theoretical_max: usize,
}

/// Ratio of concurrent mean duration to parallel mean duration
pub fn speedup(concurrent: &Summary, parallel: &Summary) -> Result<f64, MetricError> {
    if parallel.mean.is_zero() {
        return Err(MetricError::DegenerateMeasurement {
            samples: parallel.count,
        });
    }

    Ok(concurrent.mean.as_nanos() as f64 / parallel.mean.as_nanos() as f64)
}

/// Speedup normalized by the parallelism ceiling, in percent
pub fn efficiency(speedup: f64, ceiling: usize) -> Result<f64, MetricError> {
    if ceiling == 0 {
        return Err(MetricError::InvalidCeiling);
    }
    if !speedup.is_finite() {
        return Err(MetricError::NonFiniteSpeedup(speedup));
    }

    Ok((speedup / ceiling as f64) * EFFICIENCY_SCALE)
}

/// Compute speedup, efficiency and the theoretical maximum in one step
pub fn compare_levels(
    concurrent: &Summary,
    parallel: &Summary,
    ceiling: usize,
) -> Result<LevelComparison, MetricError> {
    let speedup = speedup(concurrent, parallel)?;
    let efficiency = efficiency(speedup, ceiling)?;

    Ok(LevelComparison {
        speedup,
        efficiency,
        theoretical_max: ceiling,
    })
}

/// Errors from derived-metric computation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    #[error("speedup undefined: parallel mean is zero over {samples} sample(s)")]
    DegenerateMeasurement { samples: usize },
    #[error("efficiency undefined: parallelism ceiling must be at least 1")]
    InvalidCeiling,
    #[error("efficiency undefined: speedup {0} is not finite")]
    NonFiniteSpeedup(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::compute_summary;
    use std::time::Duration;

    fn summary_of(ms: &[u64]) -> Summary {
        let samples: Vec<Duration> = ms.iter().copied().map(Duration::from_millis).collect();
        compute_summary(&samples)
    }

    #[test]
    fn test_clear_speedup() {
        let concurrent = summary_of(&[400, 400, 400]);
        let parallel = summary_of(&[100, 100, 100]);

        let result = compare_levels(&concurrent, &parallel, 4).unwrap();
        assert!((result.speedup - 4.0).abs() < 1e-9);
        assert!((result.efficiency - 100.0).abs() < 1e-9);
        assert_eq!(result.theoretical_max, 4);
    }

    #[test]
    fn test_partial_efficiency() {
        let concurrent = summary_of(&[300]);
        let parallel = summary_of(&[100]);

        let result = compare_levels(&concurrent, &parallel, 8).unwrap();
        assert!((result.speedup - 3.0).abs() < 1e-9);
        assert!((result.efficiency - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_parallel_mean_is_degenerate() {
        let concurrent = summary_of(&[10]);
        let parallel = summary_of(&[0, 0]);

        assert_eq!(
            speedup(&concurrent, &parallel),
            Err(MetricError::DegenerateMeasurement { samples: 2 })
        );
        assert!(compare_levels(&concurrent, &parallel, 4).is_err());
    }

    #[test]
    fn test_empty_parallel_is_degenerate() {
        let concurrent = summary_of(&[10]);
        let parallel = summary_of(&[]);

        assert!(matches!(
            speedup(&concurrent, &parallel),
            Err(MetricError::DegenerateMeasurement { samples: 0 })
        ));
    }

    #[test]
    fn test_invalid_ceiling() {
        assert_eq!(efficiency(2.0, 0), Err(MetricError::InvalidCeiling));
        assert!(matches!(
            efficiency(f64::INFINITY, 4),
            Err(MetricError::NonFiniteSpeedup(_))
        ));
    }
}

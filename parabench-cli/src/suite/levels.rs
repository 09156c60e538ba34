//! Concurrent vs parallel scenarios (CPU, I/O, mixed)
//!
//! Each iteration measures the same fan-out once on a single worker and once
//! at the parallel level, back to back, so slow drift in machine state hits
//! both sides equally.

use super::{BenchmarkSuite, ScenarioError, ScenarioKind, ScenarioProgress, ScenarioState, SuiteObserver};
use parabench_core::{ParallelismLevel, Workload};
use parabench_report::{LevelComparisonReport, LevelMetrics};
use parabench_stats::{SampleSet, compare_levels};
use tracing::{debug, warn};

/// What to measure for one level-comparison scenario
#[derive(Debug, Clone, Copy)]
pub(crate) struct LevelPlan {
    pub iterations: usize,
    pub task_count: usize,
    pub workload: Workload,
    pub note: Option<&'static str>,
}

impl BenchmarkSuite {
    pub(super) fn run_cpu(
        &mut self,
        progress: &mut ScenarioProgress,
        observer: &mut dyn SuiteObserver,
    ) -> Result<LevelComparisonReport, ScenarioError> {
        let level = self.config.parallel_level;
        let plan = LevelPlan {
            iterations: self.config.iterations,
            task_count: level.get(),
            workload: Workload::Uniform(self.config.cpu_kernel()),
            note: None,
        };
        self.compare(progress, observer, plan)
    }

    pub(super) fn run_io(
        &mut self,
        progress: &mut ScenarioProgress,
        observer: &mut dyn SuiteObserver,
    ) -> Result<LevelComparisonReport, ScenarioError> {
        let level = self.config.parallel_level;
        let plan = LevelPlan {
            iterations: self.config.iterations,
            task_count: level.get() * 2,
            workload: Workload::Uniform(self.config.io_kernel()),
            note: Some("I/O-bound tasks interleave on a single worker, so speedup near 1x is expected"),
        };
        self.compare(progress, observer, plan)
    }

    pub(super) fn run_mixed(
        &mut self,
        progress: &mut ScenarioProgress,
        observer: &mut dyn SuiteObserver,
    ) -> Result<LevelComparisonReport, ScenarioError> {
        let level = self.config.parallel_level;
        let plan = LevelPlan {
            iterations: 1,
            task_count: level.get(),
            workload: Workload::mixed(self.config.cpu_kernel(), self.config.io_kernel()),
            note: None,
        };
        self.compare(progress, observer, plan)
    }

    fn compare(
        &mut self,
        progress: &mut ScenarioProgress,
        observer: &mut dyn SuiteObserver,
        plan: LevelPlan,
    ) -> Result<LevelComparisonReport, ScenarioError> {
        let kind = progress.kind();
        let concurrent_level = ParallelismLevel::SINGLE;
        let parallel_level = self.config.parallel_level;

        let mut concurrent = SampleSet::with_capacity(plan.iterations);
        let mut parallel = SampleSet::with_capacity(plan.iterations);

        for iteration in 1..=plan.iterations {
            if plan.iterations > 1 {
                observer.iteration_started(kind, iteration, plan.iterations);
            }

            progress.advance(ScenarioState::Measuring(concurrent_level))?;
            let elapsed = self.measure(concurrent_level, plan.task_count, &plan.workload)?;
            debug!("{} iteration {}: concurrent {:?}", kind, iteration, elapsed);
            concurrent.record(elapsed);

            progress.advance(ScenarioState::Measuring(parallel_level))?;
            let elapsed = self.measure(parallel_level, plan.task_count, &plan.workload)?;
            debug!("{} iteration {}: parallel {:?}", kind, iteration, elapsed);
            parallel.record(elapsed);
        }

        progress.advance(ScenarioState::Aggregating)?;
        Ok(level_report(
            kind,
            &plan,
            &concurrent,
            &parallel,
            concurrent_level,
            parallel_level,
        ))
    }
}

/// Summarize both sample sets and derive speedup and efficiency.
///
/// A degenerate parallel mean leaves both ratios undefined instead of failing
/// the scenario.
pub(crate) fn level_report(
    kind: ScenarioKind,
    plan: &LevelPlan,
    concurrent: &SampleSet,
    parallel: &SampleSet,
    concurrent_level: ParallelismLevel,
    parallel_level: ParallelismLevel,
) -> LevelComparisonReport {
    let concurrent_summary = concurrent.summary();
    let parallel_summary = parallel.summary();
    let ceiling = parallel_level.get();
    debug!(
        "{}: coefficient of variation {:.1}% concurrent, {:.1}% parallel",
        kind,
        concurrent_summary.coefficient_of_variation(),
        parallel_summary.coefficient_of_variation()
    );

    let (speedup, efficiency, metric_error) =
        match compare_levels(&concurrent_summary, &parallel_summary, ceiling) {
            Ok(comparison) => (Some(comparison.speedup), Some(comparison.efficiency), None),
            Err(e) => {
                warn!("{}: {}", kind, e);
                (None, None, Some(e.to_string()))
            }
        };

    LevelComparisonReport {
        iterations: plan.iterations,
        task_count: plan.task_count,
        concurrent: LevelMetrics::from_summary(concurrent_level.get(), &concurrent_summary),
        parallel: LevelMetrics::from_summary(parallel_level.get(), &parallel_summary),
        speedup,
        efficiency,
        theoretical_max: ceiling,
        metric_error,
        note: plan.note.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::tests::quick_config;
    use crate::suite::SilentObserver;
    use parabench_core::Kernel;
    use std::time::Duration;

    fn plan(iterations: usize) -> LevelPlan {
        LevelPlan {
            iterations,
            task_count: 4,
            workload: Workload::Uniform(Kernel::cpu()),
            note: None,
        }
    }

    fn samples(ms: &[u64]) -> SampleSet {
        ms.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn test_level_report_metrics() {
        let four = ParallelismLevel::new(4).unwrap();
        let report = level_report(
            ScenarioKind::Cpu,
            &plan(3),
            &samples(&[400, 400, 400]),
            &samples(&[100, 110, 90]),
            ParallelismLevel::SINGLE,
            four,
        );

        assert_eq!(report.concurrent.level, 1);
        assert_eq!(report.parallel.level, 4);
        assert_eq!(report.parallel.samples, 3);
        assert!((report.speedup.unwrap() - 4.0).abs() < 1e-9);
        assert!((report.efficiency.unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(report.theoretical_max, 4);
        assert!(report.metric_error.is_none());
    }

    #[test]
    fn test_degenerate_parallel_mean_is_undefined() {
        let report = level_report(
            ScenarioKind::Mixed,
            &plan(1),
            &samples(&[5]),
            &samples(&[0]),
            ParallelismLevel::SINGLE,
            ParallelismLevel::new(4).unwrap(),
        );

        assert_eq!(report.speedup, None);
        assert_eq!(report.efficiency, None);
        assert!(report.metric_error.unwrap().contains("parallel mean is zero"));
    }

    #[test]
    fn test_mixed_runs_once_per_level() {
        let mut config = quick_config(4);
        config.warmup = false;
        let mut suite = BenchmarkSuite::new(config).unwrap();
        let mut progress = ScenarioProgress::new(ScenarioKind::Mixed);

        let report = suite.run_mixed(&mut progress, &mut SilentObserver).unwrap();

        assert_eq!(report.iterations, 1);
        assert_eq!(report.task_count, 4);
        assert_eq!(report.concurrent.samples, 1);
        assert_eq!(report.parallel.samples, 1);
        assert_eq!(progress.state(), ScenarioState::Aggregating);
    }

    #[test]
    fn test_io_uses_twice_the_level() {
        let mut config = quick_config(2);
        config.warmup = false;
        config.iterations = 1;
        let mut suite = BenchmarkSuite::new(config).unwrap();
        let mut progress = ScenarioProgress::new(ScenarioKind::Io);

        let report = suite.run_io(&mut progress, &mut SilentObserver).unwrap();

        assert_eq!(report.task_count, 4);
        assert!(report.note.is_some());
    }
}

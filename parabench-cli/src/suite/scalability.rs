//! Fixed-work scalability scenario
//!
//! The parallel level stays fixed while the same total work is split across
//! more and more tasks, isolating fan-out and scheduling overhead.

use super::{BenchmarkSuite, ScenarioError, ScenarioProgress, ScenarioState};
use parabench_core::{ConfigError, Kernel, ParallelismLevel, WorkSplit};
use parabench_report::{ScalabilityReport, ScalabilityRow};
use std::time::Duration;
use tracing::{debug, warn};

impl BenchmarkSuite {
    pub(super) fn run_scalability(
        &mut self,
        progress: &mut ScenarioProgress,
    ) -> Result<ScalabilityReport, ScenarioError> {
        let level = self.config.parallel_level;
        let settings = self.config.scalability.clone();
        let (measured, skipped) = settings.partition(level);
        for count in &skipped {
            warn!(
                "skipping {} task(s): above {} x {} workers",
                count, settings.max_task_factor, level
            );
        }

        let mut rows = Vec::with_capacity(measured.len());
        for &tasks in &measured {
            let split = WorkSplit::new(settings.total_work, tasks)
                .ok_or(ConfigError::InvalidScalabilityCount(tasks))?;

            progress.advance(ScenarioState::Measuring(level))?;
            let elapsed = self.measure_split(level, split)?;
            debug!("scalability {} task(s): {:?}", tasks, elapsed);

            rows.push(ScalabilityRow {
                tasks,
                work_per_task: split.base_share(),
                total_work: (0..tasks).map(|i| split.share(i)).sum(),
                duration_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
                speedup: None,
            });
        }

        progress.advance(ScenarioState::Aggregating)?;
        let baseline_tasks = settings
            .baseline
            .filter(|b| measured.contains(b))
            .or_else(|| measured.iter().copied().min());
        if let Some(baseline) = baseline_tasks {
            apply_baseline(&mut rows, baseline);
        }

        Ok(ScalabilityReport {
            level: level.get(),
            total_work: settings.total_work,
            baseline_tasks,
            rows,
            skipped,
        })
    }

    fn measure_split(
        &mut self,
        level: ParallelismLevel,
        split: WorkSplit,
    ) -> Result<Duration, ScenarioError> {
        self.settle();
        let scope = self.controller.scope(level)?;
        let runner = super::task_runner(&scope, &self.config, &self.cancel);
        let elapsed = runner.run(split.tasks(), move |index| {
            Kernel::SumOfSquares {
                work_items: split.share(index),
            }
            .run()
        })?;
        Ok(elapsed)
    }
}

/// Fill each row's speedup relative to the row measured with `baseline` tasks
pub(crate) fn apply_baseline(rows: &mut [ScalabilityRow], baseline: usize) {
    let Some(reference) = rows
        .iter()
        .find(|row| row.tasks == baseline)
        .map(|row| row.duration_ns)
    else {
        return;
    };

    for row in rows.iter_mut() {
        row.speedup = (row.duration_ns > 0).then(|| reference as f64 / row.duration_ns as f64);
    }
}

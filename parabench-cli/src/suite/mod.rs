//! Benchmark Suite
//!
//! Runs the selected scenarios strictly one after another on a single
//! [`ParallelismController`]. A failing scenario is reported and the suite
//! moves on; once the suite is cancelled, every scenario that has not yet
//! started is reported as skipped.

mod levels;
mod scalability;
mod scenario;

pub use scenario::{ScenarioKind, ScenarioProgress, ScenarioState, TransitionError};

use parabench_core::{
    CancellationToken, ConfigError, DEFAULT_IO_POST_WORK, DEFAULT_IO_ROUNDS, DEFAULT_IO_WAIT,
    DEFAULT_PRIME_LIMIT, DEFAULT_SHUTDOWN_TIMEOUT, IoKernel, Kernel, ParallelismController,
    ParallelismLevel, ParallelismScope, RuntimeError, TaskRunner, TaskRunnerError, Workload, time,
};
use parabench_report::{FailureInfo, ScenarioOutcome, ScenarioReport};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default measurement repetitions per level
pub const DEFAULT_ITERATIONS: usize = 5;
/// Default pause before each measurement
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);
/// Default items summed by each warm-up task
pub const DEFAULT_WARMUP_WORK: u64 = 1_000_000;
/// Default pause after the warm-up fan-out
pub const DEFAULT_WARMUP_SETTLE: Duration = Duration::from_millis(100);
/// Default bound on a single measurement
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default total work split across scalability rows
pub const DEFAULT_SCALABILITY_WORK: u64 = 10_000_000;
/// Default scalability task counts
pub const DEFAULT_TASK_COUNTS: [usize; 5] = [1, 2, 4, 8, 16];
/// Default multiple of the parallel level above which task counts are skipped
pub const DEFAULT_MAX_TASK_FACTOR: usize = 4;

/// Validated settings for a suite run
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Parallel level; also the task count of the CPU and mixed scenarios
    pub parallel_level: ParallelismLevel,
    /// Measurements per level in the CPU and I/O scenarios
    pub iterations: usize,
    /// Exclusive bound of the CPU kernel's prime search
    pub prime_limit: u64,
    /// I/O kernel parameters
    pub io: IoKernel,
    /// Sleep before each measurement when `quiesce` is set
    pub settle_delay: Duration,
    /// Pause between measurements
    pub quiesce: bool,
    /// Run the warm-up fan-out before each scenario
    pub warmup: bool,
    /// Items summed by each warm-up task
    pub warmup_work: u64,
    /// Pause after the warm-up fan-out
    pub warmup_settle: Duration,
    /// Bound on a single measurement; `None` waits forever
    pub timeout: Option<Duration>,
    /// Bound on tearing down a measurement's workers
    pub shutdown_timeout: Duration,
    /// Scalability scenario settings
    pub scalability: ScalabilitySettings,
}

/// Settings for the scalability scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalabilitySettings {
    /// Work items split across every row's tasks
    pub total_work: u64,
    /// Task counts to measure, in order
    pub task_counts: Vec<usize>,
    /// Counts above `max_task_factor × parallel_level` are skipped
    pub max_task_factor: usize,
    /// Row the speedup column is relative to; smallest measured count when unset
    pub baseline: Option<usize>,
}

impl Default for ScalabilitySettings {
    fn default() -> Self {
        Self {
            total_work: DEFAULT_SCALABILITY_WORK,
            task_counts: DEFAULT_TASK_COUNTS.to_vec(),
            max_task_factor: DEFAULT_MAX_TASK_FACTOR,
            baseline: None,
        }
    }
}

impl ScalabilitySettings {
    /// Highest task count measured at `level`
    pub fn ceiling(&self, level: ParallelismLevel) -> usize {
        self.max_task_factor.saturating_mul(level.get())
    }

    /// Split the configured counts into (measured, skipped) at `level`
    pub fn partition(&self, level: ParallelismLevel) -> (Vec<usize>, Vec<usize>) {
        let ceiling = self.ceiling(level);
        self.task_counts.iter().partition(|&&count| count <= ceiling)
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            parallel_level: ParallelismLevel::available(),
            iterations: DEFAULT_ITERATIONS,
            prime_limit: DEFAULT_PRIME_LIMIT,
            io: IoKernel {
                rounds: DEFAULT_IO_ROUNDS,
                wait: DEFAULT_IO_WAIT,
                post_io_work: DEFAULT_IO_POST_WORK,
            },
            settle_delay: DEFAULT_SETTLE_DELAY,
            quiesce: true,
            warmup: true,
            warmup_work: DEFAULT_WARMUP_WORK,
            warmup_settle: DEFAULT_WARMUP_SETTLE,
            timeout: Some(DEFAULT_TIMEOUT),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            scalability: ScalabilitySettings::default(),
        }
    }
}

impl SuiteConfig {
    /// Reject settings that would make a measurement meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        let scalability = &self.scalability;
        if scalability.total_work == 0 {
            return Err(ConfigError::ZeroWork {
                field: "scalability.total_work".to_string(),
            });
        }
        if scalability.max_task_factor == 0 {
            return Err(ConfigError::InvalidTaskFactor(scalability.max_task_factor));
        }
        if scalability.task_counts.is_empty() {
            return Err(ConfigError::InvalidScalabilityCount(0));
        }
        if let Some(&bad) = scalability.task_counts.iter().find(|&&count| count == 0) {
            return Err(ConfigError::InvalidScalabilityCount(bad));
        }
        let (measured, _) = scalability.partition(self.parallel_level);
        if measured.is_empty() {
            return Err(ConfigError::NoMeasurableCounts {
                ceiling: scalability.ceiling(self.parallel_level),
                counts: scalability.task_counts.clone(),
            });
        }
        if let Some(baseline) = scalability.baseline {
            if !measured.contains(&baseline) {
                return Err(ConfigError::InvalidBaseline {
                    baseline,
                    counts: measured,
                });
            }
        }
        Ok(())
    }

    /// Kernel run by every CPU-scenario task
    pub fn cpu_kernel(&self) -> Kernel {
        Kernel::Cpu {
            prime_limit: self.prime_limit,
        }
    }

    /// Kernel run by every I/O-scenario task
    pub fn io_kernel(&self) -> Kernel {
        Kernel::Io(self.io)
    }
}

/// Why a scenario stopped before producing its report
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Settings rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Scheduler could not be built
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// A fan-out did not complete
    #[error(transparent)]
    Runner(#[from] TaskRunnerError),
    /// Illegal state-machine step
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl ScenarioError {
    /// Short machine-readable failure category
    pub fn kind(&self) -> &'static str {
        match self {
            ScenarioError::Config(_) => "config",
            ScenarioError::Runtime(_) => "runtime",
            ScenarioError::Runner(TaskRunnerError::Config(_)) => "config",
            ScenarioError::Runner(TaskRunnerError::Runtime(_)) => "runtime",
            ScenarioError::Runner(TaskRunnerError::TaskFailed { .. }) => "task_failure",
            ScenarioError::Runner(TaskRunnerError::LostCompletion { .. }) => "lost_completion",
            ScenarioError::Runner(TaskRunnerError::TimedOut { .. }) => "timeout",
            ScenarioError::Runner(TaskRunnerError::Cancelled { .. }) => "cancelled",
            ScenarioError::Transition(_) => "internal",
        }
    }

    /// Whether the scenario stopped because the suite was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScenarioError::Runner(e) if e.is_cancelled())
    }

    fn failure_info(&self) -> FailureInfo {
        FailureInfo {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Progress callbacks, invoked on the suite's thread
pub trait SuiteObserver {
    /// A scenario is about to warm up
    fn scenario_started(&mut self, kind: ScenarioKind) {
        let _ = kind;
    }

    /// An iteration of a repeated scenario is about to be measured (1-based)
    fn iteration_started(&mut self, kind: ScenarioKind, iteration: usize, total: usize) {
        let _ = (kind, iteration, total);
    }

    /// A scenario produced its report, whatever its status
    fn scenario_finished(&mut self, report: &ScenarioReport) {
        let _ = report;
    }
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl SuiteObserver for SilentObserver {}

/// Sequential runner for the benchmark scenarios
#[derive(Debug)]
pub struct BenchmarkSuite {
    config: SuiteConfig,
    controller: ParallelismController,
    cancel: CancellationToken,
}

impl BenchmarkSuite {
    /// Validate `config` and prepare a suite; nothing is measured yet
    pub fn new(config: SuiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = ParallelismController::new(config.parallel_level)
            .with_shutdown_timeout(config.shutdown_timeout);
        Ok(Self {
            config,
            controller,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop the run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Settings the suite runs with
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run `plan` in order, returning one report per scenario
    pub fn run(
        &mut self,
        plan: &[ScenarioKind],
        observer: &mut dyn SuiteObserver,
    ) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(plan.len());
        for &kind in plan {
            let report = if self.cancel.is_cancelled() {
                warn!("skipping scenario {}: run cancelled", kind);
                ScenarioReport::skipped(kind.id(), kind.title(), "run cancelled")
            } else {
                self.run_scenario(kind, observer)
            };
            observer.scenario_finished(&report);
            reports.push(report);
        }

        let abandoned = self.controller.abandoned_scopes();
        if abandoned > 0 {
            warn!(
                "{} measurement scope(s) abandoned workers still running tasks; later timings may be perturbed",
                abandoned
            );
        }
        reports
    }

    /// Measurement scopes torn down with tasks still running
    pub fn abandoned_scopes(&self) -> usize {
        self.controller.abandoned_scopes()
    }

    /// Run one scenario to completion or failure
    pub fn run_scenario(
        &mut self,
        kind: ScenarioKind,
        observer: &mut dyn SuiteObserver,
    ) -> ScenarioReport {
        info!("starting scenario {}", kind);
        observer.scenario_started(kind);

        let started = Instant::now();
        let mut progress = ScenarioProgress::new(kind);
        let result = self.execute(&mut progress, observer);
        let elapsed = started.elapsed();

        match result {
            Ok(outcome) => {
                info!("scenario {} done in {:?}", kind, elapsed);
                ScenarioReport::completed(kind.id(), kind.title(), outcome, elapsed)
            }
            Err(e) => {
                progress.fail();
                if e.is_cancelled() {
                    warn!("scenario {} cancelled: {}", kind, e);
                } else {
                    error!("scenario {} failed: {}", kind, e);
                }
                ScenarioReport::failed(kind.id(), kind.title(), e.failure_info(), elapsed)
            }
        }
    }

    fn execute(
        &mut self,
        progress: &mut ScenarioProgress,
        observer: &mut dyn SuiteObserver,
    ) -> Result<ScenarioOutcome, ScenarioError> {
        self.warm_up(progress)?;

        let outcome = match progress.kind() {
            ScenarioKind::Cpu => ScenarioOutcome::Levels(self.run_cpu(progress, observer)?),
            ScenarioKind::Io => ScenarioOutcome::Levels(self.run_io(progress, observer)?),
            ScenarioKind::Mixed => ScenarioOutcome::Levels(self.run_mixed(progress, observer)?),
            ScenarioKind::Scalability => {
                ScenarioOutcome::Scalability(self.run_scalability(progress)?)
            }
        };

        progress.advance(ScenarioState::Done)?;
        Ok(outcome)
    }

    /// Prime the allocator, caches and thread machinery at the parallel level
    fn warm_up(&mut self, progress: &mut ScenarioProgress) -> Result<(), ScenarioError> {
        if !self.config.warmup {
            return Ok(());
        }
        progress.advance(ScenarioState::Warming)?;

        let level = self.config.parallel_level;
        let workload = Workload::Uniform(Kernel::SumOfSquares {
            work_items: self.config.warmup_work,
        });
        {
            let scope = self.controller.scope(level)?;
            let runner = task_runner(&scope, &self.config, &self.cancel);
            let (result, elapsed) = time(|| runner.run_workload(level.get(), &workload));
            result?;
            debug!("warm-up at {} worker(s) took {:?}", level, elapsed);
        }
        std::thread::sleep(self.config.warmup_settle);
        Ok(())
    }

    /// Quiesce, then time one fan-out of `task_count` tasks at `level`
    fn measure(
        &mut self,
        level: ParallelismLevel,
        task_count: usize,
        workload: &Workload,
    ) -> Result<Duration, ScenarioError> {
        self.settle();
        let scope = self.controller.scope(level)?;
        let runner = task_runner(&scope, &self.config, &self.cancel);
        Ok(runner.run_workload(task_count, workload)?)
    }

    /// Previous scheduler is already torn down when this runs
    fn settle(&self) {
        if self.config.quiesce && !self.config.settle_delay.is_zero() {
            std::thread::sleep(self.config.settle_delay);
        }
    }
}

fn task_runner(
    scope: &ParallelismScope<'_>,
    config: &SuiteConfig,
    cancel: &CancellationToken,
) -> TaskRunner {
    let runner = TaskRunner::new(scope).with_cancellation(cancel.clone());
    match config.timeout {
        Some(timeout) => runner.with_timeout(timeout),
        None => runner,
    }
}

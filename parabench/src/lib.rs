#![warn(missing_docs)]
//! # Parabench
//!
//! Measures concurrent (single-worker, time-sliced) against parallel
//! (multi-worker) execution of lightweight tasks on the Tokio scheduler.
//!
//! Parabench provides:
//! - **Workload Kernels**: CPU-bound prime counting, suspension-bound I/O rounds, fixed-work summation
//! - **Scoped Parallelism**: one fresh scheduler per measurement, torn down and restored on every exit path
//! - **Failure-Safe Fan-Out**: every task reports exactly once, so panics, timeouts and cancellation never hang the barrier
//! - **Statistics**: sample mean and Bessel-corrected standard deviation, speedup and efficiency
//! - **Scenarios**: CPU, I/O, mixed and fixed-work scalability, each isolated from the others' failures
//!
//! ## Quick Start
//!
//! ```ignore
//! fn main() {
//!     parabench::run().unwrap();
//! }
//! ```
//!
//! ## Measuring a Custom Fan-Out
//!
//! ```ignore
//! use parabench::{Kernel, ParallelismController, ParallelismLevel, TaskRunner, Workload};
//!
//! let mut controller = ParallelismController::default();
//! let scope = controller.scope(ParallelismLevel::SINGLE)?;
//! let elapsed = TaskRunner::new(&scope).run_workload(8, &Workload::Uniform(Kernel::io()))?;
//! ```

// Re-export core types
pub use parabench_core::{
    CancellationToken, ConfigError, IoKernel, Kernel, KernelKind, ParallelismController,
    ParallelismLevel, ParallelismScope, RuntimeError, SchedulerConfig, Stopwatch, TaskFailure,
    TaskRunner, TaskRunnerError, WorkSplit, Workload, count_primes, cpu_task, io_task,
    sum_of_squares,
};

// Re-export stats
pub use parabench_stats::{
    LevelComparison, MetricError, SampleSet, Summary, compare_levels, compute_summary,
    efficiency, speedup,
};

// Re-export report types
pub use parabench_report::{
    OutputFormat, Report, ScalabilityReport, ScalabilityRow, ScenarioOutcome, ScenarioReport,
    ScenarioStatus,
};

// Re-export suite
pub use parabench_cli::{
    BenchmarkSuite, ParabenchConfig, ScenarioKind, ScenarioProgress, ScenarioState,
    SilentObserver, SuiteConfig, SuiteObserver,
};

/// Run the Parabench CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() {
///     parabench::run().unwrap();
/// }
/// ```
pub use parabench_cli::run;

#![warn(missing_docs)]
//! Parabench Core - Scheduler Harness
//!
//! This crate provides the execution environment for concurrency benchmarks:
//! - Workload kernels (CPU-bound, I/O-bound, fixed-work summation)
//! - `ParallelismController` for scoped control of the worker-thread ceiling
//! - `TaskRunner` fan-out/fan-in barrier with failure, timeout and cancellation
//! - `Stopwatch` wall-clock timing

mod error;
mod kernel;
mod measure;
mod parallelism;
mod runner;
mod workload;

pub use error::{ConfigError, RuntimeError, TaskFailure, TaskRunnerError};
pub use kernel::{
    DEFAULT_IO_POST_WORK, DEFAULT_IO_ROUNDS, DEFAULT_IO_WAIT, DEFAULT_PRIME_LIMIT, IoKernel,
    Kernel, KernelKind, count_primes, cpu_task, io_task, sum_of_squares, sum_range,
};
pub use measure::{Stopwatch, time};
pub use parallelism::{
    DEFAULT_SHUTDOWN_TIMEOUT, ParallelismController, ParallelismLevel, ParallelismScope,
    SchedulerConfig,
};
pub use runner::TaskRunner;
pub use workload::{WorkSplit, Workload};

/// Re-exported so callers can build cancellation tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;

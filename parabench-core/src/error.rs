//! Error types for the scheduler harness

use std::fmt;
use std::time::Duration;

/// Invalid measurement parameters, rejected before anything runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("parallelism level must be at least 1, got {0}")]
    InvalidParallelism(usize),
    #[error("task count must be at least 1, got {0}")]
    InvalidTaskCount(usize),
    #[error("iterations must be at least 1, got {0}")]
    InvalidIterations(usize),
    #[error("scalability task count must be at least 1, got {0}")]
    InvalidScalabilityCount(usize),
    #[error("scalability baseline {baseline} is not a measured task count (measured: {counts:?})")]
    InvalidBaseline { baseline: usize, counts: Vec<usize> },
    #[error("invalid duration for {field}: {message}")]
    InvalidDuration { field: String, message: String },
    #[error("{field} must be at least 1")]
    ZeroWork { field: String },
    #[error("scalability max_task_factor must be at least 1, got {0}")]
    InvalidTaskFactor(usize),
    #[error("no scalability task count is at most {ceiling} (configured: {counts:?})")]
    NoMeasurableCounts { ceiling: usize, counts: Vec<usize> },
}

/// Failure to bring up a scheduler for a measurement
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to build scheduler with {level} worker thread(s): {source}")]
    Build {
        level: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build completion barrier clock: {source}")]
    Barrier {
        #[source]
        source: std::io::Error,
    },
}

/// A single task that terminated abnormally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Launch index of the failed task
    pub index: usize,
    /// Panic payload rendered as text
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}: {}", self.index, self.message)
    }
}

/// Errors from a fan-out/fan-in run
#[derive(Debug, thiserror::Error)]
pub enum TaskRunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("{} of {expected} task(s) failed ({})", failure_count(.failures), describe_failures(.failures))]
    TaskFailed {
        failures: Vec<TaskFailure>,
        expected: usize,
    },
    #[error("completion channel closed after {received} of {expected} completions")]
    LostCompletion { expected: usize, received: usize },
    #[error("timed out after {timeout:?} with {completed} of {expected} task(s) complete")]
    TimedOut {
        timeout: Duration,
        completed: usize,
        expected: usize,
    },
    #[error("cancelled with {completed} of {expected} task(s) complete")]
    Cancelled { completed: usize, expected: usize },
}

impl TaskRunnerError {
    /// Indices of failed tasks, empty for non-task failures
    pub fn failed_indices(&self) -> Vec<usize> {
        match self {
            TaskRunnerError::TaskFailed { failures, .. } => {
                failures.iter().map(|f| f.index).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Whether the run stopped because its cancellation token fired
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskRunnerError::Cancelled { .. })
    }
}

fn failure_count(failures: &[TaskFailure]) -> usize {
    failures.len()
}

fn describe_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

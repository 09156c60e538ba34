//! Configuration loading from parabench.toml
//!
//! Parabench configuration can be specified in a `parabench.toml` file.
//! The configuration is automatically discovered by walking up from the current directory.

use crate::suite::{
    DEFAULT_ITERATIONS, DEFAULT_MAX_TASK_FACTOR, DEFAULT_SCALABILITY_WORK, DEFAULT_TASK_COUNTS,
    DEFAULT_WARMUP_WORK, ScalabilitySettings, SuiteConfig,
};
use anyhow::Context;
use parabench_core::{
    ConfigError, DEFAULT_IO_POST_WORK, DEFAULT_IO_ROUNDS, DEFAULT_PRIME_LIMIT,
    DEFAULT_SHUTDOWN_TIMEOUT, IoKernel, ParallelismLevel,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`ParabenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "parabench.toml";

/// Parabench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ParabenchConfig {
    /// Kernel parameters
    #[serde(default)]
    pub workload: WorkloadConfig,
    /// Measurement procedure
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Scalability scenario
    #[serde(default)]
    pub scalability: ScalabilityConfig,
}

/// Kernel parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadConfig {
    /// Exclusive bound of the CPU kernel's prime search
    #[serde(default = "default_prime_limit")]
    pub prime_limit: u64,
    /// Suspension rounds per I/O task
    #[serde(default = "default_io_rounds")]
    pub io_rounds: u32,
    /// Suspension per round (e.g., "5ms")
    #[serde(default = "default_io_wait")]
    pub io_wait: String,
    /// Integers summed after each suspension
    #[serde(default = "default_io_post_work")]
    pub io_post_work: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            prime_limit: default_prime_limit(),
            io_rounds: default_io_rounds(),
            io_wait: default_io_wait(),
            io_post_work: default_io_post_work(),
        }
    }
}

fn default_prime_limit() -> u64 {
    DEFAULT_PRIME_LIMIT
}
fn default_io_rounds() -> u32 {
    DEFAULT_IO_ROUNDS
}
fn default_io_wait() -> String {
    "5ms".to_string()
}
fn default_io_post_work() -> u64 {
    DEFAULT_IO_POST_WORK
}

/// Measurement procedure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Measurements per level in the CPU and I/O scenarios
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Pause before each measurement (e.g., "10ms")
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,
    /// Whether to pause before each measurement
    #[serde(default = "default_true")]
    pub quiesce: bool,
    /// Whether to run the warm-up fan-out before each scenario
    #[serde(default = "default_true")]
    pub warmup: bool,
    /// Items summed by each warm-up task
    #[serde(default = "default_warmup_work")]
    pub warmup_work: u64,
    /// Pause after the warm-up fan-out (e.g., "100ms")
    #[serde(default = "default_warmup_settle")]
    pub warmup_settle: String,
    /// Bound on a single measurement (e.g., "60s"); "0s" disables it
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Parallel level (defaults to the available cores)
    #[serde(default)]
    pub parallel_level: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            settle_delay: default_settle_delay(),
            quiesce: true,
            warmup: true,
            warmup_work: default_warmup_work(),
            warmup_settle: default_warmup_settle(),
            timeout: default_timeout(),
            parallel_level: None,
        }
    }
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}
fn default_settle_delay() -> String {
    "10ms".to_string()
}
fn default_true() -> bool {
    true
}
fn default_warmup_work() -> u64 {
    DEFAULT_WARMUP_WORK
}
fn default_warmup_settle() -> String {
    "100ms".to_string()
}
fn default_timeout() -> String {
    "60s".to_string()
}

/// Scalability scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalabilityConfig {
    /// Work items split across every row's tasks
    #[serde(default = "default_total_work")]
    pub total_work: u64,
    /// Task counts to measure
    #[serde(default = "default_task_counts")]
    pub task_counts: Vec<usize>,
    /// Skip counts above this multiple of the parallel level
    #[serde(default = "default_max_task_factor")]
    pub max_task_factor: usize,
    /// Task count the speedup column is relative to
    #[serde(default)]
    pub baseline: Option<usize>,
}

impl Default for ScalabilityConfig {
    fn default() -> Self {
        Self {
            total_work: default_total_work(),
            task_counts: default_task_counts(),
            max_task_factor: default_max_task_factor(),
            baseline: None,
        }
    }
}

fn default_total_work() -> u64 {
    DEFAULT_SCALABILITY_WORK
}
fn default_task_counts() -> Vec<usize> {
    DEFAULT_TASK_COUNTS.to_vec()
}
fn default_max_task_factor() -> usize {
    DEFAULT_MAX_TASK_FACTOR
}

impl ParabenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Find `parabench.toml` by walking up from the current directory
    pub fn discover_path() -> Option<PathBuf> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration; `Ok(None)` when no file exists.
    ///
    /// A file that exists but does not parse is an error.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        Self::discover_path().map(Self::load).transpose()
    }

    /// Convert to validated suite settings
    pub fn suite_config(&self) -> Result<SuiteConfig, ConfigError> {
        let parallel_level = match self.runner.parallel_level {
            Some(level) => ParallelismLevel::new(level)?,
            None => ParallelismLevel::available(),
        };
        let timeout = duration_field("runner.timeout", &self.runner.timeout)?;

        let config = SuiteConfig {
            parallel_level,
            iterations: self.runner.iterations,
            prime_limit: self.workload.prime_limit,
            io: IoKernel {
                rounds: self.workload.io_rounds,
                wait: duration_field("workload.io_wait", &self.workload.io_wait)?,
                post_io_work: self.workload.io_post_work,
            },
            settle_delay: duration_field("runner.settle_delay", &self.runner.settle_delay)?,
            quiesce: self.runner.quiesce,
            warmup: self.runner.warmup,
            warmup_work: self.runner.warmup_work,
            warmup_settle: duration_field("runner.warmup_settle", &self.runner.warmup_settle)?,
            timeout: (!timeout.is_zero()).then_some(timeout),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            scalability: ScalabilitySettings {
                total_work: self.scalability.total_work,
                task_counts: self.scalability.task_counts.clone(),
                max_task_factor: self.scalability.max_task_factor,
                baseline: self.scalability.baseline,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be non-negative: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}

fn duration_field(field: &str, value: &str) -> Result<Duration, ConfigError> {
    ParabenchConfig::parse_duration(value).map_err(|e| ConfigError::InvalidDuration {
        field: field.to_string(),
        message: e.to_string(),
    })
}

//! Report Data Structures

use chrono::{DateTime, Utc};
use parabench_stats::Summary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version of the JSON layout
pub const SCHEMA_VERSION: u32 = 1;

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub scenarios: Vec<ScenarioReport>,
    pub summary: ReportSummary,
}

impl Report {
    /// Assemble a report and derive its summary from the scenarios
    pub fn new(meta: ReportMeta, scenarios: Vec<ScenarioReport>, total_duration: Duration) -> Self {
        let summary = ReportSummary::from_scenarios(&scenarios, total_duration);
        Self {
            meta,
            scenarios,
            summary,
        }
    }

    /// Whether any scenario failed or was skipped by cancellation
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.skipped > 0
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
    pub config: ReportConfig,
}

/// Harness settings captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub iterations: usize,
    pub prime_limit: u64,
    pub io_rounds: u32,
    pub io_wait_ns: u64,
    pub io_post_work: u64,
    pub scalability_total_work: u64,
    pub scalability_task_counts: Vec<usize>,
    pub settle_delay_ns: u64,
    pub quiesce: bool,
    pub warmup: bool,
    pub timeout_ns: u64,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    /// Parallel level used by the suite (defaults to `cpu_cores`)
    pub parallelism_level: usize,
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub id: String,
    pub title: String,
    pub status: ScenarioStatus,
    pub outcome: Option<ScenarioOutcome>,
    pub failure: Option<FailureInfo>,
    pub duration_ms: f64,
}

impl ScenarioReport {
    /// Scenario that ran to completion
    pub fn completed(
        id: impl Into<String>,
        title: impl Into<String>,
        outcome: ScenarioOutcome,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ScenarioStatus::Completed,
            outcome: Some(outcome),
            failure: None,
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }

    /// Scenario aborted by a failure
    pub fn failed(
        id: impl Into<String>,
        title: impl Into<String>,
        failure: FailureInfo,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ScenarioStatus::Failed,
            outcome: None,
            failure: Some(failure),
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }

    /// Scenario that never started
    pub fn skipped(id: impl Into<String>, title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ScenarioStatus::Skipped,
            outcome: None,
            failure: Some(FailureInfo {
                kind: "skipped".to_string(),
                message: reason.into(),
            }),
            duration_ms: 0.0,
        }
    }
}

/// Scenario execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Completed,
    Failed,
    Skipped,
}

/// Measured outcome of a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    /// Same workload at the concurrent and the parallel level
    Levels(LevelComparisonReport),
    /// Fixed total work over varying task counts
    Scalability(ScalabilityReport),
}

/// Concurrent vs parallel comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelComparisonReport {
    /// Measurements per level
    pub iterations: usize,
    /// Tasks launched per measurement
    pub task_count: usize,
    pub concurrent: LevelMetrics,
    pub parallel: LevelMetrics,
    /// `None` when the ratio is undefined
    pub speedup: Option<f64>,
    /// Percentage of linear scaling, `None` when undefined
    pub efficiency: Option<f64>,
    pub theoretical_max: usize,
    /// Why speedup/efficiency are undefined
    pub metric_error: Option<String>,
    pub note: Option<String>,
}

/// Timing summary at one parallelism level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelMetrics {
    pub level: usize,
    pub mean_ns: u64,
    pub stddev_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub samples: usize,
}

impl LevelMetrics {
    /// Convert a sample summary taken at `level`
    pub fn from_summary(level: usize, summary: &Summary) -> Self {
        Self {
            level,
            mean_ns: duration_nanos(summary.mean),
            stddev_ns: duration_nanos(summary.stddev),
            min_ns: duration_nanos(summary.min),
            max_ns: duration_nanos(summary.max),
            samples: summary.count,
        }
    }

    /// Mean as a `Duration`
    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.mean_ns)
    }

    /// Standard deviation in fractional milliseconds
    pub fn stddev_ms(&self) -> f64 {
        self.stddev_ns as f64 / 1_000_000.0
    }
}

/// Fixed-work scaling table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalabilityReport {
    /// Parallelism level held throughout
    pub level: usize,
    pub total_work: u64,
    /// Task count the speedup column is relative to
    pub baseline_tasks: Option<usize>,
    pub rows: Vec<ScalabilityRow>,
    /// Task counts skipped for exceeding the ceiling
    pub skipped: Vec<usize>,
}

/// One task count in the scaling table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalabilityRow {
    pub tasks: usize,
    /// Base share of work items per task
    pub work_per_task: u64,
    /// Work items across all tasks of this row
    pub total_work: u64,
    pub duration_ns: u64,
    /// Relative to the baseline row, `None` when undefined
    pub speedup: Option<f64>,
}

impl ScalabilityRow {
    /// Measured duration
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.duration_ns)
    }
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: String,
    pub message: String,
}

/// Totals across scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_scenarios: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: f64,
}

impl ReportSummary {
    /// Count scenario statuses
    pub fn from_scenarios(scenarios: &[ScenarioReport], total_duration: Duration) -> Self {
        let count = |status: ScenarioStatus| scenarios.iter().filter(|s| s.status == status).count();
        Self {
            total_scenarios: scenarios.len(),
            completed: count(ScenarioStatus::Completed),
            failed: count(ScenarioStatus::Failed),
            skipped: count(ScenarioStatus::Skipped),
            total_duration_ms: total_duration.as_secs_f64() * 1000.0,
        }
    }
}

/// Whole nanoseconds, saturating at `u64::MAX`
pub(crate) fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

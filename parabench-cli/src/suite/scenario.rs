//! Scenario identity and lifecycle
//!
//! Every scenario walks the same small state machine:
//!
//! ```text
//! NotStarted ──► Warming ──► Measuring(level) ──► Aggregating ──► Done
//!      │                      ▲      │
//!      └──────────────────────┘      └─► Measuring(level')
//!   (warm-up disabled)
//!
//! any non-terminal state ──► Failed
//! ```

use parabench_core::ParallelismLevel;
use std::fmt;
use tracing::debug;

/// The four measurement scenarios, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    /// CPU-bound prime counting, one task per core
    Cpu,
    /// Suspension-bound rounds, two tasks per core
    Io,
    /// CPU and I/O tasks alternating by launch index
    Mixed,
    /// Fixed total work split across a growing number of tasks
    Scalability,
}

impl ScenarioKind {
    /// All scenarios in the order the suite runs them
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Cpu,
        ScenarioKind::Io,
        ScenarioKind::Mixed,
        ScenarioKind::Scalability,
    ];

    /// Identifier matched by the CLI filter
    pub fn id(self) -> &'static str {
        match self {
            ScenarioKind::Cpu => "cpu",
            ScenarioKind::Io => "io",
            ScenarioKind::Mixed => "mixed",
            ScenarioKind::Scalability => "scalability",
        }
    }

    /// Header line printed above the scenario's output
    pub fn title(self) -> &'static str {
        match self {
            ScenarioKind::Cpu => "CPU-Intensive Tasks",
            ScenarioKind::Io => "I/O-Intensive Tasks",
            ScenarioKind::Mixed => "Mixed Workload (CPU + I/O)",
            ScenarioKind::Scalability => "Scalability Test",
        }
    }

    /// Tasks launched per measurement at the given parallel level.
    ///
    /// `None` for scalability, whose task count varies by row.
    pub fn task_count(self, level: ParallelismLevel) -> Option<usize> {
        match self {
            ScenarioKind::Cpu | ScenarioKind::Mixed => Some(level.get()),
            ScenarioKind::Io => Some(level.get() * 2),
            ScenarioKind::Scalability => None,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Lifecycle state of a running scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Nothing has run yet
    NotStarted,
    /// Warm-up fan-out in progress
    Warming,
    /// Taking a measurement at the given level
    Measuring(ParallelismLevel),
    /// All samples taken, deriving metrics
    Aggregating,
    /// Report produced
    Done,
    /// Aborted by an error
    Failed,
}

impl ScenarioState {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, ScenarioState::Done | ScenarioState::Failed)
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioState::NotStarted => f.write_str("not-started"),
            ScenarioState::Warming => f.write_str("warming"),
            ScenarioState::Measuring(level) => write!(f, "measuring({})", level),
            ScenarioState::Aggregating => f.write_str("aggregating"),
            ScenarioState::Done => f.write_str("done"),
            ScenarioState::Failed => f.write_str("failed"),
        }
    }
}

/// Rejected lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scenario {kind}: illegal transition {from} -> {to}")]
pub struct TransitionError {
    /// Scenario whose lifecycle was violated
    pub kind: ScenarioKind,
    /// State before the attempted transition
    pub from: ScenarioState,
    /// Requested state
    pub to: ScenarioState,
}

/// Tracks one scenario through its lifecycle
#[derive(Debug, Clone)]
pub struct ScenarioProgress {
    kind: ScenarioKind,
    state: ScenarioState,
}

impl ScenarioProgress {
    /// Fresh progress in `NotStarted`
    pub fn new(kind: ScenarioKind) -> Self {
        Self {
            kind,
            state: ScenarioState::NotStarted,
        }
    }

    /// Scenario being tracked
    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    /// Current state
    pub fn state(&self) -> ScenarioState {
        self.state
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn advance(&mut self, next: ScenarioState) -> Result<(), TransitionError> {
        use ScenarioState::*;

        let allowed = match (self.state, next) {
            (NotStarted, Warming) | (NotStarted, Measuring(_)) => true,
            (Warming, Measuring(_)) => true,
            (Measuring(_), Measuring(_)) | (Measuring(_), Aggregating) => true,
            (Aggregating, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        };

        if !allowed {
            return Err(TransitionError {
                kind: self.kind,
                from: self.state,
                to: next,
            });
        }

        debug!("scenario {}: {} -> {}", self.kind, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Mark the scenario failed; a no-op once terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!("scenario {}: {} -> {}", self.kind, self.state, ScenarioState::Failed);
            self.state = ScenarioState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: usize) -> ParallelismLevel {
        ParallelismLevel::new(n).unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut progress = ScenarioProgress::new(ScenarioKind::Cpu);
        progress.advance(ScenarioState::Warming).unwrap();
        progress.advance(ScenarioState::Measuring(level(1))).unwrap();
        progress.advance(ScenarioState::Measuring(level(4))).unwrap();
        progress.advance(ScenarioState::Measuring(level(1))).unwrap();
        progress.advance(ScenarioState::Aggregating).unwrap();
        progress.advance(ScenarioState::Done).unwrap();
        assert!(progress.state().is_terminal());
    }

    #[test]
    fn test_warmup_can_be_skipped() {
        let mut progress = ScenarioProgress::new(ScenarioKind::Io);
        assert!(progress.advance(ScenarioState::Measuring(level(2))).is_ok());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut progress = ScenarioProgress::new(ScenarioKind::Mixed);
        let err = progress.advance(ScenarioState::Done).unwrap_err();
        assert_eq!(err.from, ScenarioState::NotStarted);
        assert_eq!(err.to, ScenarioState::Done);

        progress.advance(ScenarioState::Warming).unwrap();
        assert!(progress.advance(ScenarioState::Aggregating).is_err());
        assert_eq!(progress.state(), ScenarioState::Warming);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut progress = ScenarioProgress::new(ScenarioKind::Scalability);
        progress.advance(ScenarioState::Measuring(level(4))).unwrap();
        progress.fail();
        assert_eq!(progress.state(), ScenarioState::Failed);
        assert!(progress.advance(ScenarioState::Failed).is_err());
        assert!(progress.advance(ScenarioState::Aggregating).is_err());
    }

    #[test]
    fn test_task_counts_follow_level() {
        let four = level(4);
        assert_eq!(ScenarioKind::Cpu.task_count(four), Some(4));
        assert_eq!(ScenarioKind::Io.task_count(four), Some(8));
        assert_eq!(ScenarioKind::Mixed.task_count(four), Some(4));
        assert_eq!(ScenarioKind::Scalability.task_count(four), None);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: std::collections::HashSet<_> =
            ScenarioKind::ALL.iter().map(|k| k.id()).collect();
        assert_eq!(ids.len(), ScenarioKind::ALL.len());
    }
}

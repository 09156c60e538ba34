//! Parallelism Control
//!
//! The worker-thread ceiling is an explicit [`SchedulerConfig`] rather than a
//! process-wide knob. A [`ParallelismController`] tracks the level currently
//! in effect and hands out [`ParallelismScope`]s: entering a scope sets the
//! level and builds a scheduler with exactly that many workers; dropping it
//! shuts the scheduler down and restores the previous level, including
//! during unwinding.
//!
//! A scope mutably borrows its controller, so two scopes can never overlap.
//!
//! Tasks that never yield cannot be cancelled. When a run gives up on such
//! tasks the scope is marked tainted; at teardown it waits the shutdown
//! timeout, then abandons the busy workers and counts the abandonment on the
//! controller so later measurements can be flagged.

use crate::error::{ConfigError, RuntimeError};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, error, warn};

/// How long a scope waits for its workers to stop before abandoning them
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of worker threads that may run tasks at once (always ≥ 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParallelismLevel(NonZeroUsize);

impl ParallelismLevel {
    /// A single worker: concurrency without parallelism
    pub const SINGLE: Self = Self(NonZeroUsize::MIN);

    /// Validate a worker count
    pub fn new(workers: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(workers)
            .map(Self)
            .ok_or(ConfigError::InvalidParallelism(workers))
    }

    /// Number of hardware threads available to this process (1 if unknown)
    pub fn available() -> Self {
        std::thread::available_parallelism()
            .map(Self)
            .unwrap_or(Self::SINGLE)
    }

    /// Worker count
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for ParallelismLevel {
    type Error = ConfigError;

    fn try_from(workers: usize) -> Result<Self, Self::Error> {
        Self::new(workers)
    }
}

impl fmt::Display for ParallelismLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler settings for one measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker-thread ceiling
    pub level: ParallelismLevel,
    /// Bound on waiting for workers at teardown
    pub shutdown_timeout: Duration,
}

impl SchedulerConfig {
    /// Config with the default shutdown timeout
    pub fn new(level: ParallelismLevel) -> Self {
        Self {
            level,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Override the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Build a multi-threaded scheduler with exactly `level` workers
    pub fn build_runtime(&self) -> Result<Runtime, RuntimeError> {
        let workers = self.level.get();
        debug!("building scheduler with {} worker thread(s)", workers);

        Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("parabench-worker")
            .enable_time()
            .build()
            .map_err(|source| {
                error!("failed to build scheduler: {}", source);
                RuntimeError::Build {
                    level: workers,
                    source,
                }
            })
    }
}

/// Owner of the parallelism level currently in effect
#[derive(Debug)]
pub struct ParallelismController {
    current: ParallelismLevel,
    shutdown_timeout: Duration,
    abandoned: usize,
}

impl ParallelismController {
    /// Create a controller whose resting level is `initial`
    pub fn new(initial: ParallelismLevel) -> Self {
        Self {
            current: initial,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            abandoned: 0,
        }
    }

    /// Override how long scopes wait for their workers at teardown
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Level currently in effect
    pub fn current(&self) -> ParallelismLevel {
        self.current
    }

    /// Scopes torn down while tasks they ran were still unfinished
    pub fn abandoned_scopes(&self) -> usize {
        self.abandoned
    }

    /// Set the level and return the one it replaced.
    ///
    /// Every call must be paired with a [`restore`](Self::restore); prefer
    /// [`scope`](Self::scope), which does the pairing on every exit path.
    pub fn set_limit(&mut self, level: ParallelismLevel) -> ParallelismLevel {
        let previous = std::mem::replace(&mut self.current, level);
        debug!("parallelism level {} -> {}", previous, level);
        previous
    }

    /// Put back a level returned by [`set_limit`](Self::set_limit)
    pub fn restore(&mut self, previous: ParallelismLevel) {
        debug!("parallelism level restored {} -> {}", self.current, previous);
        self.current = previous;
    }

    /// Enter a scope running at `level`.
    ///
    /// On build failure the previous level is restored before returning.
    pub fn scope(&mut self, level: ParallelismLevel) -> Result<ParallelismScope<'_>, RuntimeError> {
        let previous = self.set_limit(level);
        let config = SchedulerConfig::new(level).with_shutdown_timeout(self.shutdown_timeout);

        match config.build_runtime() {
            Ok(runtime) => {
                let handle = runtime.handle().clone();
                Ok(ParallelismScope {
                    controller: self,
                    previous,
                    config,
                    handle,
                    runtime: Some(runtime),
                    tainted: Arc::new(AtomicBool::new(false)),
                })
            }
            Err(e) => {
                self.restore(previous);
                Err(e)
            }
        }
    }
}

impl Default for ParallelismController {
    fn default() -> Self {
        Self::new(ParallelismLevel::available())
    }
}

/// Active parallelism setting plus the scheduler built for it.
///
/// Must be dropped outside of any async context.
pub struct ParallelismScope<'a> {
    controller: &'a mut ParallelismController,
    previous: ParallelismLevel,
    config: SchedulerConfig,
    handle: Handle,
    runtime: Option<Runtime>,
    tainted: Arc<AtomicBool>,
}

impl ParallelismScope<'_> {
    /// Level in effect for this scope
    pub fn level(&self) -> ParallelismLevel {
        self.config.level
    }

    /// Handle to the scope's scheduler
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Whether a run on this scope returned with tasks still in flight
    pub fn is_tainted(&self) -> bool {
        self.tainted.load(Ordering::Acquire)
    }

    pub(crate) fn taint_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.tainted)
    }
}

impl fmt::Debug for ParallelismScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelismScope")
            .field("level", &self.config.level)
            .field("previous", &self.previous)
            .field("tainted", &self.is_tainted())
            .finish()
    }
}

impl Drop for ParallelismScope<'_> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            if self.is_tainted() {
                warn!(
                    "scope at {} worker(s) has unfinished tasks; abandoning its workers after {:?}",
                    self.config.level, self.config.shutdown_timeout
                );
                self.controller.abandoned += 1;
            }
            if Handle::try_current().is_ok() {
                warn!("parallelism scope dropped inside an async context; shutting down in background");
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(self.config.shutdown_timeout);
            }
        }
        self.controller.restore(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::{Arc, Mutex};

    fn level(n: usize) -> ParallelismLevel {
        ParallelismLevel::new(n).unwrap()
    }

    #[test]
    fn test_level_rejects_zero() {
        assert_eq!(
            ParallelismLevel::new(0),
            Err(ConfigError::InvalidParallelism(0))
        );
        assert_eq!(level(3).get(), 3);
        assert_eq!(ParallelismLevel::SINGLE.get(), 1);
        assert!(ParallelismLevel::available().get() >= 1);
    }

    #[test]
    fn test_set_limit_returns_previous() {
        let mut controller = ParallelismController::new(level(8));
        let previous = controller.set_limit(level(1));
        assert_eq!(previous, level(8));
        assert_eq!(controller.current(), level(1));

        controller.restore(previous);
        assert_eq!(controller.current(), level(8));
    }

    #[test]
    fn test_scope_sets_and_restores() {
        let mut controller = ParallelismController::new(level(4));
        {
            let scope = controller.scope(level(2)).unwrap();
            assert_eq!(scope.level(), level(2));
            assert!(!scope.is_tainted());
        }
        assert_eq!(controller.current(), level(4));
        assert_eq!(controller.abandoned_scopes(), 0);
    }

    #[test]
    fn test_scope_restores_on_panic() {
        let mut controller = ParallelismController::new(level(4));

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _scope = controller.scope(level(1)).unwrap();
            panic!("measurement blew up");
        }));

        assert!(result.is_err());
        assert_eq!(controller.current(), level(4));
    }

    #[test]
    fn test_single_level_uses_one_worker_thread() {
        let mut controller = ParallelismController::new(level(4));
        let scope = controller.scope(ParallelismLevel::SINGLE).unwrap();
        let threads = Arc::new(Mutex::new(HashSet::new()));

        scope.handle().block_on(async {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let threads = Arc::clone(&threads);
                    tokio::spawn(async move {
                        threads.lock().unwrap().insert(std::thread::current().id());
                        tokio::task::yield_now().await;
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap();
            }
        });

        assert_eq!(threads.lock().unwrap().len(), 1);
    }
}

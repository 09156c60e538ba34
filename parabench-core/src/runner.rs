//! Fan-Out / Fan-In Task Runner
//!
//! Launches N independent tasks on a scope's scheduler and blocks until every
//! one of them has reported back.
//!
//! ```text
//!   stopwatch start
//!        │
//!   spawn task 0..N ──► each task: catch_unwind(kernel) ──► Completion ──┐
//!        │                                                               │
//!        ▼                                                               ▼
//!   barrier: recv() until N completions   ◄──── bounded channel (cap N) ─┘
//!        │        (or timeout / cancellation / channel closed)
//!        ▼
//!   stopwatch stop
//! ```
//!
//! Every task sends exactly one `Completion`, whether it finished or panicked,
//! so a failure can never leave the barrier waiting on a lost signal.
//!
//! The barrier waits on its own single-threaded clock. Measured workers busy
//! in code that never yields cannot starve the deadline or the cancellation
//! check.

use crate::error::{ConfigError, RuntimeError, TaskFailure, TaskRunnerError};
use crate::measure::Stopwatch;
use crate::parallelism::{ParallelismLevel, ParallelismScope};
use crate::workload::Workload;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Report sent by each task exactly once
#[derive(Debug)]
struct Completion {
    index: usize,
    outcome: Result<(), String>,
}

/// Runs batches of tasks on the scheduler of one [`ParallelismScope`]
#[derive(Debug, Clone)]
pub struct TaskRunner {
    handle: Handle,
    level: ParallelismLevel,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    tainted: Arc<AtomicBool>,
}

impl TaskRunner {
    /// Runner bound to the scope's scheduler, with no timeout
    pub fn new(scope: &ParallelismScope<'_>) -> Self {
        Self {
            handle: scope.handle().clone(),
            level: scope.level(),
            timeout: None,
            cancel: CancellationToken::new(),
            tainted: scope.taint_flag(),
        }
    }

    /// Give up on a run after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort a run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Parallelism level of the underlying scheduler
    pub fn level(&self) -> ParallelismLevel {
        self.level
    }

    /// Launch `task_count` tasks built by `make_task` and wait for all of them.
    ///
    /// Returns the wall time from just before the first launch to the last
    /// completion. Task outputs are not collected. On timeout or cancellation
    /// the unfinished tasks are aborted at their next yield point and the
    /// scope is marked tainted.
    pub fn run<F, Fut>(&self, task_count: usize, make_task: F) -> Result<Duration, TaskRunnerError>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if task_count == 0 {
            return Err(ConfigError::InvalidTaskCount(task_count).into());
        }
        let barrier = barrier_runtime()?;

        debug!(
            "running {} task(s) on {} worker(s)",
            task_count, self.level
        );
        let (tx, rx) = mpsc::channel::<Completion>(task_count);

        let stopwatch = Stopwatch::start();
        let tasks: Vec<JoinHandle<()>> = (0..task_count)
            .map(|index| {
                let tx = tx.clone();
                let task = make_task(index);
                self.handle.spawn(async move {
                    let outcome = AssertUnwindSafe(task)
                        .catch_unwind()
                        .await
                        .map_err(panic_message);
                    // Capacity equals the task count, so this never waits
                    let _ = tx.send(Completion { index, outcome }).await;
                })
            })
            .collect();
        drop(tx);

        let result = barrier.block_on(self.wait_all(rx, task_count));
        let elapsed = stopwatch.stop();

        let failures = match result {
            Ok(failures) => failures,
            Err(e) => {
                if matches!(
                    e,
                    TaskRunnerError::TimedOut { .. } | TaskRunnerError::Cancelled { .. }
                ) {
                    for task in &tasks {
                        task.abort();
                    }
                    self.tainted.store(true, Ordering::Release);
                }
                return Err(e);
            }
        };

        if !failures.is_empty() {
            return Err(TaskRunnerError::TaskFailed {
                failures,
                expected: task_count,
            });
        }

        Ok(elapsed)
    }

    /// Launch `task_count` tasks, each running the kernel `workload` assigns to its index
    pub fn run_workload(
        &self,
        task_count: usize,
        workload: &Workload,
    ) -> Result<Duration, TaskRunnerError> {
        let workload = *workload;
        self.run(task_count, move |index| workload.kernel_for(index).run())
    }

    /// Collect one completion per task, returning the failed ones by index
    async fn wait_all(
        &self,
        mut rx: mpsc::Receiver<Completion>,
        task_count: usize,
    ) -> Result<Vec<TaskFailure>, TaskRunnerError> {
        let deadline = deadline_elapsed(self.timeout);
        tokio::pin!(deadline);

        let mut completed = 0;
        let mut failures = Vec::new();
        while completed < task_count {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!("run cancelled with {} of {} task(s) complete", completed, task_count);
                    return Err(TaskRunnerError::Cancelled {
                        completed,
                        expected: task_count,
                    });
                }
                _ = &mut deadline => {
                    let timeout = self.timeout.unwrap_or_default();
                    warn!("run timed out after {:?} with {} of {} task(s) complete", timeout, completed, task_count);
                    return Err(TaskRunnerError::TimedOut {
                        timeout,
                        completed,
                        expected: task_count,
                    });
                }
                next = rx.recv() => next,
            };

            match next {
                Some(completion) => {
                    completed += 1;
                    if let Err(message) = completion.outcome {
                        failures.push(TaskFailure {
                            index: completion.index,
                            message,
                        });
                    }
                }
                None => {
                    return Err(TaskRunnerError::LostCompletion {
                        expected: task_count,
                        received: completed,
                    });
                }
            }
        }

        failures.sort_by_key(|f| f.index);
        Ok(failures)
    }
}

fn barrier_runtime() -> Result<Runtime, RuntimeError> {
    Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|source| RuntimeError::Barrier { source })
}

async fn deadline_elapsed(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{IoKernel, Kernel};
    use crate::parallelism::ParallelismController;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn controller() -> ParallelismController {
        ParallelismController::new(ParallelismLevel::available())
            .with_shutdown_timeout(Duration::from_millis(100))
    }

    fn level(n: usize) -> ParallelismLevel {
        ParallelismLevel::new(n).unwrap()
    }

    #[test]
    fn test_every_task_completes_exactly_once() {
        let mut controller = controller();
        for workers in [1, 4] {
            let scope = controller.scope(level(workers)).unwrap();
            let runner = TaskRunner::new(&scope);
            let counter = Arc::new(AtomicUsize::new(0));
            let per_task: Arc<Vec<AtomicUsize>> =
                Arc::new((0..64).map(|_| AtomicUsize::new(0)).collect());

            let elapsed = runner
                .run(64, |index| {
                    let counter = Arc::clone(&counter);
                    let per_task = Arc::clone(&per_task);
                    async move {
                        tokio::task::yield_now().await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        per_task[index].fetch_add(1, Ordering::SeqCst);
                    }
                })
                .unwrap();

            assert_eq!(counter.load(Ordering::SeqCst), 64);
            assert!(per_task.iter().all(|c| c.load(Ordering::SeqCst) == 1));
            assert!(elapsed > Duration::ZERO);
        }
    }

    #[test]
    fn test_zero_tasks_rejected() {
        let mut controller = controller();
        let scope = controller.scope(level(1)).unwrap();
        let runner = TaskRunner::new(&scope);

        let err = runner.run(0, |_| async {}).unwrap_err();
        assert!(matches!(
            err,
            TaskRunnerError::Config(ConfigError::InvalidTaskCount(0))
        ));
    }

    #[test]
    fn test_panicking_tasks_are_reported() {
        let mut controller = controller();
        let scope = controller.scope(level(2)).unwrap();
        let runner = TaskRunner::new(&scope).with_timeout(Duration::from_secs(10));

        let err = runner
            .run(6, |index| async move {
                if index % 3 == 1 {
                    panic!("task {index} exploded");
                }
            })
            .unwrap_err();

        match &err {
            TaskRunnerError::TaskFailed { failures, expected } => {
                assert_eq!(*expected, 6);
                assert_eq!(err.failed_indices(), vec![1, 4]);
                assert_eq!(failures[0].message, "task 1 exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_instead_of_hang() {
        let mut controller = controller();
        let scope = controller.scope(level(2)).unwrap();
        let runner = TaskRunner::new(&scope).with_timeout(Duration::from_millis(50));

        let err = runner
            .run(3, |index| async move {
                if index == 0 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            })
            .unwrap_err();

        assert!(matches!(
            err,
            TaskRunnerError::TimedOut {
                completed: 2,
                expected: 3,
                ..
            }
        ));
    }

    /// Busy-wait without ever reaching an await point
    fn spin_for(duration: Duration) {
        let until = std::time::Instant::now() + duration;
        while std::time::Instant::now() < until {
            std::hint::spin_loop();
        }
    }

    #[test]
    fn test_timeout_fires_while_workers_never_yield() {
        let mut controller = controller();
        {
            let scope = controller.scope(level(2)).unwrap();
            let runner = TaskRunner::new(&scope).with_timeout(Duration::from_millis(50));

            let started = std::time::Instant::now();
            let err = runner
                .run(2, |_| async { spin_for(Duration::from_secs(3)) })
                .unwrap_err();
            let waited = started.elapsed();

            assert!(matches!(
                err,
                TaskRunnerError::TimedOut {
                    completed: 0,
                    expected: 2,
                    ..
                }
            ));
            assert!(waited < Duration::from_secs(1), "barrier waited {waited:?}");
            assert!(scope.is_tainted());
        }
        assert_eq!(controller.abandoned_scopes(), 1);
        assert_eq!(controller.current(), ParallelismLevel::available());
    }

    #[test]
    fn test_cancellation_reaches_barrier_while_workers_spin() {
        let mut controller = controller();
        let scope = controller.scope(level(1)).unwrap();
        let token = CancellationToken::new();
        let runner = TaskRunner::new(&scope).with_cancellation(token.clone());

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            token.cancel();
        });
        let started = std::time::Instant::now();
        let err = runner
            .run(1, |_| async { spin_for(Duration::from_secs(3)) })
            .unwrap_err();
        canceller.join().unwrap();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(scope.is_tainted());
    }

    #[test]
    fn test_clean_run_leaves_scope_untainted() {
        let mut controller = controller();
        let scope = controller.scope(level(2)).unwrap();
        TaskRunner::new(&scope)
            .with_timeout(Duration::from_secs(10))
            .run(4, |_| async { spin_for(Duration::from_millis(1)) })
            .unwrap();
        assert!(!scope.is_tainted());
    }

    #[test]
    fn test_cancellation_stops_the_barrier() {
        let mut controller = controller();
        let scope = controller.scope(level(1)).unwrap();
        let token = CancellationToken::new();
        let runner = TaskRunner::new(&scope).with_cancellation(token.clone());

        let trigger = token.clone();
        let err = runner
            .run(2, move |index| {
                let trigger = trigger.clone();
                async move {
                    if index == 0 {
                        trigger.cancel();
                    } else {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            })
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[test]
    fn test_io_workload_interleaves_on_one_worker() {
        let mut controller = controller();
        let scope = controller.scope(ParallelismLevel::SINGLE).unwrap();
        let runner = TaskRunner::new(&scope);
        let io = IoKernel {
            rounds: 5,
            wait: Duration::from_millis(20),
            post_io_work: 1_000,
        };

        let elapsed = runner
            .run_workload(8, &Workload::Uniform(Kernel::Io(io)))
            .unwrap();

        assert!(elapsed >= io.min_wall_time());
        // Serialized waits would take 8 * 100ms
        assert!(elapsed < io.min_wall_time() * 4, "elapsed {elapsed:?}");
    }

    #[test]
    fn test_runner_reports_level() {
        let mut controller = controller();
        let scope = controller.scope(level(3)).unwrap();
        assert_eq!(TaskRunner::new(&scope).level(), level(3));
    }
}

//! Wall-Clock Timing
//!
//! Monotonic stopwatch used to time a whole fan-out/fan-in run.

use std::time::{Duration, Instant};

/// Stopwatch started at construction
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Start a new stopwatch
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed so far, without stopping
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the stopwatch and return the elapsed time
    #[inline(always)]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

/// Run `f` once and return its output together with its wall time
#[inline]
pub fn time<T, F>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let stopwatch = Stopwatch::start();
    let output = f();
    (output, stopwatch.stop())
}

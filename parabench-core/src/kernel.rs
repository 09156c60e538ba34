//! Workload Kernels
//!
//! Task bodies that burn a reproducible amount of time in a characteristic
//! way. None of them touch shared state, so measurements reflect scheduling
//! behavior rather than contention.

use std::hint::black_box;
use std::time::Duration;

/// Primes below this limit are counted by the CPU kernel
pub const DEFAULT_PRIME_LIMIT: u64 = 100_000;

/// Suspension rounds per I/O kernel invocation
pub const DEFAULT_IO_ROUNDS: u32 = 20;

/// Simulated latency of one I/O round
pub const DEFAULT_IO_WAIT: Duration = Duration::from_millis(5);

/// Integers summed after each I/O round (post-processing work)
pub const DEFAULT_IO_POST_WORK: u64 = 50_000;

/// Count primes strictly below `limit` by trial division up to √n.
///
/// `count_primes(100_000) == 9592`.
pub fn count_primes(limit: u64) -> u64 {
    let mut count = 0;
    for n in 2..limit {
        let mut is_prime = true;
        let mut i = 2;
        while i * i <= n {
            if n % i == 0 {
                is_prime = false;
                break;
            }
            i += 1;
        }
        if is_prime {
            count += 1;
        }
    }
    count
}

/// CPU-bound task body: count primes and discard the result
#[inline(never)]
pub fn cpu_task(limit: u64) {
    black_box(count_primes(black_box(limit)));
}

/// Wrapping sum of `0..n`
pub fn sum_range(n: u64) -> u64 {
    let mut sum = 0u64;
    for j in 0..n {
        sum = sum.wrapping_add(j);
    }
    sum
}

/// Wrapping sum of `j * j` for `j` in `0..n`
pub fn sum_of_squares(n: u64) -> u64 {
    let mut sum = 0u64;
    for j in 0..n {
        sum = sum.wrapping_add(j.wrapping_mul(j));
    }
    sum
}

/// Parameters of the simulated I/O kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoKernel {
    /// Number of wait/process rounds
    pub rounds: u32,
    /// Suspension per round
    pub wait: Duration,
    /// Integers summed after each wait
    pub post_io_work: u64,
}

impl Default for IoKernel {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_IO_ROUNDS,
            wait: DEFAULT_IO_WAIT,
            post_io_work: DEFAULT_IO_POST_WORK,
        }
    }
}

impl IoKernel {
    /// Lower bound on the wall time of one invocation
    pub fn min_wall_time(&self) -> Duration {
        self.wait * self.rounds
    }
}

/// I/O-bound task body.
///
/// Each round suspends on the scheduler's timer, freeing the worker for other
/// ready tasks, then does a small amount of CPU work.
pub async fn io_task(kernel: IoKernel) {
    for _ in 0..kernel.rounds {
        tokio::time::sleep(kernel.wait).await;
        black_box(sum_range(black_box(kernel.post_io_work)));
    }
}

/// Discriminant of a [`Kernel`], used for reporting task assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    /// Prime counting
    Cpu,
    /// Suspend-then-process rounds
    Io,
    /// Fixed-size summation of squares
    SumOfSquares,
}

/// One task body with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// CPU-bound prime counting below `prime_limit`
    Cpu {
        /// Exclusive upper bound of the prime search
        prime_limit: u64,
    },
    /// I/O-bound suspension rounds
    Io(IoKernel),
    /// Summation of squares over `work_items` integers
    SumOfSquares {
        /// Number of integers to square and sum
        work_items: u64,
    },
}

impl Kernel {
    /// CPU kernel with the default prime limit
    pub fn cpu() -> Self {
        Kernel::Cpu {
            prime_limit: DEFAULT_PRIME_LIMIT,
        }
    }

    /// I/O kernel with the default rounds and wait
    pub fn io() -> Self {
        Kernel::Io(IoKernel::default())
    }

    /// Which family this kernel belongs to
    pub fn kind(&self) -> KernelKind {
        match self {
            Kernel::Cpu { .. } => KernelKind::Cpu,
            Kernel::Io(_) => KernelKind::Io,
            Kernel::SumOfSquares { .. } => KernelKind::SumOfSquares,
        }
    }

    /// Execute the kernel once.
    ///
    /// CPU-bound variants run to completion without yielding.
    pub async fn run(self) {
        match self {
            Kernel::Cpu { prime_limit } => cpu_task(prime_limit),
            Kernel::Io(io) => io_task(io).await,
            Kernel::SumOfSquares { work_items } => {
                black_box(sum_of_squares(black_box(work_items)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_count_primes_known_values() {
        assert_eq!(count_primes(0), 0);
        assert_eq!(count_primes(2), 0);
        assert_eq!(count_primes(3), 1);
        assert_eq!(count_primes(10), 4);
        assert_eq!(count_primes(100), 25);
        assert_eq!(count_primes(DEFAULT_PRIME_LIMIT), 9592);
    }

    #[test]
    fn test_count_primes_is_deterministic() {
        let first = count_primes(DEFAULT_PRIME_LIMIT);
        let second = count_primes(DEFAULT_PRIME_LIMIT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sums() {
        assert_eq!(sum_range(0), 0);
        assert_eq!(sum_range(5), 10);
        assert_eq!(sum_range(DEFAULT_IO_POST_WORK), 1_249_975_000);
        assert_eq!(sum_of_squares(4), 14);
    }

    #[test]
    fn test_sum_of_squares_wraps_instead_of_overflowing() {
        // Exceeds u64::MAX before wrapping
        let _ = sum_of_squares(10_000_000);
    }

    #[tokio::test]
    async fn test_io_task_takes_at_least_rounds_times_wait() {
        let kernel = IoKernel::default();
        let start = Instant::now();
        io_task(kernel).await;
        let elapsed = start.elapsed();

        assert_eq!(kernel.min_wall_time(), Duration::from_millis(100));
        assert!(elapsed >= kernel.min_wall_time(), "elapsed {elapsed:?}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_io_task_yields_to_other_tasks_on_one_worker() {
        let kernel = IoKernel {
            rounds: 4,
            wait: Duration::from_millis(25),
            post_io_work: 1_000,
        };

        let start = Instant::now();
        let handles: Vec<_> = (0..8).map(|_| tokio::spawn(io_task(kernel))).collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let elapsed = start.elapsed();

        // Sequential execution would need 8 * 100ms
        assert!(elapsed >= kernel.min_wall_time());
        assert!(elapsed < kernel.min_wall_time() * 4, "elapsed {elapsed:?}");
    }

    #[test]
    fn test_kernel_kinds() {
        assert_eq!(Kernel::cpu().kind(), KernelKind::Cpu);
        assert_eq!(Kernel::io().kind(), KernelKind::Io);
        assert_eq!(
            Kernel::SumOfSquares { work_items: 1 }.kind(),
            KernelKind::SumOfSquares
        );
    }
}

//! Workload Assignment
//!
//! Maps task indices to kernels and divides fixed amounts of work across a
//! variable number of tasks.

use crate::kernel::Kernel;

/// Assignment of kernels to launched tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Every task runs the same kernel
    Uniform(Kernel),
    /// Tasks alternate by position: even indices run `even`, odd run `odd`
    Alternating {
        /// Kernel for indices 0, 2, 4, ...
        even: Kernel,
        /// Kernel for indices 1, 3, 5, ...
        odd: Kernel,
    },
}

impl Workload {
    /// CPU tasks on even indices, I/O tasks on odd ones
    pub fn mixed(cpu: Kernel, io: Kernel) -> Self {
        Workload::Alternating { even: cpu, odd: io }
    }

    /// Kernel run by the task launched at `index`
    pub fn kernel_for(&self, index: usize) -> Kernel {
        match *self {
            Workload::Uniform(kernel) => kernel,
            Workload::Alternating { even, odd } => {
                if index % 2 == 0 {
                    even
                } else {
                    odd
                }
            }
        }
    }

    /// Kernels for the first `task_count` launch indices
    pub fn assignments(&self, task_count: usize) -> Vec<Kernel> {
        (0..task_count).map(|i| self.kernel_for(i)).collect()
    }
}

/// Exact division of `total` work items over `tasks` tasks.
///
/// Every task gets `total / tasks` items; the first `total % tasks` tasks get
/// one more, so the shares always add up to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSplit {
    total: u64,
    tasks: u64,
}

impl WorkSplit {
    /// Split `total` items over `tasks` tasks; `None` when `tasks` is zero
    pub fn new(total: u64, tasks: usize) -> Option<Self> {
        if tasks == 0 {
            return None;
        }
        Some(Self {
            total,
            tasks: tasks as u64,
        })
    }

    /// Items given to every task
    pub fn base_share(&self) -> u64 {
        self.total / self.tasks
    }

    /// Items given to the task at `index`
    pub fn share(&self, index: usize) -> u64 {
        let remainder = self.total % self.tasks;
        self.base_share() + u64::from((index as u64) < remainder)
    }

    /// Total items across all tasks
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of tasks
    pub fn tasks(&self) -> usize {
        self.tasks as usize
    }
}

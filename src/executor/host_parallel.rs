//! Host-parallel executor: multi-threaded host backend on the rayon pool
//!
//! Kernels dispatched here may fan one operation out across worker threads,
//! but the fan-out is invisible at the dispatch boundary: `Executor::run`
//! returns only once the whole operation has completed, so sequentially
//! dispatched operations still observe a total order.

use super::memory::{HostMemorySpace, MemorySpace};

/// Multi-threaded host executor
#[derive(Debug, Default)]
pub struct HostParallelExecutor {
    mem: HostMemorySpace,
}

impl HostParallelExecutor {
    /// Create the host-parallel executor
    pub fn new() -> Self {
        Self::default()
    }

    /// The host memory space owned by this executor
    pub fn memory(&self) -> &dyn MemorySpace {
        &self.mem
    }

    /// Number of worker threads kernels may fan out across
    pub fn num_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

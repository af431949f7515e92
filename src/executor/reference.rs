//! Reference executor: single-threaded host backend
//!
//! The reference backend is the correctness baseline the other backends are
//! tested against. Its kernels are written for clarity, not speed.

use super::memory::{HostMemorySpace, MemorySpace};

/// Single-threaded host executor
#[derive(Debug, Default)]
pub struct ReferenceExecutor {
    mem: HostMemorySpace,
}

impl ReferenceExecutor {
    /// Create the reference executor
    pub fn new() -> Self {
        Self::default()
    }

    /// The host memory space owned by this executor
    pub fn memory(&self) -> &dyn MemorySpace {
        &self.mem
    }
}

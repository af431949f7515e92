//! Accelerator executor, compiled as a device hook in this build
//!
//! The executor variant exists so code can be written against it, but every
//! operational method fails with a module-not-compiled error until a real
//! device module is linked in. This mirrors the contract of
//! [`DeviceMemorySpace`](super::memory::DeviceMemorySpace): construction
//! succeeds, use does not.

use super::memory::{DeviceMemorySpace, MemorySpace};
use super::Executor;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Accelerator (device) executor
#[derive(Debug)]
pub struct AcceleratorExecutor {
    device_id: usize,
    mem: DeviceMemorySpace,
    /// Host executor used for staging copies and lifetime checks only
    master: Arc<Executor>,
}

impl AcceleratorExecutor {
    pub(super) fn new(device_id: usize, master: Arc<Executor>) -> Self {
        Self {
            device_id,
            mem: DeviceMemorySpace::new(device_id),
            master,
        }
    }

    /// The device this executor is bound to
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// The device memory space owned by this executor
    pub fn memory(&self) -> &dyn MemorySpace {
        &self.mem
    }

    /// The host executor used for staging copies
    pub fn master(&self) -> &Arc<Executor> {
        &self.master
    }

    /// Block until outstanding device work completes
    pub fn synchronize(&self) -> Result<()> {
        Err(Error::ModuleNotCompiled {
            module: "accelerator",
        })
    }
}

/// Process-wide device count, queried once and cached
static DEVICE_COUNT: Mutex<Option<usize>> = Mutex::new(None);

fn query_device_count() -> usize {
    // Hook build: no device module linked in
    0
}

/// Number of accelerator devices visible to this process
///
/// The query runs once per process and is cached afterwards; tests that
/// need a fresh query call [`reset_device_count`].
pub fn device_count() -> usize {
    let mut cached = DEVICE_COUNT.lock();
    *cached.get_or_insert_with(query_device_count)
}

/// Drop the cached device count so the next query runs again
///
/// Test-isolation hook; production code has no reason to call this.
pub fn reset_device_count() {
    *DEVICE_COUNT.lock() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_count_is_cached_and_resettable() {
        reset_device_count();
        assert_eq!(device_count(), 0);
        // Second query hits the cache
        assert_eq!(device_count(), 0);
        reset_device_count();
        assert_eq!(device_count(), 0);
    }

    #[test]
    fn synchronize_names_the_missing_module() {
        let master = Executor::reference();
        let exec = AcceleratorExecutor::new(0, master);
        let err = exec.synchronize().unwrap_err();
        assert_eq!(err.to_string(), "The accelerator module is not compiled");
    }
}

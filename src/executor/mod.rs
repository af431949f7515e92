//! Executors: compute contexts that own memory and resolve operations
//!
//! An [`Executor`] represents one place computation can run. It owns a
//! [`MemorySpace`], and its single extensibility point is resolving an
//! [`Operation`](crate::operation::Operation): `Executor::run` selects, by
//! executor variant, which of the operation's backend entry points executes.
//! Algorithm code builds an operation value and calls `run` once; no
//! backend conditionals appear at the call site.
//!
//! Executors are shared by reference (`Arc`) across every array and linear
//! operator they host, and executor identity is pointer identity.

mod accelerator;
mod distributed;
mod host_parallel;
pub mod memory;
mod reference;

pub use accelerator::{device_count, reset_device_count, AcceleratorExecutor};
pub use distributed::DistributedExecutor;
pub use host_parallel::HostParallelExecutor;
pub use reference::ReferenceExecutor;

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::scalar::Element;
use memory::MemorySpace;
use std::sync::Arc;

/// One compute context
///
/// The variant set is closed: dispatch is a single match over it, which is
/// what lets operations carry one entry point per backend instead of every
/// matrix type carrying a virtual method per kernel.
#[derive(Debug)]
pub enum Executor {
    /// Single-threaded host baseline
    Reference(ReferenceExecutor),
    /// Multi-threaded host backend
    HostParallel(HostParallelExecutor),
    /// Accelerator device (hook in this build)
    Accelerator(AcceleratorExecutor),
    /// Distributed wrapper (stub in this build)
    Distributed(DistributedExecutor),
}

impl Executor {
    /// Create the reference executor
    pub fn reference() -> Arc<Self> {
        Arc::new(Self::Reference(ReferenceExecutor::new()))
    }

    /// Create the host-parallel executor
    pub fn host_parallel() -> Arc<Self> {
        Arc::new(Self::HostParallel(HostParallelExecutor::new()))
    }

    /// Create an accelerator executor bound to `device_id`
    ///
    /// `master` is the host executor used for staging copies; it is kept as
    /// a back-reference only and never owns the accelerator's storage.
    pub fn accelerator(device_id: usize, master: Arc<Self>) -> Arc<Self> {
        Arc::new(Self::Accelerator(AcceleratorExecutor::new(
            device_id, master,
        )))
    }

    /// Create a distributed executor over named sub-executors
    pub fn distributed(sub_executors: Vec<String>, launch_args: Vec<String>) -> Arc<Self> {
        Arc::new(Self::Distributed(DistributedExecutor::new(
            sub_executors,
            launch_args,
        )))
    }

    /// Backend name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reference(_) => "reference",
            Self::HostParallel(_) => "host-parallel",
            Self::Accelerator(_) => "accelerator",
            Self::Distributed(_) => "distributed",
        }
    }

    /// The memory space owned by this executor
    pub fn memory(&self) -> &dyn MemorySpace {
        match self {
            Self::Reference(e) => e.memory(),
            Self::HostParallel(e) => e.memory(),
            Self::Accelerator(e) => e.memory(),
            // The stub has no memory of its own; distributed data would
            // live on the per-rank sub-executors.
            Self::Distributed(_) => &NO_MEMORY,
        }
    }

    /// Whether host code may dereference pointers into this executor's memory
    pub fn host_accessible(&self) -> bool {
        self.memory().host_accessible()
    }

    /// Run one operation: the double dispatch point
    ///
    /// The executor variant picks the backend entry point; the operation
    /// value carries the typed arguments that entry point needs. Entry
    /// points a backend does not implement fail fast with
    /// [`Error::OperationNotSupported`](crate::error::Error::OperationNotSupported).
    pub fn run<O: Operation>(&self, op: O) -> Result<()> {
        match self {
            Self::Reference(e) => op.run_reference(e),
            Self::HostParallel(e) => op.run_host_parallel(e),
            Self::Accelerator(e) => op.run_accelerator(e),
            Self::Distributed(e) => op.run_distributed(e),
        }
    }

    /// Block until all outstanding work on this executor completes
    ///
    /// Host backends execute synchronously, so this returns immediately.
    /// This is the only sanctioned way to observe completion of
    /// asynchronous backend work, and it surfaces any deferred backend
    /// fault as an error attributable to the executor.
    pub fn synchronize(&self) -> Result<()> {
        match self {
            Self::Reference(_) | Self::HostParallel(_) => Ok(()),
            Self::Accelerator(e) => e.synchronize(),
            Self::Distributed(e) => e.synchronize(),
        }
    }

    /// Allocate storage for `n` elements of `T`
    ///
    /// Zero-length requests return a null pointer without touching the
    /// memory space.
    pub fn alloc<T: Element>(&self, n: usize) -> Result<*mut T> {
        if n == 0 {
            return Ok(std::ptr::null_mut());
        }
        let bytes = n
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::invalid_argument("n", format!("{n} elements overflow usize")))?;
        let ptr = self.memory().alloc_bytes(bytes, std::mem::align_of::<T>())?;
        Ok(ptr.cast())
    }

    /// Release storage previously allocated with [`alloc`](Self::alloc)
    ///
    /// # Safety
    /// `ptr` must come from `alloc::<T>(n)` on this same executor and must
    /// not be used afterwards.
    pub unsafe fn free<T: Element>(&self, ptr: *mut T, n: usize) {
        if ptr.is_null() || n == 0 {
            return;
        }
        // A count that overflows usize cannot come from `alloc`, so there
        // is nothing to release.
        let Some(bytes) = n.checked_mul(std::mem::size_of::<T>()) else {
            return;
        };
        self.memory()
            .dealloc_bytes(ptr.cast(), bytes, std::mem::align_of::<T>());
    }

    /// Copy `n` elements from `src_exec`'s memory into this executor's
    ///
    /// Host-to-host pairs are a memcpy. Pairs with no direct path would
    /// stage through host memory; with the accelerator compiled as a hook,
    /// any such pair fails with that backend's module error before data
    /// moves.
    ///
    /// # Safety
    /// `src` must be valid for `n` reads on `src_exec`, `dst` for `n`
    /// writes on `self`, and the ranges must not overlap.
    pub unsafe fn copy_from<T: Element>(
        &self,
        dst: *mut T,
        src_exec: &Executor,
        src: *const T,
        n: usize,
    ) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        if self.host_accessible() && src_exec.host_accessible() {
            std::ptr::copy_nonoverlapping(src, dst, n);
            return Ok(());
        }
        // Reaching a non-host-accessible space means its module is a hook;
        // report the side that cannot participate.
        let side = if self.host_accessible() { src_exec } else { self };
        Err(crate::error::Error::ModuleNotCompiled {
            module: match side {
                Self::Accelerator(_) => "accelerator",
                _ => "distributed",
            },
        })
    }

    /// Copy from a host slice into this executor's memory
    ///
    /// # Safety
    /// `dst` must be valid for `src.len()` writes on this executor.
    pub unsafe fn copy_from_host<T: Element>(&self, dst: *mut T, src: &[T]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        if !self.host_accessible() {
            return Err(crate::error::Error::NotHostAccessible {
                backend: self.name(),
            });
        }
        std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
        Ok(())
    }

    /// Copy from this executor's memory into a host slice
    ///
    /// # Safety
    /// `src` must be valid for `dst.len()` reads on this executor.
    pub unsafe fn copy_to_host<T: Element>(&self, src: *const T, dst: &mut [T]) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        if !self.host_accessible() {
            return Err(crate::error::Error::NotHostAccessible {
                backend: self.name(),
            });
        }
        std::ptr::copy_nonoverlapping(src, dst.as_mut_ptr(), dst.len());
        Ok(())
    }
}

/// Two executor handles denote the same context iff they are the same object
pub fn same_executor(a: &Arc<Executor>, b: &Arc<Executor>) -> bool {
    Arc::ptr_eq(a, b)
}

/// Placeholder space for the distributed stub
struct NoMemorySpace;

static NO_MEMORY: NoMemorySpace = NoMemorySpace;

impl MemorySpace for NoMemorySpace {
    fn name(&self) -> &'static str {
        "distributed"
    }

    fn host_accessible(&self) -> bool {
        false
    }

    fn alloc_bytes(&self, _size: usize, _align: usize) -> Result<*mut u8> {
        Err(crate::error::Error::ModuleNotCompiled {
            module: "distributed",
        })
    }

    unsafe fn dealloc_bytes(&self, _ptr: *mut u8, _size: usize, _align: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn executor_identity_is_pointer_identity() {
        let a = Executor::reference();
        let b = Executor::reference();
        assert!(same_executor(&a, &a.clone()));
        assert!(!same_executor(&a, &b));
    }

    #[test]
    fn host_executors_synchronize_immediately() {
        assert!(Executor::reference().synchronize().is_ok());
        assert!(Executor::host_parallel().synchronize().is_ok());
    }

    #[test]
    fn stub_executors_fail_to_synchronize() {
        let acc = Executor::accelerator(0, Executor::reference());
        let dist = Executor::distributed(vec!["reference".into()], vec![]);
        assert!(matches!(
            acc.synchronize().unwrap_err(),
            Error::ModuleNotCompiled {
                module: "accelerator"
            }
        ));
        assert!(matches!(
            dist.synchronize().unwrap_err(),
            Error::ModuleNotCompiled {
                module: "distributed"
            }
        ));
    }

    #[test]
    fn accelerator_allocation_fails_before_data_moves() {
        let acc = Executor::accelerator(0, Executor::reference());
        let err = acc.alloc::<f64>(16).unwrap_err();
        assert!(matches!(
            err,
            Error::ModuleNotCompiled {
                module: "accelerator"
            }
        ));
    }

    #[test]
    fn zero_length_allocations_are_null_and_free_is_a_noop() {
        let exec = Executor::reference();
        let ptr = exec.alloc::<f32>(0).unwrap();
        assert!(ptr.is_null());
        unsafe { exec.free(ptr, 0) };
    }
}

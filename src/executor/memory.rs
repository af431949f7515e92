//! Memory spaces: allocation, deallocation, and copy policy per memory kind
//!
//! Every executor owns exactly one memory space, and storage allocated by a
//! space must be released through the same space. Host spaces hand out
//! 64-byte aligned, zero-initialized storage; the device space is a hook
//! that fails until a real accelerator module is compiled in.

use crate::error::{Error, Result};
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Minimum alignment for host allocations, wide enough for SIMD loads
const HOST_ALIGN: usize = 64;

/// Allocation/deallocation/copy policy for one physical memory kind
pub trait MemorySpace: Send + Sync {
    /// Backend name used in error messages
    fn name(&self) -> &'static str;

    /// Whether host code may dereference pointers into this space
    fn host_accessible(&self) -> bool;

    /// Allocate `size` zero-initialized bytes
    ///
    /// `size` must be non-zero; zero-length buffers are represented by a
    /// null pointer at the [`Array`](crate::array::Array) level and never
    /// reach the space.
    fn alloc_bytes(&self, size: usize, align: usize) -> Result<*mut u8>;

    /// Release storage previously obtained from `alloc_bytes`
    ///
    /// # Safety
    /// `ptr` must come from `alloc_bytes` on this same space with the same
    /// `size` and `align`, and must not be used afterwards.
    unsafe fn dealloc_bytes(&self, ptr: *mut u8, size: usize, align: usize);
}

/// Pageable host memory backed by the system allocator
#[derive(Debug, Default)]
pub struct HostMemorySpace;

impl HostMemorySpace {
    fn layout(size: usize, align: usize) -> Result<Layout> {
        Layout::from_size_align(size, align.max(HOST_ALIGN)).map_err(|e| {
            Error::invalid_argument("size", format!("invalid allocation layout: {e}"))
        })
    }
}

impl MemorySpace for HostMemorySpace {
    fn name(&self) -> &'static str {
        "host"
    }

    fn host_accessible(&self) -> bool {
        true
    }

    fn alloc_bytes(&self, size: usize, align: usize) -> Result<*mut u8> {
        let layout = Self::layout(size, align)?;
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory {
                size,
                backend: self.name(),
            });
        }
        Ok(ptr)
    }

    unsafe fn dealloc_bytes(&self, ptr: *mut u8, size: usize, align: usize) {
        if ptr.is_null() || size == 0 {
            return;
        }
        // Layout was validated at allocation time
        if let Ok(layout) = Self::layout(size, align) {
            dealloc(ptr, layout);
        }
    }
}

/// Accelerator device memory, compiled as a hook in this build
///
/// Allocation always fails with a module-not-compiled error; since no
/// allocation can succeed, the deallocation path is unreachable.
#[derive(Debug, Default)]
pub struct DeviceMemorySpace {
    device_id: usize,
}

impl DeviceMemorySpace {
    /// Create the device space for one accelerator
    pub fn new(device_id: usize) -> Self {
        Self { device_id }
    }

    /// The accelerator this space allocates on
    pub fn device_id(&self) -> usize {
        self.device_id
    }
}

impl MemorySpace for DeviceMemorySpace {
    fn name(&self) -> &'static str {
        "accelerator"
    }

    fn host_accessible(&self) -> bool {
        false
    }

    fn alloc_bytes(&self, _size: usize, _align: usize) -> Result<*mut u8> {
        log::warn!(
            "allocation requested on accelerator {}, but the module is not compiled",
            self.device_id
        );
        Err(Error::ModuleNotCompiled {
            module: "accelerator",
        })
    }

    unsafe fn dealloc_bytes(&self, _ptr: *mut u8, _size: usize, _align: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_space_allocates_zeroed() {
        let space = HostMemorySpace;
        let ptr = space.alloc_bytes(32, 8).unwrap();
        let bytes = unsafe { std::slice::from_raw_parts(ptr, 32) };
        assert!(bytes.iter().all(|&b| b == 0));
        unsafe { space.dealloc_bytes(ptr, 32, 8) };
    }

    #[test]
    fn device_space_is_a_hook() {
        let space = DeviceMemorySpace::new(0);
        assert!(!space.host_accessible());
        let err = space.alloc_bytes(16, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::ModuleNotCompiled {
                module: "accelerator"
            }
        ));
    }
}

//! Executor-tagged owning buffers
//!
//! [`Array`] is a typed, contiguous buffer bound to at most one executor.
//! The executor performs every allocation, deallocation, and transfer, so
//! storage is always released by the memory space that produced it, on
//! every exit path.
//!
//! An array without an executor is a valid detached state: zero elements,
//! null storage. Assignment semantics follow the executor binding rules:
//! a target that already has an executor keeps it (cross-executor data
//! transfer), a target without one adopts the source's.

use crate::error::{Error, Result};
use crate::executor::{same_executor, Executor};
use crate::scalar::Element;
use std::sync::Arc;

/// Typed, contiguous, executor-tagged buffer
pub struct Array<T: Element> {
    exec: Option<Arc<Executor>>,
    ptr: *mut T,
    len: usize,
    /// Views wrap caller-provided storage and never deallocate it
    owned: bool,
}

// Storage is exclusively owned (or a caller-managed view); the executor
// handle is shared read-only.
unsafe impl<T: Element> Send for Array<T> {}
unsafe impl<T: Element> Sync for Array<T> {}

impl<T: Element> Default for Array<T> {
    /// Detached empty array: no executor, no storage
    fn default() -> Self {
        Self {
            exec: None,
            ptr: std::ptr::null_mut(),
            len: 0,
            owned: true,
        }
    }
}

impl<T: Element> Array<T> {
    /// Empty array bound to `exec`
    pub fn new(exec: Arc<Executor>) -> Self {
        Self {
            exec: Some(exec),
            ptr: std::ptr::null_mut(),
            len: 0,
            owned: true,
        }
    }

    /// Zero-initialized array of `len` elements on `exec`
    pub fn with_len(exec: Arc<Executor>, len: usize) -> Result<Self> {
        let mut a = Self::new(exec);
        a.resize_and_reset(len)?;
        Ok(a)
    }

    /// Array on `exec` holding a copy of `data` (staged through host memory)
    pub fn from_slice(exec: Arc<Executor>, data: &[T]) -> Result<Self> {
        let a = Self::with_len(exec, data.len())?;
        if let Some(e) = &a.exec {
            unsafe { e.copy_from_host(a.ptr, data)? };
        }
        Ok(a)
    }

    /// Array on `exec` collecting an iterator (staged through host memory)
    pub fn from_iter(exec: Arc<Executor>, iter: impl IntoIterator<Item = T>) -> Result<Self> {
        let data: Vec<T> = iter.into_iter().collect();
        Self::from_slice(exec, &data)
    }

    /// Non-owning view over caller-provided storage
    ///
    /// The view is never deallocated, resized, or given away; writes
    /// through it land in the caller's storage.
    ///
    /// # Safety
    /// `ptr` must be valid for `len` reads and writes on `exec` for the
    /// view's whole lifetime, and nothing else may access the storage
    /// while the view is alive.
    pub unsafe fn view(exec: Arc<Executor>, len: usize, ptr: *mut T) -> Self {
        Self {
            exec: Some(exec),
            ptr,
            len,
            owned: false,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bound executor, if any
    pub fn executor(&self) -> Option<&Arc<Executor>> {
        self.exec.as_ref()
    }

    /// True if this array wraps caller-provided storage
    pub fn is_view(&self) -> bool {
        !self.owned
    }

    /// Raw storage pointer (null when empty)
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Raw mutable storage pointer (null when empty)
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Read access to the elements; fails on non-host-accessible memory
    pub fn as_slice(&self) -> Result<&[T]> {
        self.check_host_accessible()?;
        if self.ptr.is_null() {
            Ok(&[])
        } else {
            Ok(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
        }
    }

    /// Write access to the elements; fails on non-host-accessible memory
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        self.check_host_accessible()?;
        if self.ptr.is_null() {
            Ok(&mut [])
        } else {
            Ok(unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) })
        }
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) -> Result<()> {
        for x in self.as_mut_slice()? {
            *x = value;
        }
        Ok(())
    }

    /// Discard contents and reallocate for `len` elements
    ///
    /// Always reallocates; prior contents are never preserved. Fails on
    /// views and on detached arrays.
    pub fn resize_and_reset(&mut self, len: usize) -> Result<()> {
        if !self.owned {
            return Err(Error::invalid_argument("len", "views cannot be resized"));
        }
        let Some(exec) = self.exec.clone() else {
            return Err(Error::invalid_argument(
                "len",
                "cannot resize an array without an executor",
            ));
        };
        self.release();
        if len > 0 {
            self.ptr = exec.alloc(len)?;
            self.len = len;
        }
        Ok(())
    }

    /// Release storage and reset to the empty state, keeping the executor
    ///
    /// On a view this only forgets the caller's storage.
    pub fn clear(&mut self) {
        self.release();
    }

    /// Copy-assignment following the executor binding rules
    ///
    /// A target with an executor keeps it and receives a (possibly
    /// cross-executor) data transfer; a target without one adopts the
    /// source's executor. Copying from a detached empty array empties the
    /// target. Views require matching length and are written in place.
    pub fn copy_from(&mut self, src: &Array<T>) -> Result<()> {
        let Some(src_exec) = src.exec.clone() else {
            if !self.owned && self.len != 0 {
                return Err(Error::invalid_argument("src", "views cannot be resized"));
            }
            self.release();
            return Ok(());
        };
        if self.exec.is_none() {
            self.exec = Some(Arc::clone(&src_exec));
        }
        if self.len != src.len {
            // resize_and_reset rejects views
            self.resize_and_reset(src.len)?;
        }
        let dst_exec = self.exec.clone().unwrap_or_else(|| Arc::clone(&src_exec));
        unsafe { dst_exec.copy_from(self.ptr, &src_exec, src.ptr, src.len) }
    }

    /// Move-assignment following the executor binding rules
    ///
    /// Storage is stolen when both sides own it and share one executor, or
    /// when the target is detached (which then adopts the source's
    /// executor). Cross-executor moves and moves involving views degrade
    /// to a copy; moving from a detached empty array empties the target
    /// but keeps its executor.
    pub fn move_from(&mut self, mut src: Array<T>) -> Result<()> {
        let Some(dst_exec) = self.exec.clone() else {
            debug_assert_eq!(self.len, 0);
            *self = std::mem::take(&mut src);
            return Ok(());
        };
        let Some(src_exec) = src.exec.clone() else {
            return self.copy_from(&src);
        };
        if same_executor(&dst_exec, &src_exec) && self.owned && src.owned {
            self.release();
            self.ptr = src.ptr;
            self.len = src.len;
            src.ptr = std::ptr::null_mut();
            src.len = 0;
            Ok(())
        } else {
            self.copy_from(&src)
        }
    }

    /// Deep copy onto `exec` (a cross-executor data transfer when `exec`
    /// differs from the source's)
    pub fn copy_to(&self, exec: &Arc<Executor>) -> Result<Array<T>> {
        let mut copy = Array::new(Arc::clone(exec));
        copy.copy_from(self)?;
        Ok(copy)
    }

    /// Deep copy on the same executor
    pub fn try_clone(&self) -> Result<Array<T>> {
        match &self.exec {
            Some(exec) => self.copy_to(&Arc::clone(exec)),
            None => Ok(Array::default()),
        }
    }

    /// Rebind to `exec`, migrating the data
    ///
    /// A view becomes an owned copy on the new executor; the caller's
    /// storage is left untouched.
    pub fn set_executor(&mut self, exec: Arc<Executor>) -> Result<()> {
        match &self.exec {
            Some(cur) if same_executor(cur, &exec) => Ok(()),
            Some(_) => {
                let moved = self.copy_to(&exec)?;
                self.release();
                *self = moved;
                Ok(())
            }
            None => {
                self.exec = Some(exec);
                Ok(())
            }
        }
    }

    fn check_host_accessible(&self) -> Result<()> {
        if let Some(exec) = &self.exec {
            if !exec.host_accessible() {
                return Err(Error::NotHostAccessible {
                    backend: exec.name(),
                });
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.owned && !self.ptr.is_null() {
            if let Some(exec) = &self.exec {
                unsafe { exec.free(self.ptr, self.len) };
            }
        }
        self.ptr = std::ptr::null_mut();
        self.len = 0;
        self.owned = true;
    }
}

impl<T: Element> Drop for Array<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element> std::fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("executor", &self.exec.as_ref().map(|e| e.name()))
            .field("len", &self.len)
            .field("owned", &self.owned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_array_has_no_executor_and_no_storage() {
        let a = Array::<f64>::default();
        assert!(a.executor().is_none());
        assert_eq!(a.len(), 0);
        assert!(a.as_ptr().is_null());
    }

    #[test]
    fn with_len_is_zero_initialized() {
        let exec = Executor::reference();
        let a = Array::<f64>::with_len(exec, 4).unwrap();
        assert_eq!(a.as_slice().unwrap(), &[0.0; 4]);
    }

    #[test]
    fn resize_discards_contents() {
        let exec = Executor::reference();
        let mut a = Array::from_slice(exec, &[1.0f64, 2.0]).unwrap();
        a.resize_and_reset(3).unwrap();
        assert_eq!(a.as_slice().unwrap(), &[0.0; 3]);
    }

    #[test]
    fn views_reject_resize() {
        let exec = Executor::reference();
        let mut data = [1i32, 2, 3];
        let mut view = unsafe { Array::view(exec, 3, data.as_mut_ptr()) };
        assert!(view.resize_and_reset(4).is_err());
        assert!(view.is_view());
    }
}

//! Backend kernel modules
//!
//! Kernels are free functions grouped by backend; each is adapted into one
//! [`Operation`](crate::operation::Operation) entry point by the
//! registration macro. Both host backends keep the same per-column
//! accumulation order, so their results agree bitwise and the reference
//! backend can serve as the oracle in cross-backend tests.

pub(crate) mod common;
pub mod host_parallel;
pub mod reference;

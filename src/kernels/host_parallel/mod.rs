//! Host-parallel backend kernels
//!
//! One operation fans out across the rayon pool, partitioning work over
//! independent rows or columns only, so no cross-task synchronization is
//! needed and per-column accumulation order matches the reference backend.

pub mod bicgstab;
pub mod csr;
pub mod dense;
pub mod isai;

//! Reference backend kernels: single-threaded, written for clarity

pub mod bicgstab;
pub mod csr;
pub mod dense;
pub mod isai;

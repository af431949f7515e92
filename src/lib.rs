//! # solvr
//!
//! **Executor-portable sparse linear solvers for Rust.**
//!
//! solvr separates what a numerical algorithm computes from where it runs.
//! Algorithms describe their work as operations; an executor dispatches
//! each operation to the backend it represents. The same solver source
//! drives the single-threaded reference backend and the rayon-parallel
//! host backend, and both produce bitwise identical results.
//!
//! ## Building blocks
//!
//! - **Executors**: reference (sequential, ground truth), host-parallel
//!   (rayon pool), plus accelerator and distributed stubs that fail fast
//!   when their modules are not compiled in
//! - **Arrays**: executor-owned typed memory with explicit cross-executor
//!   copy and move semantics
//! - **Matrices**: row-major dense, CSR sparse, identity, all behind one
//!   linear-operator trait
//! - **Solvers**: BiCGStab with per-column convergence masking for
//!   multi-column right-hand sides
//! - **Preconditioners**: incomplete sparse approximate inverses of
//!   triangular factors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solvr::prelude::*;
//! use std::sync::Arc;
//!
//! let exec = Executor::host_parallel();
//! let a = Arc::new(Csr::<f64, i32>::from_parts(
//!     Arc::clone(&exec), Dim::square(2), &[0, 1, 2], &[0, 1], &[2.0, 3.0],
//! )?);
//! let b = Dense::from_slice(Arc::clone(&exec), Dim::new(2, 1), &[4.0, 9.0])?;
//! let mut x = Dense::zeros(Arc::clone(&exec), Dim::new(2, 1))?;
//!
//! let solver = Bicgstab::new(a, BicgstabOptions::default())?;
//! let status = solver.solve_with_status(&b, &mut x)?;
//! assert!(status.all_converged());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod error;
pub mod executor;
mod kernels;
pub mod linop;
pub mod matrix;
pub mod operation;
pub mod preconditioner;
pub mod scalar;
pub mod solver;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array::Array;
    pub use crate::error::{Error, Result};
    pub use crate::executor::Executor;
    pub use crate::linop::{Dim, LinOp};
    pub use crate::matrix::{Csr, Dense, Identity};
    pub use crate::operation::Operation;
    pub use crate::preconditioner::{Isai, IsaiType};
    pub use crate::scalar::{Element, Index, Value};
    pub use crate::solver::{Bicgstab, BicgstabOptions, SolveStatus};
}

//! Iterative solvers
//!
//! Solvers are linear operators themselves: applying a solver to a
//! right-hand side runs the iteration and writes the approximate solution.
//! Composite setups (a solver preconditioned by another operator) fall out
//! of that for free.

mod bicgstab;

pub use bicgstab::{Bicgstab, BicgstabOptions, SolveStatus};

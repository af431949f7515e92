//! Preconditioners
//!
//! A preconditioner is just another [`LinOp`](crate::linop::LinOp) whose
//! apply approximates the inverse of some operator. Solvers take one as a
//! boxed operator and never learn which kind they got.

mod isai;

pub use isai::{Isai, IsaiType};

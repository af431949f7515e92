//! Linear operator interface
//!
//! A [`LinOp`] is anything that maps dense right-hand sides to dense
//! results: a matrix, a preconditioner, or a solver. The solver core never
//! inspects an operator's representation; it only calls `apply`.

use crate::error::{Error, Result};
use crate::executor::{same_executor, Executor};
use crate::matrix::Dense;
use crate::scalar::Value;
use std::sync::Arc;

/// Rows-by-columns size of an operator or matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dim {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl Dim {
    /// A rows-by-cols size
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// An n-by-n size
    pub const fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// Total number of entries
    pub const fn count(&self) -> usize {
        self.rows * self.cols
    }

    /// True for n-by-n sizes
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// As a `[rows, cols]` pair for error reporting
    pub const fn as_array(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }
}

/// An object exposing `apply`: matrix, preconditioner, or solver
pub trait LinOp<V: Value>: Send + Sync {
    /// The executor this operator is bound to
    fn executor(&self) -> &Arc<Executor>;

    /// Operator size (rows-by-cols)
    fn size(&self) -> Dim;

    /// `x = op(b)`
    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()>;

    /// `x = beta * x + alpha * op(b)` with 1x1 `alpha` and `beta`
    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()>;
}

/// Check the conformality of `x = op(b)` for an operator of size `size`
pub(crate) fn validate_apply_dims<V: Value>(
    op: &'static str,
    size: Dim,
    b: &Dense<V>,
    x: &Dense<V>,
) -> Result<()> {
    if b.size().rows != size.cols {
        return Err(Error::dimension_mismatch(
            op,
            [size.cols, b.size().cols],
            b.size().as_array(),
        ));
    }
    if x.size().rows != size.rows || x.size().cols != b.size().cols {
        return Err(Error::dimension_mismatch(
            op,
            [size.rows, b.size().cols],
            x.size().as_array(),
        ));
    }
    Ok(())
}

/// Check that every operand lives on `exec`
pub(crate) fn validate_same_executor(
    op: &'static str,
    exec: &Arc<Executor>,
    others: &[&Arc<Executor>],
) -> Result<()> {
    for other in others {
        if !same_executor(exec, other) {
            return Err(Error::ExecutorMismatch { op });
        }
    }
    Ok(())
}

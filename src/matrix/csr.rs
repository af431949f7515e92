//! Compressed-sparse-row matrices

use crate::array::Array;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::linop::{validate_apply_dims, validate_same_executor, Dim, LinOp};
use crate::matrix::Dense;
use crate::operation::register_operation;
use crate::scalar::{Index, Value};
use std::sync::Arc;

/// Sparse matrix in CSR format
pub struct Csr<V: Value, I: Index> {
    exec: Arc<Executor>,
    size: Dim,
    row_ptrs: Array<I>,
    col_idxs: Array<I>,
    values: Array<V>,
}

register_operation!(
    /// `x = a * b` for a CSR `a` and dense multi-column `b`
    SpmvOperation, csr::spmv, <V: crate::scalar::Value, I: crate::scalar::Index> {
        a: &'a Csr<V, I>,
        b: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

register_operation!(
    /// `x = beta * x + alpha * a * b` with 1x1 scalars
    AdvancedSpmvOperation, csr::advanced_spmv, <V: crate::scalar::Value, I: crate::scalar::Index> {
        alpha: &'a Dense<V>,
        a: &'a Csr<V, I>,
        b: &'a Dense<V>,
        beta: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

impl<V: Value, I: Index> Csr<V, I> {
    /// CSR matrix from raw parts
    ///
    /// `row_ptrs` must hold `rows + 1` non-decreasing offsets, with the
    /// last one equal to the common length of `col_idxs` and `values`.
    pub fn from_parts(
        exec: Arc<Executor>,
        size: Dim,
        row_ptrs: &[I],
        col_idxs: &[I],
        values: &[V],
    ) -> Result<Self> {
        if row_ptrs.len() != size.rows + 1 {
            return Err(Error::invalid_argument(
                "row_ptrs",
                format!("expected {} offsets, got {}", size.rows + 1, row_ptrs.len()),
            ));
        }
        if col_idxs.len() != values.len() {
            return Err(Error::invalid_argument(
                "col_idxs",
                format!(
                    "column index count {} does not match value count {}",
                    col_idxs.len(),
                    values.len()
                ),
            ));
        }
        let nnz = row_ptrs[size.rows].as_usize();
        if nnz != values.len() {
            return Err(Error::invalid_argument(
                "row_ptrs",
                format!("final offset {nnz} does not match value count {}", values.len()),
            ));
        }
        Ok(Self {
            row_ptrs: Array::from_slice(Arc::clone(&exec), row_ptrs)?,
            col_idxs: Array::from_slice(Arc::clone(&exec), col_idxs)?,
            values: Array::from_slice(Arc::clone(&exec), values)?,
            exec,
            size,
        })
    }

    /// Matrix with the sparsity pattern of `other` and zeroed values
    ///
    /// Used by preconditioner generation, which fills the values in place.
    pub fn with_pattern_of(other: &Csr<V, I>) -> Result<Self> {
        Ok(Self {
            exec: Arc::clone(&other.exec),
            size: other.size,
            row_ptrs: other.row_ptrs.try_clone()?,
            col_idxs: other.col_idxs.try_clone()?,
            values: Array::with_len(Arc::clone(&other.exec), other.num_stored_elements())?,
        })
    }

    /// Matrix size
    pub fn size(&self) -> Dim {
        self.size
    }

    /// The bound executor
    pub fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    /// Number of stored elements
    pub fn num_stored_elements(&self) -> usize {
        self.values.len()
    }

    /// Row offsets
    pub fn row_ptrs(&self) -> &Array<I> {
        &self.row_ptrs
    }

    /// Column indices
    pub fn col_idxs(&self) -> &Array<I> {
        &self.col_idxs
    }

    /// Stored values
    pub fn values(&self) -> &Array<V> {
        &self.values
    }

    /// Mutable pattern and values, split for kernel access
    pub(crate) fn parts_mut(&mut self) -> (&mut Array<I>, &mut Array<I>, &mut Array<V>) {
        (&mut self.row_ptrs, &mut self.col_idxs, &mut self.values)
    }
}

impl<V: Value, I: Index> LinOp<V> for Csr<V, I> {
    fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    fn size(&self) -> Dim {
        self.size
    }

    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
        validate_same_executor("csr::spmv", &self.exec, &[b.executor(), x.executor()])?;
        validate_apply_dims("csr::spmv", self.size, b, x)?;
        self.exec.run(SpmvOperation { a: self, b, x })
    }

    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()> {
        validate_same_executor(
            "csr::spmv",
            &self.exec,
            &[alpha.executor(), b.executor(), beta.executor(), x.executor()],
        )?;
        validate_apply_dims("csr::spmv", self.size, b, x)?;
        self.exec.run(AdvancedSpmvOperation {
            alpha,
            a: self,
            b,
            beta,
            x,
        })
    }
}

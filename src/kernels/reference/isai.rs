//! ISAI preconditioner kernels, reference backend
//!
//! The approximate inverse shares the sparsity pattern of the triangular
//! factor. For each row, the factor is gathered into a small dense system
//! over that row's pattern and solved directly; the solution becomes the
//! row of the inverse.

use crate::error::Result;
use crate::executor::ReferenceExecutor;
use crate::kernels::common::{gather_trisystem, solve_lower_trisystem, solve_upper_trisystem};
use crate::matrix::Csr;
use crate::scalar::{Index, Value};

fn generate<V: Value, I: Index>(
    mtx: &Csr<V, I>,
    inverse: &mut Csr<V, I>,
    solve: fn(usize, &[V]) -> Vec<V>,
) -> Result<()> {
    let rows = mtx.size().rows;
    let (i_row_ptrs, i_col_idxs, i_values) = inverse.parts_mut();
    i_row_ptrs.copy_from(mtx.row_ptrs())?;
    i_col_idxs.copy_from(mtx.col_idxs())?;

    let m_row_ptrs = mtx.row_ptrs().as_slice()?;
    let m_col_idxs = mtx.col_idxs().as_slice()?;
    let m_values = mtx.values().as_slice()?;
    let pattern_ptrs = i_row_ptrs.as_slice()?;
    let pattern_cols = i_col_idxs.as_slice()?;
    let out = i_values.as_mut_slice()?;

    for row in 0..rows {
        let begin = pattern_ptrs[row].as_usize();
        let end = pattern_ptrs[row + 1].as_usize();
        let pattern = &pattern_cols[begin..end];
        let tri = gather_trisystem(pattern, m_row_ptrs, m_col_idxs, m_values);
        let rhs = solve(pattern.len(), &tri);
        out[begin..end].copy_from_slice(&rhs);
    }
    Ok(())
}

/// Approximate inverse of a lower triangular factor
pub fn generate_l<V: Value, I: Index>(
    _exec: &ReferenceExecutor,
    mtx: &Csr<V, I>,
    inverse: &mut Csr<V, I>,
) -> Result<()> {
    generate(mtx, inverse, solve_lower_trisystem)
}

/// Approximate inverse of an upper triangular factor
pub fn generate_u<V: Value, I: Index>(
    _exec: &ReferenceExecutor,
    mtx: &Csr<V, I>,
    inverse: &mut Csr<V, I>,
) -> Result<()> {
    generate(mtx, inverse, solve_upper_trisystem)
}

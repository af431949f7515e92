//! ISAI preconditioner kernels, host-parallel backend
//!
//! Each row's small triangular system is independent of every other
//! row's, so rows are solved in parallel over disjoint output slices.

use crate::error::Result;
use crate::executor::HostParallelExecutor;
use crate::kernels::common::{gather_trisystem, solve_lower_trisystem, solve_upper_trisystem};
use crate::matrix::Csr;
use crate::scalar::{Index, Value};
use rayon::prelude::*;

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

    // Split the output value array into one mutable slice per row.
    let mut row_slices = Vec::with_capacity(rows);
    let mut rest = out;
    for row in 0..rows {
        let width = pattern_ptrs[row + 1].as_usize() - pattern_ptrs[row].as_usize();
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(width);
        row_slices.push((row, head));
        rest = tail;
    }

    row_slices.into_par_iter().for_each(|(row, out_row)| {
        let begin = pattern_ptrs[row].as_usize();
        let end = pattern_ptrs[row + 1].as_usize();
        let pattern = &pattern_cols[begin..end];
        let tri = gather_trisystem(pattern, m_row_ptrs, m_col_idxs, m_values);
        let rhs = solve(pattern.len(), &tri);
        out_row.copy_from_slice(&rhs);
    });
    Ok(())
}

pub fn generate_l<V: Value, I: Index>(
    _exec: &HostParallelExecutor,
    mtx: &Csr<V, I>,
    inverse: &mut Csr<V, I>,
) -> Result<()> {
    generate(mtx, inverse, solve_lower_trisystem)
}

pub fn generate_u<V: Value, I: Index>(
    _exec: &HostParallelExecutor,
    mtx: &Csr<V, I>,
    inverse: &mut Csr<V, I>,
) -> Result<()> {
    generate(mtx, inverse, solve_upper_trisystem)
}

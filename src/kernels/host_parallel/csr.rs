//! CSR sparse matrix kernels, host-parallel backend

use crate::error::Result;
use crate::executor::HostParallelExecutor;
use crate::matrix::{Csr, Dense};
use crate::scalar::{Index, Value};
use rayon::prelude::*;

pub fn spmv<V: Value, I: Index>(
    _exec: &HostParallelExecutor,
    a: &Csr<V, I>,
    b: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let c = b.size().cols;
    let row_ptrs = a.row_ptrs().as_slice()?;
    let col_idxs = a.col_idxs().as_slice()?;
    let values = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c).enumerate().for_each(|(row, x_row)| {
        let begin = row_ptrs[row].as_usize();
        let end = row_ptrs[row + 1].as_usize();
        for (j, out) in x_row.iter_mut().enumerate() {
            let mut acc = V::zero();
            for k in begin..end {
                acc += values[k] * bv[col_idxs[k].as_usize() * c + j];
            }
            *out = acc;
        }
    });
    Ok(())
}

pub fn advanced_spmv<V: Value, I: Index>(
    _exec: &HostParallelExecutor,
    alpha: &Dense<V>,
    a: &Csr<V, I>,
    b: &Dense<V>,
    beta: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let c = b.size().cols;
    let row_ptrs = a.row_ptrs().as_slice()?;
    let col_idxs = a.col_idxs().as_slice()?;
    let values = a.values().as_slice()?;
    let al = alpha.values().as_slice()?[0];
    let be = beta.values().as_slice()?[0];
    let bv = b.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c).enumerate().for_each(|(row, x_row)| {
        let begin = row_ptrs[row].as_usize();
        let end = row_ptrs[row + 1].as_usize();
        for (j, out) in x_row.iter_mut().enumerate() {
            let mut acc = V::zero();
            for k in begin..end {
                acc += values[k] * bv[col_idxs[k].as_usize() * c + j];
            }
            *out = be * *out + al * acc;
        }
    });
    Ok(())
}

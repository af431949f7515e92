//! Dense matrix kernels, host-parallel backend

use crate::error::Result;
use crate::executor::HostParallelExecutor;
use crate::matrix::Dense;
use crate::scalar::Value;
use rayon::prelude::*;

pub fn simple_apply<V: Value>(
    _exec: &HostParallelExecutor,
    a: &Dense<V>,
    b: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let m = a.size().cols;
    let c = b.size().cols;
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c).enumerate().for_each(|(i, x_row)| {
        for (j, out) in x_row.iter_mut().enumerate() {
            let mut acc = V::zero();
            for k in 0..m {
                acc += av[i * m + k] * bv[k * c + j];
            }
            *out = acc;
        }
    });
    Ok(())
}

pub fn advanced_apply<V: Value>(
    _exec: &HostParallelExecutor,
    alpha: &Dense<V>,
    a: &Dense<V>,
    b: &Dense<V>,
    beta: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let m = a.size().cols;
    let c = b.size().cols;
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let al = alpha.values().as_slice()?[0];
    let be = beta.values().as_slice()?[0];
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c).enumerate().for_each(|(i, x_row)| {
        for (j, out) in x_row.iter_mut().enumerate() {
            let mut acc = V::zero();
            for k in 0..m {
                acc += av[i * m + k] * bv[k * c + j];
            }
            *out = be * *out + al * acc;
        }
    });
    Ok(())
}

pub fn compute_dot<V: Value>(
    _exec: &HostParallelExecutor,
    a: &Dense<V>,
    b: &Dense<V>,
    result: &mut Dense<V>,
) -> Result<()> {
    let (n, c) = (a.size().rows, a.size().cols);
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let rv = result.values_mut().as_mut_slice()?;
    // One task per column keeps the row-order summation of the reference
    // kernel, so both backends agree bitwise.
    rv.par_iter_mut().enumerate().for_each(|(j, out)| {
        let mut acc = V::zero();
        for i in 0..n {
            acc += av[i * c + j] * bv[i * c + j];
        }
        *out = acc;
    });
    Ok(())
}

pub fn scale<V: Value>(
    _exec: &HostParallelExecutor,
    alpha: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let c = x.size().cols;
    let av = alpha.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c).for_each(|x_row| {
        for (j, value) in x_row.iter_mut().enumerate() {
            let a = if av.len() == 1 { av[0] } else { av[j] };
            *value *= a;
        }
    });
    Ok(())
}

pub fn add_scaled<V: Value>(
    _exec: &HostParallelExecutor,
    alpha: &Dense<V>,
    y: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let c = x.size().cols;
    let av = alpha.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c)
        .zip(yv.par_chunks(c))
        .for_each(|(x_row, y_row)| {
            for (j, value) in x_row.iter_mut().enumerate() {
                let a = if av.len() == 1 { av[0] } else { av[j] };
                *value += a * y_row[j];
            }
        });
    Ok(())
}

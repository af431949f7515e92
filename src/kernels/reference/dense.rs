//! Dense matrix kernels, reference backend

use crate::error::Result;
use crate::executor::ReferenceExecutor;
use crate::matrix::Dense;
use crate::scalar::Value;

pub fn simple_apply<V: Value>(
    _exec: &ReferenceExecutor,
    a: &Dense<V>,
    b: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let (n, m) = (a.size().rows, a.size().cols);
    let c = b.size().cols;
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    for i in 0..n {
        for j in 0..c {
            let mut acc = V::zero();
            for k in 0..m {
                acc += av[i * m + k] * bv[k * c + j];
            }
            xv[i * c + j] = acc;
        }
    }
    Ok(())
}

pub fn advanced_apply<V: Value>(
    _exec: &ReferenceExecutor,
    alpha: &Dense<V>,
    a: &Dense<V>,
    b: &Dense<V>,
    beta: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let (n, m) = (a.size().rows, a.size().cols);
    let c = b.size().cols;
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let al = alpha.values().as_slice()?[0];
    let be = beta.values().as_slice()?[0];
    let xv = x.values_mut().as_mut_slice()?;
    for i in 0..n {
        for j in 0..c {
            let mut acc = V::zero();
            for k in 0..m {
                acc += av[i * m + k] * bv[k * c + j];
            }
            xv[i * c + j] = be * xv[i * c + j] + al * acc;
        }
    }
    Ok(())
}

pub fn compute_dot<V: Value>(
    _exec: &ReferenceExecutor,
    a: &Dense<V>,
    b: &Dense<V>,
    result: &mut Dense<V>,
) -> Result<()> {
    let (n, c) = (a.size().rows, a.size().cols);
    let av = a.values().as_slice()?;
    let bv = b.values().as_slice()?;
    let rv = result.values_mut().as_mut_slice()?;
    for j in 0..c {
        let mut acc = V::zero();
        for i in 0..n {
            acc += av[i * c + j] * bv[i * c + j];
        }
        rv[j] = acc;
    }
    Ok(())
}

pub fn scale<V: Value>(_exec: &ReferenceExecutor, alpha: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
    let c = x.size().cols;
    let av = alpha.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    for (idx, value) in xv.iter_mut().enumerate() {
        let a = if av.len() == 1 { av[0] } else { av[idx % c] };
        *value *= a;
    }
    Ok(())
}

pub fn add_scaled<V: Value>(
    _exec: &ReferenceExecutor,
    alpha: &Dense<V>,
    y: &Dense<V>,
    x: &mut Dense<V>,
) -> Result<()> {
    let c = x.size().cols;
    let av = alpha.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    for (idx, value) in xv.iter_mut().enumerate() {
        let a = if av.len() == 1 { av[0] } else { av[idx % c] };
        *value += a * yv[idx];
    }
    Ok(())
}

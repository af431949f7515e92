//! BiCGStab solver kernels, host-parallel backend
//!
//! Per-column scalar work (breakdown-guarded divisions, convergence
//! decisions) stays serial; only the elementwise row updates fan out
//! across the pool. Row updates touch disjoint chunks and keep the same
//! per-element arithmetic as the reference kernels, so both backends
//! produce identical bits.

use crate::array::Array;
use crate::error::Result;
use crate::executor::HostParallelExecutor;
use crate::kernels::common::guarded_div;
use crate::matrix::Dense;
use crate::scalar::Value;
use rayon::prelude::*;

#[allow(clippy::too_many_arguments)]
pub fn initialize<V: Value>(
    _exec: &HostParallelExecutor,
    b: &Dense<V>,
    r: &mut Dense<V>,
    rr: &mut Dense<V>,
    y: &mut Dense<V>,
    s: &mut Dense<V>,
    t: &mut Dense<V>,
    z: &mut Dense<V>,
    v: &mut Dense<V>,
    p: &mut Dense<V>,
    prev_rho: &mut Dense<V>,
    rho: &mut Dense<V>,
    alpha: &mut Dense<V>,
    beta: &mut Dense<V>,
    gamma: &mut Dense<V>,
    omega: &mut Dense<V>,
    converged: &mut Array<bool>,
) -> Result<()> {
    r.values_mut().as_mut_slice()?.copy_from_slice(b.values().as_slice()?);
    for vec in [rr, y, s, t, z, v, p] {
        vec.values_mut().fill(V::zero())?;
    }
    for scalar in [prev_rho, rho, alpha, beta, gamma, omega] {
        scalar.values_mut().fill(V::one())?;
    }
    converged.fill(false)?;
    Ok(())
}

pub fn test_convergence<V: Value>(
    _exec: &HostParallelExecutor,
    tau: &Dense<V>,
    starting_tau: &Dense<V>,
    rel_residual_goal: V,
    converged: &mut Array<bool>,
    all_converged: &mut bool,
) -> Result<()> {
    let t = tau.values().as_slice()?;
    let t0 = starting_tau.values().as_slice()?;
    let flags = converged.as_mut_slice()?;
    let mut all = true;
    for (j, flag) in flags.iter_mut().enumerate() {
        if *flag {
            continue;
        }
        if t[j].sqrt() <= rel_residual_goal * t0[j].sqrt() {
            *flag = true;
        } else {
            all = false;
        }
    }
    *all_converged = all;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn step_1<V: Value>(
    _exec: &HostParallelExecutor,
    r: &Dense<V>,
    p: &mut Dense<V>,
    v: &Dense<V>,
    rho: &Dense<V>,
    prev_rho: &Dense<V>,
    alpha: &Dense<V>,
    omega: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let c = r.size().cols;
    let rv = r.values().as_slice()?;
    let vv = v.values().as_slice()?;
    let rho_v = rho.values().as_slice()?;
    let prev_rho_v = prev_rho.values().as_slice()?;
    let alpha_v = alpha.values().as_slice()?;
    let omega_v = omega.values().as_slice()?;
    let flags = converged.as_slice()?;
    let tmp: Vec<V> = (0..c)
        .map(|j| guarded_div(rho_v[j], prev_rho_v[j]) * guarded_div(alpha_v[j], omega_v[j]))
        .collect();
    let pv = p.values_mut().as_mut_slice()?;
    pv.par_chunks_mut(c)
        .zip(rv.par_chunks(c).zip(vv.par_chunks(c)))
        .for_each(|(p_row, (r_row, v_row))| {
            for j in 0..c {
                if flags[j] {
                    continue;
                }
                p_row[j] = r_row[j] + tmp[j] * (p_row[j] - omega_v[j] * v_row[j]);
            }
        });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn step_2<V: Value>(
    _exec: &HostParallelExecutor,
    r: &Dense<V>,
    s: &mut Dense<V>,
    v: &Dense<V>,
    rho: &Dense<V>,
    alpha: &mut Dense<V>,
    beta: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let c = r.size().cols;
    let rv = r.values().as_slice()?;
    let vv = v.values().as_slice()?;
    let rho_v = rho.values().as_slice()?;
    let beta_v = beta.values().as_slice()?;
    let flags = converged.as_slice()?;
    let alpha_v = alpha.values_mut().as_mut_slice()?;
    for j in 0..c {
        if !flags[j] {
            alpha_v[j] = guarded_div(rho_v[j], beta_v[j]);
        }
    }
    let alpha_v = &*alpha_v;
    let sv = s.values_mut().as_mut_slice()?;
    sv.par_chunks_mut(c)
        .zip(rv.par_chunks(c).zip(vv.par_chunks(c)))
        .for_each(|(s_row, (r_row, v_row))| {
            for j in 0..c {
                if flags[j] {
                    continue;
                }
                s_row[j] = r_row[j] - alpha_v[j] * v_row[j];
            }
        });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn test_convergence_2<V: Value>(
    _exec: &HostParallelExecutor,
    s: &Dense<V>,
    starting_tau: &Dense<V>,
    rel_residual_goal: V,
    alpha: &Dense<V>,
    y: &Dense<V>,
    x: &mut Dense<V>,
    converged: &mut Array<bool>,
    all_converged: &mut bool,
) -> Result<()> {
    let (n, c) = (s.size().rows, s.size().cols);
    let sv = s.values().as_slice()?;
    let t0 = starting_tau.values().as_slice()?;
    let alpha_v = alpha.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let flags = converged.as_mut_slice()?;
    // The squared half-step norms are independent per column.
    let tau_s: Vec<V> = (0..c)
        .into_par_iter()
        .map(|j| {
            let mut acc = V::zero();
            for i in 0..n {
                let e = sv[i * c + j];
                acc += e * e;
            }
            acc
        })
        .collect();
    let mut fresh = vec![false; c];
    let mut all = true;
    for (j, flag) in flags.iter_mut().enumerate() {
        if *flag {
            continue;
        }
        if tau_s[j].sqrt() <= rel_residual_goal * t0[j].sqrt() {
            *flag = true;
            fresh[j] = true;
        } else {
            all = false;
        }
    }
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c)
        .zip(yv.par_chunks(c))
        .for_each(|(x_row, y_row)| {
            for j in 0..c {
                if fresh[j] {
                    x_row[j] += alpha_v[j] * y_row[j];
                }
            }
        });
    *all_converged = all;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn step_3<V: Value>(
    _exec: &HostParallelExecutor,
    x: &mut Dense<V>,
    r: &mut Dense<V>,
    s: &Dense<V>,
    t: &Dense<V>,
    y: &Dense<V>,
    z: &Dense<V>,
    alpha: &Dense<V>,
    beta: &Dense<V>,
    gamma: &Dense<V>,
    omega: &mut Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let c = s.size().cols;
    let sv = s.values().as_slice()?;
    let tv = t.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let zv = z.values().as_slice()?;
    let alpha_v = alpha.values().as_slice()?;
    let beta_v = beta.values().as_slice()?;
    let gamma_v = gamma.values().as_slice()?;
    let flags = converged.as_slice()?;
    let omega_v = omega.values_mut().as_mut_slice()?;
    for j in 0..c {
        if !flags[j] {
            omega_v[j] = guarded_div(gamma_v[j], beta_v[j]);
        }
    }
    let omega_v = &*omega_v;
    let xv = x.values_mut().as_mut_slice()?;
    let rv = r.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c)
        .zip(rv.par_chunks_mut(c))
        .zip(sv.par_chunks(c).zip(tv.par_chunks(c)))
        .zip(yv.par_chunks(c).zip(zv.par_chunks(c)))
        .for_each(|(((x_row, r_row), (s_row, t_row)), (y_row, z_row))| {
            for j in 0..c {
                if flags[j] {
                    continue;
                }
                x_row[j] += alpha_v[j] * y_row[j] + omega_v[j] * z_row[j];
                r_row[j] = s_row[j] - omega_v[j] * t_row[j];
            }
        });
    Ok(())
}

pub fn finalize<V: Value>(
    _exec: &HostParallelExecutor,
    x: &mut Dense<V>,
    alpha: &Dense<V>,
    y: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let c = x.size().cols;
    let alpha_v = alpha.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let flags = converged.as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    xv.par_chunks_mut(c)
        .zip(yv.par_chunks(c))
        .for_each(|(x_row, y_row)| {
            for j in 0..c {
                if flags[j] {
                    continue;
                }
                x_row[j] += alpha_v[j] * y_row[j];
            }
        });
    Ok(())
}

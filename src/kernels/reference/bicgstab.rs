//! BiCGStab solver kernels, reference backend
//!
//! Every per-column update is masked by the column's convergence flag:
//! once a column converges, later steps leave its entries untouched, which
//! is what allows right-hand sides with heterogeneous convergence speed to
//! share one solve.

use crate::array::Array;
use crate::error::Result;
use crate::executor::ReferenceExecutor;
use crate::kernels::common::guarded_div;
use crate::matrix::Dense;
use crate::scalar::Value;

/// Seed the solver state: `r = b`, all work vectors zero, all per-column
/// scalars one, no column converged
#[allow(clippy::too_many_arguments)]
pub fn initialize<V: Value>(
    _exec: &ReferenceExecutor,
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

/// Per-column relative residual test against the starting residual norm
///
/// `tau` and `starting_tau` hold squared norms; the comparison is
/// non-strict so a column whose initial residual is exactly zero converges
/// before any update touches it.
pub fn test_convergence<V: Value>(
    _exec: &ReferenceExecutor,
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

/// Direction update: `p = r + (rho/prev_rho)(alpha/omega) * (p - omega*v)`
#[allow(clippy::too_many_arguments)]
pub fn step_1<V: Value>(
    _exec: &ReferenceExecutor,
    r: &Dense<V>,
    p: &mut Dense<V>,
    v: &Dense<V>,
    rho: &Dense<V>,
    prev_rho: &Dense<V>,
    alpha: &Dense<V>,
    omega: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let (n, c) = (r.size().rows, r.size().cols);
    let rv = r.values().as_slice()?;
    let vv = v.values().as_slice()?;
    let rho_v = rho.values().as_slice()?;
    let prev_rho_v = prev_rho.values().as_slice()?;
    let alpha_v = alpha.values().as_slice()?;
    let omega_v = omega.values().as_slice()?;
    let flags = converged.as_slice()?;
    let pv = p.values_mut().as_mut_slice()?;
    for j in 0..c {
        if flags[j] {
            continue;
        }
        let tmp = guarded_div(rho_v[j], prev_rho_v[j]) * guarded_div(alpha_v[j], omega_v[j]);
        for i in 0..n {
            let idx = i * c + j;
            pv[idx] = rv[idx] + tmp * (pv[idx] - omega_v[j] * vv[idx]);
        }
    }
    Ok(())
}

/// Half-step: `alpha = rho / beta`, `s = r - alpha*v`
#[allow(clippy::too_many_arguments)]
pub fn step_2<V: Value>(
    _exec: &ReferenceExecutor,
    r: &Dense<V>,
    s: &mut Dense<V>,
    v: &Dense<V>,
    rho: &Dense<V>,
    alpha: &mut Dense<V>,
    beta: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let (n, c) = (r.size().rows, r.size().cols);
    let rv = r.values().as_slice()?;
    let vv = v.values().as_slice()?;
    let rho_v = rho.values().as_slice()?;
    let beta_v = beta.values().as_slice()?;
    let flags = converged.as_slice()?;
    let alpha_v = alpha.values_mut().as_mut_slice()?;
    let sv = s.values_mut().as_mut_slice()?;
    for j in 0..c {
        if flags[j] {
            continue;
        }
        alpha_v[j] = guarded_div(rho_v[j], beta_v[j]);
        for i in 0..n {
            let idx = i * c + j;
            sv[idx] = rv[idx] - alpha_v[j] * vv[idx];
        }
    }
    Ok(())
}

/// Mid-iteration convergence test on the half-step residual `s`
///
/// Columns whose half-step residual already meets the goal commit the
/// pending `x += alpha*y` update and freeze, skipping the second
/// matrix-vector product entirely.
#[allow(clippy::too_many_arguments)]
pub fn test_convergence_2<V: Value>(
    _exec: &ReferenceExecutor,
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
    let xv = x.values_mut().as_mut_slice()?;
    let mut all = true;
    for (j, flag) in flags.iter_mut().enumerate() {
        if *flag {
            continue;
        }
        let mut tau_s = V::zero();
        for i in 0..n {
            let e = sv[i * c + j];
            tau_s += e * e;
        }
        if tau_s.sqrt() <= rel_residual_goal * t0[j].sqrt() {
            for i in 0..n {
                let idx = i * c + j;
                xv[idx] += alpha_v[j] * yv[idx];
            }
            *flag = true;
        } else {
            all = false;
        }
    }
    *all_converged = all;
    Ok(())
}

/// Full step: `omega = gamma/beta`, `x += alpha*y + omega*z`,
/// `r = s - omega*t`
#[allow(clippy::too_many_arguments)]
pub fn step_3<V: Value>(
    _exec: &ReferenceExecutor,
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
    let (n, c) = (s.size().rows, s.size().cols);
    let sv = s.values().as_slice()?;
    let tv = t.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let zv = z.values().as_slice()?;
    let alpha_v = alpha.values().as_slice()?;
    let beta_v = beta.values().as_slice()?;
    let gamma_v = gamma.values().as_slice()?;
    let flags = converged.as_slice()?;
    let omega_v = omega.values_mut().as_mut_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    let rv = r.values_mut().as_mut_slice()?;
    for j in 0..c {
        if flags[j] {
            continue;
        }
        omega_v[j] = guarded_div(gamma_v[j], beta_v[j]);
        for i in 0..n {
            let idx = i * c + j;
            xv[idx] += alpha_v[j] * yv[idx] + omega_v[j] * zv[idx];
            rv[idx] = sv[idx] - omega_v[j] * tv[idx];
        }
    }
    Ok(())
}

/// Commit the pending half-step update when the iteration cap lands
/// mid-iteration: `x += alpha*y` for the still-unconverged columns
pub fn finalize<V: Value>(
    _exec: &ReferenceExecutor,
    x: &mut Dense<V>,
    alpha: &Dense<V>,
    y: &Dense<V>,
    converged: &Array<bool>,
) -> Result<()> {
    let (n, c) = (x.size().rows, x.size().cols);
    let alpha_v = alpha.values().as_slice()?;
    let yv = y.values().as_slice()?;
    let flags = converged.as_slice()?;
    let xv = x.values_mut().as_mut_slice()?;
    for j in 0..c {
        if flags[j] {
            continue;
        }
        for i in 0..n {
            let idx = i * c + j;
            xv[idx] += alpha_v[j] * yv[idx];
        }
    }
    Ok(())
}

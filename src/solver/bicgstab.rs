//! Biconjugate gradient stabilized solver
//!
//! Solves `A * x = b` for general square `A`, with one shared iteration
//! driving every column of a multi-column right-hand side. Per-column
//! scalars live in 1-by-nrhs dense rows, and a boolean flag per column
//! masks every update once that column has met its relative residual goal,
//! so a converged column's entries never change again.

use crate::array::Array;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::linop::{validate_apply_dims, validate_same_executor, Dim, LinOp};
use crate::matrix::{Dense, Identity};
use crate::operation::register_operation;
use crate::scalar::Value;
use std::sync::Arc;

register_operation!(
    InitializeOperation, bicgstab::initialize, <V: crate::scalar::Value> {
        b: &'a Dense<V>,
        r: &'a mut Dense<V>,
        rr: &'a mut Dense<V>,
        y: &'a mut Dense<V>,
        s: &'a mut Dense<V>,
        t: &'a mut Dense<V>,
        z: &'a mut Dense<V>,
        v: &'a mut Dense<V>,
        p: &'a mut Dense<V>,
        prev_rho: &'a mut Dense<V>,
        rho: &'a mut Dense<V>,
        alpha: &'a mut Dense<V>,
        beta: &'a mut Dense<V>,
        gamma: &'a mut Dense<V>,
        omega: &'a mut Dense<V>,
        converged: &'a mut Array<bool>,
    }
);

register_operation!(
    TestConvergenceOperation, bicgstab::test_convergence, <V: crate::scalar::Value> {
        tau: &'a Dense<V>,
        starting_tau: &'a Dense<V>,
        rel_residual_goal: V,
        converged: &'a mut Array<bool>,
        all_converged: &'a mut bool,
    }
);

register_operation!(
    Step1Operation, bicgstab::step_1, <V: crate::scalar::Value> {
        r: &'a Dense<V>,
        p: &'a mut Dense<V>,
        v: &'a Dense<V>,
        rho: &'a Dense<V>,
        prev_rho: &'a Dense<V>,
        alpha: &'a Dense<V>,
        omega: &'a Dense<V>,
        converged: &'a Array<bool>,
    }
);

register_operation!(
    Step2Operation, bicgstab::step_2, <V: crate::scalar::Value> {
        r: &'a Dense<V>,
        s: &'a mut Dense<V>,
        v: &'a Dense<V>,
        rho: &'a Dense<V>,
        alpha: &'a mut Dense<V>,
        beta: &'a Dense<V>,
        converged: &'a Array<bool>,
    }
);

register_operation!(
    TestConvergence2Operation, bicgstab::test_convergence_2, <V: crate::scalar::Value> {
        s: &'a Dense<V>,
        starting_tau: &'a Dense<V>,
        rel_residual_goal: V,
        alpha: &'a Dense<V>,
        y: &'a Dense<V>,
        x: &'a mut Dense<V>,
        converged: &'a mut Array<bool>,
        all_converged: &'a mut bool,
    }
);

register_operation!(
    Step3Operation, bicgstab::step_3, <V: crate::scalar::Value> {
        x: &'a mut Dense<V>,
        r: &'a mut Dense<V>,
        s: &'a Dense<V>,
        t: &'a Dense<V>,
        y: &'a Dense<V>,
        z: &'a Dense<V>,
        alpha: &'a Dense<V>,
        beta: &'a Dense<V>,
        gamma: &'a Dense<V>,
        omega: &'a mut Dense<V>,
        converged: &'a Array<bool>,
    }
);

register_operation!(
    FinalizeOperation, bicgstab::finalize, <V: crate::scalar::Value> {
        x: &'a mut Dense<V>,
        alpha: &'a Dense<V>,
        y: &'a Dense<V>,
        converged: &'a Array<bool>,
    }
);

/// Iteration cap and convergence goal
#[derive(Clone, Copy, Debug)]
pub struct BicgstabOptions {
    /// Upper bound on full iterations; never exceeded
    pub max_iters: usize,
    /// Per-column goal relative to the starting residual norm
    pub rel_residual_goal: f64,
}

impl Default for BicgstabOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            rel_residual_goal: 1e-6,
        }
    }
}

/// Outcome of one solve
#[derive(Clone, Debug)]
pub struct SolveStatus {
    /// Iterations performed before returning; a mid-iteration exit counts
    /// the half iteration as a full one
    pub iterations: usize,
    /// Per-column convergence flags at exit
    pub converged: Vec<bool>,
}

impl SolveStatus {
    /// True when every column met its residual goal
    pub fn all_converged(&self) -> bool {
        self.converged.iter().all(|&c| c)
    }
}

/// BiCGStab solver bound to one system matrix and one preconditioner
pub struct Bicgstab<V: Value> {
    exec: Arc<Executor>,
    system_matrix: Arc<dyn LinOp<V>>,
    preconditioner: Arc<dyn LinOp<V>>,
    options: BicgstabOptions,
}

impl<V: Value> std::fmt::Debug for Bicgstab<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bicgstab")
            .field("executor", &self.exec.name())
            .field("options", &self.options)
            .finish()
    }
}

impl<V: Value> Bicgstab<V> {
    /// Solver for `system_matrix` with the identity preconditioner
    pub fn new(system_matrix: Arc<dyn LinOp<V>>, options: BicgstabOptions) -> Result<Self> {
        let n = system_matrix.size().rows;
        let exec = Arc::clone(system_matrix.executor());
        let preconditioner: Arc<dyn LinOp<V>> = Arc::new(Identity::new(Arc::clone(&exec), n));
        Self::with_preconditioner(system_matrix, preconditioner, options)
    }

    /// Solver with an explicit preconditioner
    pub fn with_preconditioner(
        system_matrix: Arc<dyn LinOp<V>>,
        preconditioner: Arc<dyn LinOp<V>>,
        options: BicgstabOptions,
    ) -> Result<Self> {
        if !system_matrix.size().is_square() {
            return Err(Error::dimension_mismatch(
                "bicgstab",
                [system_matrix.size().rows, system_matrix.size().rows],
                system_matrix.size().as_array(),
            ));
        }
        if preconditioner.size() != system_matrix.size() {
            return Err(Error::dimension_mismatch(
                "bicgstab",
                system_matrix.size().as_array(),
                preconditioner.size().as_array(),
            ));
        }
        let exec = Arc::clone(system_matrix.executor());
        validate_same_executor("bicgstab", &exec, &[preconditioner.executor()])?;
        Ok(Self {
            exec,
            system_matrix,
            preconditioner,
            options,
        })
    }

    /// The solver's options
    pub fn options(&self) -> BicgstabOptions {
        self.options
    }

    /// Run the iteration on `b`, refining the initial guess in `x`
    ///
    /// Non-convergence within the iteration cap is not an error; the status
    /// reports which columns converged and how many iterations ran.
    pub fn solve_with_status(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<SolveStatus> {
        validate_same_executor("bicgstab", &self.exec, &[b.executor(), x.executor()])?;
        validate_apply_dims("bicgstab", self.system_matrix.size(), b, x)?;
        let goal = V::from(self.options.rel_residual_goal).ok_or_else(|| {
            Error::invalid_argument(
                "rel_residual_goal",
                format!(
                    "{} is not representable as {}",
                    self.options.rel_residual_goal,
                    V::NAME
                ),
            )
        })?;

        let exec = &self.exec;
        let nrhs = b.size().cols;
        let one = Dense::scalar(Arc::clone(exec), V::one())?;
        let neg_one = Dense::scalar(Arc::clone(exec), -V::one())?;

        let mut r = Dense::with_config_of(b)?;
        let mut rr = Dense::with_config_of(b)?;
        let mut y = Dense::with_config_of(b)?;
        let mut s = Dense::with_config_of(b)?;
        let mut t = Dense::with_config_of(b)?;
        let mut z = Dense::with_config_of(b)?;
        let mut v = Dense::with_config_of(b)?;
        let mut p = Dense::with_config_of(b)?;

        let scalar_dim = Dim::new(1, nrhs);
        let mut alpha = Dense::zeros(Arc::clone(exec), scalar_dim)?;
        let mut beta = Dense::with_config_of(&alpha)?;
        let mut gamma = Dense::with_config_of(&alpha)?;
        let mut prev_rho = Dense::with_config_of(&alpha)?;
        let mut rho = Dense::with_config_of(&alpha)?;
        let mut omega = Dense::with_config_of(&alpha)?;
        let mut tau = Dense::with_config_of(&alpha)?;
        let mut starting_tau = Dense::with_config_of(&alpha)?;

        let mut converged = Array::with_len(Arc::clone(exec), nrhs)?;

        exec.run(InitializeOperation {
            b,
            r: &mut r,
            rr: &mut rr,
            y: &mut y,
            s: &mut s,
            t: &mut t,
            z: &mut z,
            v: &mut v,
            p: &mut p,
            prev_rho: &mut prev_rho,
            rho: &mut rho,
            alpha: &mut alpha,
            beta: &mut beta,
            gamma: &mut gamma,
            omega: &mut omega,
            converged: &mut converged,
        })?;

        // r = b - A*x, and its norm becomes the convergence baseline.
        self.system_matrix.apply_scaled(&neg_one, x, &one, &mut r)?;
        rr.copy_from(&r)?;
        r.compute_dot(&r, &mut tau)?;
        starting_tau.copy_from(&tau)?;
        self.system_matrix.apply(&r, &mut v)?;

        log::debug!(
            "bicgstab: starting solve, n = {}, nrhs = {}, max_iters = {}, goal = {:e}",
            self.system_matrix.size().rows,
            nrhs,
            self.options.max_iters,
            self.options.rel_residual_goal
        );

        let mut iterations = 0;
        for iter in 0..self.options.max_iters {
            r.compute_dot(&r, &mut tau)?;
            let mut all_converged = false;
            exec.run(TestConvergenceOperation {
                tau: &tau,
                starting_tau: &starting_tau,
                rel_residual_goal: goal,
                converged: &mut converged,
                all_converged: &mut all_converged,
            })?;
            if all_converged {
                break;
            }

            rr.compute_dot(&r, &mut rho)?;
            exec.run(Step1Operation {
                r: &r,
                p: &mut p,
                v: &v,
                rho: &rho,
                prev_rho: &prev_rho,
                alpha: &alpha,
                omega: &omega,
                converged: &converged,
            })?;

            self.preconditioner.apply(&p, &mut y)?;
            self.system_matrix.apply(&y, &mut v)?;
            rr.compute_dot(&v, &mut beta)?;
            exec.run(Step2Operation {
                r: &r,
                s: &mut s,
                v: &v,
                rho: &rho,
                alpha: &mut alpha,
                beta: &beta,
                converged: &converged,
            })?;

            exec.run(TestConvergence2Operation {
                s: &s,
                starting_tau: &starting_tau,
                rel_residual_goal: goal,
                alpha: &alpha,
                y: &y,
                x: &mut *x,
                converged: &mut converged,
                all_converged: &mut all_converged,
            })?;
            if all_converged {
                iterations = iter + 1;
                break;
            }
            if iter + 1 == self.options.max_iters {
                // The cap lands on the half-step; commit the pending
                // update for the columns still running.
                exec.run(FinalizeOperation {
                    x: &mut *x,
                    alpha: &alpha,
                    y: &y,
                    converged: &converged,
                })?;
                iterations = iter + 1;
                break;
            }

            self.preconditioner.apply(&s, &mut z)?;
            self.system_matrix.apply(&z, &mut t)?;
            s.compute_dot(&t, &mut gamma)?;
            t.compute_dot(&t, &mut beta)?;
            exec.run(Step3Operation {
                x: &mut *x,
                r: &mut r,
                s: &s,
                t: &t,
                y: &y,
                z: &z,
                alpha: &alpha,
                beta: &beta,
                gamma: &gamma,
                omega: &mut omega,
                converged: &converged,
            })?;
            std::mem::swap(&mut prev_rho, &mut rho);
            iterations = iter + 1;
            log::trace!("bicgstab: iteration {} complete", iterations);
        }

        let flags = converged.as_slice()?.to_vec();
        let status = SolveStatus {
            iterations,
            converged: flags,
        };
        log::debug!(
            "bicgstab: finished after {} iterations, {} of {} columns converged",
            status.iterations,
            status.converged.iter().filter(|&&c| c).count(),
            nrhs
        );
        Ok(status)
    }
}

impl<V: Value> LinOp<V> for Bicgstab<V> {
    fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    fn size(&self) -> Dim {
        self.system_matrix.size()
    }

    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
        self.solve_with_status(b, x).map(|_| ())
    }

    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()> {
        // Solve into a clone first so a failing solve leaves `x` intact.
        let mut x_clone = x.try_clone()?;
        self.apply(b, &mut x_clone)?;
        x.scale(beta)?;
        x.add_scaled(alpha, &x_clone)
    }
}

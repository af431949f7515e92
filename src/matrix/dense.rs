//! Dense row-major matrices
//!
//! `Dense` doubles as the vector type: a multi-column right-hand side is a
//! dense matrix whose columns are the simultaneously solved systems, and
//! per-column solver scalars are 1-by-nrhs dense rows. All arithmetic goes
//! through dispatched operations, never through host loops at the call
//! site.

use crate::array::Array;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::linop::{validate_apply_dims, validate_same_executor, Dim, LinOp};
use crate::operation::register_operation;
use crate::scalar::Value;
use std::sync::Arc;

/// Row-major dense matrix bound to one executor
#[derive(Debug)]
pub struct Dense<V: Value> {
    exec: Arc<Executor>,
    size: Dim,
    values: Array<V>,
}

register_operation!(
    /// `x = a * b`
    SimpleApplyOperation, dense::simple_apply, <V: crate::scalar::Value> {
        a: &'a Dense<V>,
        b: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

register_operation!(
    /// `x = beta * x + alpha * a * b` with 1x1 scalars
    AdvancedApplyOperation, dense::advanced_apply, <V: crate::scalar::Value> {
        alpha: &'a Dense<V>,
        a: &'a Dense<V>,
        b: &'a Dense<V>,
        beta: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

register_operation!(
    /// Column-wise dot products: `result[0][j] = sum_i a[i][j] * b[i][j]`
    ComputeDotOperation, dense::compute_dot, <V: crate::scalar::Value> {
        a: &'a Dense<V>,
        b: &'a Dense<V>,
        result: &'a mut Dense<V>,
    }
);

register_operation!(
    /// `x[i][j] *= alpha[j]` (or a single 1x1 alpha)
    ScaleOperation, dense::scale, <V: crate::scalar::Value> {
        alpha: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

register_operation!(
    /// `x[i][j] += alpha[j] * y[i][j]` (or a single 1x1 alpha)
    AddScaledOperation, dense::add_scaled, <V: crate::scalar::Value> {
        alpha: &'a Dense<V>,
        y: &'a Dense<V>,
        x: &'a mut Dense<V>,
    }
);

impl<V: Value> Dense<V> {
    /// Zero matrix of the given size
    pub fn zeros(exec: Arc<Executor>, size: Dim) -> Result<Self> {
        let values = Array::with_len(Arc::clone(&exec), size.count())?;
        Ok(Self { exec, size, values })
    }

    /// Matrix from row-major data
    pub fn from_slice(exec: Arc<Executor>, size: Dim, data: &[V]) -> Result<Self> {
        if data.len() != size.count() {
            return Err(Error::invalid_argument(
                "data",
                format!("expected {} values, got {}", size.count(), data.len()),
            ));
        }
        let values = Array::from_slice(Arc::clone(&exec), data)?;
        Ok(Self { exec, size, values })
    }

    /// Constant matrix of the given size
    pub fn filled(exec: Arc<Executor>, size: Dim, value: V) -> Result<Self> {
        let mut m = Self::zeros(exec, size)?;
        m.values.fill(value)?;
        Ok(m)
    }

    /// 1x1 matrix holding one scalar
    pub fn scalar(exec: Arc<Executor>, value: V) -> Result<Self> {
        Self::filled(exec, Dim::new(1, 1), value)
    }

    /// Zero matrix with the executor and size of `other`
    pub fn with_config_of(other: &Dense<V>) -> Result<Self> {
        Self::zeros(Arc::clone(&other.exec), other.size)
    }

    /// Matrix size
    pub fn size(&self) -> Dim {
        self.size
    }

    /// The bound executor
    pub fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    /// Backing value array
    pub fn values(&self) -> &Array<V> {
        &self.values
    }

    /// Mutable backing value array (kernel access)
    pub(crate) fn values_mut(&mut self) -> &mut Array<V> {
        &mut self.values
    }

    /// Read one entry (host-accessible executors only)
    pub fn at(&self, row: usize, col: usize) -> Result<V> {
        if row >= self.size.rows || col >= self.size.cols {
            return Err(Error::invalid_argument(
                "row",
                format!(
                    "({row}, {col}) out of bounds for {}x{}",
                    self.size.rows, self.size.cols
                ),
            ));
        }
        let slice = self.values.as_slice()?;
        Ok(slice[row * self.size.cols + col])
    }

    /// Deep copy on the same executor
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            exec: Arc::clone(&self.exec),
            size: self.size,
            values: self.values.try_clone()?,
        })
    }

    /// Deep copy onto `exec` (cross-executor transfer when it differs)
    pub fn copy_to(&self, exec: &Arc<Executor>) -> Result<Self> {
        Ok(Self {
            exec: Arc::clone(exec),
            size: self.size,
            values: self.values.copy_to(exec)?,
        })
    }

    /// Overwrite with `src`, keeping this matrix's executor
    pub fn copy_from(&mut self, src: &Dense<V>) -> Result<()> {
        self.values.copy_from(src.values())?;
        self.size = src.size;
        Ok(())
    }

    /// Column-wise dot products into a 1-by-cols `result`
    pub fn compute_dot(&self, other: &Dense<V>, result: &mut Dense<V>) -> Result<()> {
        validate_same_executor(
            "dense::compute_dot",
            &self.exec,
            &[other.executor(), result.executor()],
        )?;
        if self.size != other.size() {
            return Err(Error::dimension_mismatch(
                "dense::compute_dot",
                self.size.as_array(),
                other.size().as_array(),
            ));
        }
        if result.size() != Dim::new(1, self.size.cols) {
            return Err(Error::dimension_mismatch(
                "dense::compute_dot",
                [1, self.size.cols],
                result.size().as_array(),
            ));
        }
        self.exec.run(ComputeDotOperation {
            a: self,
            b: other,
            result,
        })
    }

    /// `self[i][j] *= alpha[j]`; `alpha` is 1x1 or 1-by-cols
    pub fn scale(&mut self, alpha: &Dense<V>) -> Result<()> {
        let exec = Arc::clone(&self.exec);
        validate_same_executor("dense::scale", &exec, &[alpha.executor()])?;
        check_scaling_dims("dense::scale", alpha, self.size)?;
        exec.run(ScaleOperation { alpha, x: self })
    }

    /// `self[i][j] += alpha[j] * other[i][j]`; `alpha` is 1x1 or 1-by-cols
    pub fn add_scaled(&mut self, alpha: &Dense<V>, other: &Dense<V>) -> Result<()> {
        let exec = Arc::clone(&self.exec);
        validate_same_executor(
            "dense::add_scaled",
            &exec,
            &[alpha.executor(), other.executor()],
        )?;
        if self.size != other.size() {
            return Err(Error::dimension_mismatch(
                "dense::add_scaled",
                self.size.as_array(),
                other.size().as_array(),
            ));
        }
        check_scaling_dims("dense::add_scaled", alpha, self.size)?;
        exec.run(AddScaledOperation {
            alpha,
            y: other,
            x: self,
        })
    }
}

fn check_scaling_dims<V: Value>(op: &'static str, alpha: &Dense<V>, size: Dim) -> Result<()> {
    let a = alpha.size();
    if a.rows != 1 || (a.cols != 1 && a.cols != size.cols) {
        return Err(Error::dimension_mismatch(op, [1, size.cols], a.as_array()));
    }
    Ok(())
}

impl<V: Value> LinOp<V> for Dense<V> {
    fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    fn size(&self) -> Dim {
        self.size
    }

    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
        validate_same_executor("dense::apply", &self.exec, &[b.executor(), x.executor()])?;
        validate_apply_dims("dense::apply", self.size, b, x)?;
        self.exec.run(SimpleApplyOperation { a: self, b, x })
    }

    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()> {
        validate_same_executor(
            "dense::apply",
            &self.exec,
            &[alpha.executor(), b.executor(), beta.executor(), x.executor()],
        )?;
        validate_apply_dims("dense::apply", self.size, b, x)?;
        check_scaling_dims("dense::apply", alpha, Dim::new(1, 1))?;
        check_scaling_dims("dense::apply", beta, Dim::new(1, 1))?;
        self.exec.run(AdvancedApplyOperation {
            alpha,
            a: self,
            b,
            beta,
            x,
        })
    }
}

//! Identity operator, the default preconditioner

use crate::error::Result;
use crate::executor::Executor;
use crate::linop::{validate_apply_dims, validate_same_executor, Dim, LinOp};
use crate::matrix::Dense;
use crate::scalar::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// n-by-n identity operator
pub struct Identity<V: Value> {
    exec: Arc<Executor>,
    size: Dim,
    _value: PhantomData<V>,
}

impl<V: Value> Identity<V> {
    /// Identity of order `n` on `exec`
    pub fn new(exec: Arc<Executor>, n: usize) -> Self {
        Self {
            exec,
            size: Dim::square(n),
            _value: PhantomData,
        }
    }
}

impl<V: Value> LinOp<V> for Identity<V> {
    fn executor(&self) -> &Arc<Executor> {
        &self.exec
    }

    fn size(&self) -> Dim {
        self.size
    }

    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
        validate_same_executor("identity::apply", &self.exec, &[b.executor(), x.executor()])?;
        validate_apply_dims("identity::apply", self.size, b, x)?;
        x.copy_from(b)
    }

    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()> {
        validate_same_executor(
            "identity::apply",
            &self.exec,
            &[alpha.executor(), b.executor(), beta.executor(), x.executor()],
        )?;
        validate_apply_dims("identity::apply", self.size, b, x)?;
        x.scale(beta)?;
        x.add_scaled(alpha, b)
    }
}

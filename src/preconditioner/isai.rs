//! Incomplete sparse approximate inverse preconditioner
//!
//! For a triangular factor `M`, the ISAI approach computes a sparse
//! approximate inverse sharing `M`'s sparsity pattern: each row of the
//! inverse solves a small dense triangular system gathered from `M` over
//! that row's pattern. Application is then a single sparse
//! matrix-vector product, with no triangular solve at apply time.

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::linop::{Dim, LinOp};
use crate::matrix::{Csr, Dense};
use crate::operation::register_operation;
use crate::scalar::{Index, Value};
use std::sync::Arc;

/// Which triangular factor the inverse approximates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsaiType {
    /// Lower triangular factor with unit-free diagonal
    Lower,
    /// Upper triangular factor
    Upper,
}

register_operation!(
    /// Approximate inverse generation for a lower triangular factor
    GenerateLowerOperation, isai::generate_l, <V: crate::scalar::Value, I: crate::scalar::Index> {
        mtx: &'a Csr<V, I>,
        inverse: &'a mut Csr<V, I>,
    }
);

register_operation!(
    /// Approximate inverse generation for an upper triangular factor
    GenerateUpperOperation, isai::generate_u, <V: crate::scalar::Value, I: crate::scalar::Index> {
        mtx: &'a Csr<V, I>,
        inverse: &'a mut Csr<V, I>,
    }
);

/// Sparse approximate inverse of one triangular factor
pub struct Isai<V: Value, I: Index> {
    approximate_inverse: Csr<V, I>,
}

impl<V: Value, I: Index> Isai<V, I> {
    /// Generate the approximate inverse of the triangular factor `mtx`
    pub fn generate(isai_type: IsaiType, mtx: &Csr<V, I>) -> Result<Self> {
        if !mtx.size().is_square() {
            return Err(Error::dimension_mismatch(
                "isai::generate",
                [mtx.size().rows, mtx.size().rows],
                mtx.size().as_array(),
            ));
        }
        let exec = Arc::clone(mtx.executor());
        let mut inverse = Csr::with_pattern_of(mtx)?;
        match isai_type {
            IsaiType::Lower => exec.run(GenerateLowerOperation {
                mtx,
                inverse: &mut inverse,
            })?,
            IsaiType::Upper => exec.run(GenerateUpperOperation {
                mtx,
                inverse: &mut inverse,
            })?,
        }
        Ok(Self {
            approximate_inverse: inverse,
        })
    }

    /// The generated inverse factor
    pub fn approximate_inverse(&self) -> &Csr<V, I> {
        &self.approximate_inverse
    }
}

impl<V: Value, I: Index> LinOp<V> for Isai<V, I> {
    fn executor(&self) -> &Arc<Executor> {
        self.approximate_inverse.executor()
    }

    fn size(&self) -> Dim {
        self.approximate_inverse.size()
    }

    fn apply(&self, b: &Dense<V>, x: &mut Dense<V>) -> Result<()> {
        self.approximate_inverse.apply(b, x)
    }

    fn apply_scaled(
        &self,
        alpha: &Dense<V>,
        b: &Dense<V>,
        beta: &Dense<V>,
        x: &mut Dense<V>,
    ) -> Result<()> {
        self.approximate_inverse.apply_scaled(alpha, b, beta, x)
    }
}

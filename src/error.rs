//! Error types for solvr

use thiserror::Error;

/// Result type alias using solvr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in solvr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Allocation failure on a backend
    #[error("Out of memory: failed to allocate {size} bytes on {backend}")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
        /// Backend the allocation was requested on
        backend: &'static str,
    },

    /// Objects bound to different executors were mixed in one operation
    #[error("Executor mismatch in '{op}': all operands must share one executor")]
    ExecutorMismatch {
        /// The operation that detected the mismatch
        op: &'static str,
    },

    /// An operation has no implementation on the chosen backend
    #[error("Operation '{op}' is not supported on the {backend} backend")]
    OperationNotSupported {
        /// The operation name
        op: &'static str,
        /// The backend it was dispatched to
        backend: &'static str,
    },

    /// A stub module was exercised
    #[error("The {module} module is not compiled")]
    ModuleNotCompiled {
        /// The missing module
        module: &'static str,
    },

    /// Dimension mismatch between operands
    #[error("Dimension mismatch in '{op}': expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// The operation name
        op: &'static str,
        /// Expected [rows, cols]
        expected: [usize; 2],
        /// Actual [rows, cols]
        got: [usize; 2],
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Host access to memory that is not host-accessible
    #[error("Memory on the {backend} backend is not host-accessible")]
    NotHostAccessible {
        /// Backend owning the memory
        backend: &'static str,
    },

    /// Deferred backend fault surfaced by synchronize
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(op: &'static str, expected: [usize; 2], got: [usize; 2]) -> Self {
        Self::DimensionMismatch { op, expected, got }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}

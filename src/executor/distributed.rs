//! Distributed executor, compiled as a stub in this build
//!
//! Construction records the requested sub-executors and launch arguments so
//! that call sites can be written and tested, but every operational method
//! fails with an explicit module-not-compiled error. A real distributed
//! module would replace these bodies without changing the contract.

use crate::error::{Error, Result};

/// Distributed wrapper executor
#[derive(Debug)]
pub struct DistributedExecutor {
    sub_executors: Vec<String>,
    launch_args: Vec<String>,
}

impl DistributedExecutor {
    pub(super) fn new(sub_executors: Vec<String>, launch_args: Vec<String>) -> Self {
        Self {
            sub_executors,
            launch_args,
        }
    }

    /// Names of the sub-executors each rank would run on
    pub fn sub_executors(&self) -> &[String] {
        &self.sub_executors
    }

    /// Process launch arguments recorded at creation
    pub fn launch_args(&self) -> &[String] {
        &self.launch_args
    }

    /// Number of ranks in the communicator
    pub fn num_ranks(&self) -> Result<usize> {
        Err(Self::not_compiled())
    }

    /// Whether the communication layer has been initialized
    pub fn is_initialized(&self) -> Result<bool> {
        Err(Self::not_compiled())
    }

    /// Tear down the communication layer
    pub fn destroy(&self) -> Result<()> {
        Err(Self::not_compiled())
    }

    /// Block until outstanding communication completes
    pub fn synchronize(&self) -> Result<()> {
        Err(Self::not_compiled())
    }

    fn not_compiled() -> Error {
        log::warn!("distributed executor exercised, but the module is not compiled");
        Error::ModuleNotCompiled {
            module: "distributed",
        }
    }
}

//! Operations: backend-dispatchable units of numerical work
//!
//! An operation is a value describing one unit of work, with one entry
//! point per backend. Algorithm code constructs the operation immediately
//! before dispatch, hands it to [`Executor::run`](crate::executor::Executor::run),
//! and the executor variant selects which entry point executes. An
//! operation describes a single dispatch, not a reusable job: every entry
//! point consumes it.
//!
//! Backends without an implementation for a given operation fail fast
//! through the default entry points; nothing ever silently falls back to a
//! different backend.

use crate::error::{Error, Result};
use crate::executor::{
    DistributedExecutor, HostParallelExecutor, ReferenceExecutor,
};

/// One described unit of numerical work
pub trait Operation {
    /// Kernel name, used in capability errors and log output
    fn name(&self) -> &'static str;

    /// Execute on the reference backend
    fn run_reference(self, _exec: &ReferenceExecutor) -> Result<()>
    where
        Self: Sized,
    {
        Err(Error::OperationNotSupported {
            op: self.name(),
            backend: "reference",
        })
    }

    /// Execute on the host-parallel backend
    fn run_host_parallel(self, _exec: &HostParallelExecutor) -> Result<()>
    where
        Self: Sized,
    {
        Err(Error::OperationNotSupported {
            op: self.name(),
            backend: "host-parallel",
        })
    }

    /// Execute on the accelerator backend
    fn run_accelerator(self, _exec: &crate::executor::AcceleratorExecutor) -> Result<()>
    where
        Self: Sized,
    {
        Err(Error::OperationNotSupported {
            op: self.name(),
            backend: "accelerator",
        })
    }

    /// Execute on the distributed backend
    fn run_distributed(self, _exec: &DistributedExecutor) -> Result<()>
    where
        Self: Sized,
    {
        Err(Error::OperationNotSupported {
            op: self.name(),
            backend: "distributed",
        })
    }
}

/// Generate the typed operation struct for one kernel
///
/// For a kernel `module::kernel` implemented in
/// `crate::kernels::reference::module` and
/// `crate::kernels::host_parallel::module`, this produces a struct holding
/// the kernel's typed arguments and wires each implemented entry point to
/// the matching backend function. Registration is mechanical: one
/// invocation per (kernel, value-type-parameter) combination, next to the
/// code that dispatches it.
macro_rules! register_operation {
    ($(#[$meta:meta])* $op:ident, $module:ident :: $kernel:ident,
     <$($generic:ident : $bound:path),+> { $($field:ident : $fty:ty),* $(,)? }) => {
        $(#[$meta])*
        pub(crate) struct $op<'a, $($generic: $bound),+> {
            $(pub(crate) $field: $fty,)*
        }

        impl<'a, $($generic: $bound),+> $crate::operation::Operation
            for $op<'a, $($generic),+>
        {
            fn name(&self) -> &'static str {
                concat!(stringify!($module), "::", stringify!($kernel))
            }

            fn run_reference(
                self,
                exec: &$crate::executor::ReferenceExecutor,
            ) -> $crate::error::Result<()> {
                $crate::kernels::reference::$module::$kernel(exec, $(self.$field),*)
            }

            fn run_host_parallel(
                self,
                exec: &$crate::executor::HostParallelExecutor,
            ) -> $crate::error::Result<()> {
                $crate::kernels::host_parallel::$module::$kernel(exec, $(self.$field),*)
            }
        }
    };
}

pub(crate) use register_operation;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executor;

    struct UnimplementedOp;

    impl Operation for UnimplementedOp {
        fn name(&self) -> &'static str {
            "test::unimplemented"
        }
    }

    #[test]
    fn default_entry_points_fail_fast() {
        let acc = Executor::accelerator(0, Executor::reference());
        let err = acc.run(UnimplementedOp).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation 'test::unimplemented' is not supported on the accelerator backend"
        );

        let dist = Executor::distributed(vec![], vec![]);
        let err = dist.run(UnimplementedOp).unwrap_err();
        assert!(err.to_string().contains("distributed"));
    }

    #[test]
    fn unregistered_backends_reject_even_host_dispatch() {
        let exec = Executor::reference();
        let err = exec.run(UnimplementedOp).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::OperationNotSupported {
                backend: "reference",
                ..
            }
        ));
    }
}

//! Matrix types implementing [`LinOp`](crate::linop::LinOp)

mod csr;
mod dense;
mod identity;

pub use csr::Csr;
pub use dense::Dense;
pub use identity::Identity;

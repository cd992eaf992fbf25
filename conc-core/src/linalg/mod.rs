//! Dense linear algebra for the trust-region core.
//!
//! The Hessian of the dual objective is a small dense m×m matrix (m =
//! number of monomer species), so everything here is dense: slice helpers
//! for the hot vector loops and a Cholesky wrapper that reports
//! indefiniteness instead of aborting.

pub mod cholesky;
pub mod dense;

pub use cholesky::{CholeskyError, DenseCholesky};

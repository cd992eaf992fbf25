//! Dense Cholesky factorization with graceful failure.
//!
//! The trust-region Hessian is positive definite in exact arithmetic but
//! drifts toward singularity as the iterate approaches the optimum. The
//! factorization therefore must report indefiniteness as an ordinary error
//! so the search-direction routine can fall back to a Cauchy step.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use thiserror::Error;

/// Cholesky factorization errors.
#[derive(Error, Debug)]
pub enum CholeskyError {
    /// Factorization failed (matrix not positive definite)
    #[error("factorization failed: matrix not positive definite")]
    NotPositiveDefinite,
}

/// Cholesky factor of a dense symmetric positive definite matrix.
pub struct DenseCholesky {
    chol: Cholesky<f64, Dyn>,
}

impl DenseCholesky {
    /// Factor a copy of `mat`; the caller's matrix is left untouched.
    pub fn factor(mat: &DMatrix<f64>) -> Result<Self, CholeskyError> {
        match Cholesky::new(mat.clone_owned()) {
            Some(chol) => Ok(Self { chol }),
            None => Err(CholeskyError::NotPositiveDefinite),
        }
    }

    /// Solve H p = -g and return p.
    pub fn solve_neg(&self, g: &[f64]) -> Vec<f64> {
        let rhs = DVector::from_column_slice(g);
        let sol = self.chol.solve(&rhs);
        sol.iter().map(|v| -v).collect()
    }
}

//! Dogleg solution of the trust-region sub-problem.
//!
//! Minimizes the local quadratic model over the trust region: take the
//! Newton step when it fits, otherwise walk the dogleg path from the Cauchy
//! minimizer toward the Newton point. The boundary intersection reduces to
//! a quadratic that is solved in the numerically stable form
//! q = -(b + sgn(b)·sqrt(b² - 4ac)) / 2, trying the root c/q before q/a.

use nalgebra::DMatrix;

use crate::linalg::dense::{dot, norm_sq};
use crate::linalg::DenseCholesky;

/// Which branch produced the search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Pure Newton step, strictly inside the trust region
    Newton,
    /// Cauchy step truncated to the trust-region boundary
    Cauchy,
    /// Dogleg interpolation between the Cauchy and Newton points
    Dogleg,
    /// Cholesky failed; the unconstrained Cauchy minimizer was taken
    CholFailCauchy,
    /// Cholesky failed, but the boundary Cauchy step would have been taken
    /// regardless
    CholFailBoundaryCauchy,
    /// No dogleg root fell in [0, 1]; fell back to the Cauchy minimizer
    DoglegFallback,
}

/// Per-attempt counters over the sub-problem branches.
///
/// Not part of the solve contract; kept for observability. The dogleg
/// fallback in particular should never fire in exact arithmetic, so its
/// count is worth watching.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    /// Pure Newton steps
    pub newton: usize,
    /// Boundary Cauchy steps
    pub cauchy: usize,
    /// Dogleg steps
    pub dogleg: usize,
    /// Cauchy steps forced by a Cholesky failure
    pub chol_fail_cauchy: usize,
    /// Cholesky failures that did not change the outcome
    pub chol_fail_boundary_cauchy: usize,
    /// Dogleg root-selection failures
    pub dogleg_fallback: usize,
}

impl StepStats {
    /// Record one search-direction outcome.
    pub fn record(&mut self, kind: StepKind) {
        match kind {
            StepKind::Newton => self.newton += 1,
            StepKind::Cauchy => self.cauchy += 1,
            StepKind::Dogleg => self.dogleg += 1,
            StepKind::CholFailCauchy => self.chol_fail_cauchy += 1,
            StepKind::CholFailBoundaryCauchy => self.chol_fail_boundary_cauchy += 1,
            StepKind::DoglegFallback => self.dogleg_fallback += 1,
        }
    }
}

/// Compute the search direction `p` with ‖p‖ ≤ `delta`.
///
/// `hes` must be symmetric; it is positive definite in exact arithmetic but
/// may fail to factor near convergence, in which case the routine degrades
/// to Cauchy steps.
pub(crate) fn search_direction(
    p: &mut [f64],
    grad: &[f64],
    hes: &DMatrix<f64>,
    delta: f64,
) -> StepKind {
    let m = grad.len();
    let delta2 = delta * delta;

    // Newton step p_B = -H⁻¹ g; take it outright when it fits.
    let newton = DenseCholesky::factor(hes).ok().map(|chol| chol.solve_neg(grad));
    if let Some(pb) = &newton {
        if norm_sq(pb) <= delta2 {
            p.copy_from_slice(pb);
            return StepKind::Newton;
        }
    }

    // Cauchy direction p_U = -(gᵀg)/(gᵀHg) · g, the unconstrained minimizer
    // of the quadratic along steepest descent.
    let mut h_grad = vec![0.0; m];
    crate::linalg::dense::sym_matvec(hes, grad, &mut h_grad);
    let coeff = dot(grad, grad) / dot(grad, &h_grad);
    let pu: Vec<f64> = grad.iter().map(|&gi| -coeff * gi).collect();

    let pu2 = norm_sq(&pu);
    if pu2 >= delta2 {
        // Even the Cauchy minimizer leaves the region: truncate to the
        // boundary. A Cholesky failure is irrelevant on this branch.
        let tau = (delta2 / pu2).sqrt();
        for (pi, &pui) in p.iter_mut().zip(&pu) {
            *pi = tau * pui;
        }
        return if newton.is_some() {
            StepKind::Cauchy
        } else {
            StepKind::CholFailBoundaryCauchy
        };
    }

    let Some(pb) = newton else {
        p.copy_from_slice(&pu);
        return StepKind::CholFailCauchy;
    };

    // Dogleg: find α ∈ [0, 1] with ‖p_U + α (p_B - p_U)‖² = δ².
    let pb2 = norm_sq(&pb);
    let pb_pu = dot(&pb, &pu);
    let a = pb2 + pu2 - 2.0 * pb_pu;
    let b = 2.0 * (pb_pu - pu2);
    let c = pu2 - delta2;
    let sgn_b = if b < 0.0 { -1.0 } else { 1.0 };

    // A negative discriminant can only come from precision loss; the sqrt
    // then yields NaN and both root checks below fail.
    let q = -0.5 * (b + sgn_b * (b * b - 4.0 * a * c).sqrt());
    let x1 = q / a;
    let x2 = c / q;

    // x2 should be the positive root, x1 the negative one.
    let alpha = if (0.0..=1.0).contains(&x2) {
        Some(x2)
    } else if (0.0..=1.0).contains(&x1) {
        Some(x1)
    } else {
        None
    };

    match alpha {
        Some(alpha) => {
            for (pi, (&pui, &pbi)) in p.iter_mut().zip(pu.iter().zip(&pb)) {
                *pi = pui + alpha * (pbi - pui);
            }
            StepKind::Dogleg
        }
        None => {
            log::warn!(
                "dogleg roots {:.6e}, {:.6e} outside [0, 1]; falling back to Cauchy direction",
                x1,
                x2
            );
            p.copy_from_slice(&pu);
            StepKind::DoglegFallback
        }
    }
}

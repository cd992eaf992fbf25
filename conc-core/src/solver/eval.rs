//! Evaluators mapping the dual iterate to primal quantities.
//!
//! All evaluation routines are overflow-aware: the exponent argument of the
//! mole-fraction map is checked against [`MAX_LOG_X`] before any `exp` is
//! taken, so an overflow is always reported, never produced.

use nalgebra::DMatrix;

use crate::linalg::dense::{dot, sym_matvec};
use crate::problem::{ProblemData, MAX_LOG_X};

/// Marker for an exponent-cap violation during evaluation.
///
/// Recoverable in the restart-probing and trial-step paths; converted into
/// [`crate::ConcError::Overflow`] by the driver everywhere else.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Overflow {
    /// The offending log mole fraction
    pub log_x: f64,
}

/// Mole fractions from the dual multipliers:
/// x[j] = exp(-G[j] + A^T[j] . λ).
pub(crate) fn mole_fractions(
    x: &mut [f64],
    lambda: &[f64],
    prob: &ProblemData,
) -> Result<(), Overflow> {
    let n = prob.num_complexes();
    debug_assert_eq!(x.len(), n);

    for j in 0..n {
        let mut log_x = -prob.g[j];
        for (li, &aij) in lambda.iter().zip(prob.stoich.column(j)) {
            log_x += f64::from(aij) * li;
        }
        if log_x > MAX_LOG_X {
            return Err(Overflow { log_x });
        }
        x[j] = log_x.exp();
    }

    Ok(())
}

/// Gradient of the negated dual objective:
/// grad[i] = -x0[i] + A[i] . x.
pub(crate) fn gradient(grad: &mut [f64], x: &[f64], prob: &ProblemData) {
    let m = prob.num_species();
    debug_assert_eq!(grad.len(), m);

    for i in 0..m {
        let mut acc = -prob.x0[i];
        for (&xj, &aij) in x.iter().zip(prob.stoich.row(i)) {
            acc += f64::from(aij) * xj;
        }
        grad[i] = acc;
    }
}

/// Hessian of the negated dual objective:
/// H[r][c] = sum_j A[r][j] * A[c][j] * x[j].
///
/// Only the upper triangle is computed; the lower triangle is mirrored
/// afterwards so the matrix is usable in full matrix-vector products.
/// `avec` is an n-length scratch buffer holding the elementwise row product
/// for one (r, c) pair at a time.
pub(crate) fn hessian(hes: &mut DMatrix<f64>, x: &[f64], prob: &ProblemData, avec: &mut [f64]) {
    let m = prob.num_species();
    debug_assert_eq!(hes.nrows(), m);
    debug_assert_eq!(avec.len(), x.len());

    for c in 0..m {
        let row_c = prob.stoich.row(c);
        for r in 0..=c {
            let row_r = prob.stoich.row(r);
            for (aj, (&arj, &acj)) in avec.iter_mut().zip(row_r.iter().zip(row_c)) {
                *aj = f64::from(arj) * f64::from(acj);
            }
            hes[(r, c)] = dot(x, avec);
        }
    }

    for r in 1..m {
        for c in 0..r {
            hes[(r, c)] = hes[(c, r)];
        }
    }
}

/// Negated dual objective -h(λ) = sum_j x[j] - λ^T x0.
///
/// Only differences of this quantity are consumed (inside ρ), so no care is
/// taken about its absolute scale.
pub(crate) fn neg_dual_objective(x: &[f64], lambda: &[f64], x0: &[f64]) -> f64 {
    x.iter().sum::<f64>() - dot(lambda, x0)
}

/// Ratio of actual to predicted reduction for the step `p`.
///
/// The trial point λ + p is evaluated into the caller-supplied scratch
/// buffers and discarded. An overflow at the trial point implies the true
/// reduction went the wrong way, so ρ = -1 and the step is rejected cleanly.
pub(crate) fn rho(
    prob: &ProblemData,
    lambda: &[f64],
    p: &[f64],
    grad: &[f64],
    x: &[f64],
    hes: &DMatrix<f64>,
    new_lambda: &mut [f64],
    new_x: &mut [f64],
    hp: &mut [f64],
) -> f64 {
    let neg_h = neg_dual_objective(x, lambda, &prob.x0);

    for (nl, (&li, &pi)) in new_lambda.iter_mut().zip(lambda.iter().zip(p)) {
        *nl = li + pi;
    }

    match mole_fractions(new_x, new_lambda, prob) {
        Ok(()) => {
            let new_neg_h = neg_dual_objective(new_x, new_lambda, &prob.x0);
            sym_matvec(hes, p, hp);
            let p_h_p = dot(p, hp);
            (neg_h - new_neg_h) / (-dot(grad, p) - 0.5 * p_h_p)
        }
        // The predicted reduction is always positive, so an overflow at the
        // trial point stands in for a negative actual reduction.
        Err(_) => -1.0,
    }
}

/// Total Gibbs free energy of the solution at x, in kcal per liter.
pub(crate) fn free_energy(x: &[f64], prob: &ProblemData) -> f64 {
    let mut energy = 0.0;

    // Reference contribution of the unreacted monomers
    for &x0i in &prob.x0 {
        energy += x0i * (1.0 - x0i.ln());
    }
    for (j, &xj) in x.iter().enumerate() {
        if xj > 0.0 {
            energy += xj * (xj.ln() + prob.g[j] - 1.0);
        }
    }

    energy * prob.kt * prob.water_molarity
}

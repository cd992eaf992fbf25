//! Trust-region driver for the dual equilibrium problem.
//!
//! The outer loop tries up to `max_trial` initial conditions: the fresh
//! analytic guess first, then randomly perturbed restarts whenever an
//! attempt stalls or runs out of iterations. Each attempt runs the
//! classical trust-region iteration (Nocedal & Wright, Numerical
//! Optimization, ch. 4) with dogleg search directions.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{ConcError, ConcResult};
use crate::linalg::dense::norm;
use crate::problem::{
    ProblemData, SolveInfo, SolveResult, SolveStatus, SolverSettings, NUM_PRECISION,
};
use crate::solver::dogleg::{self, StepStats};
use crate::solver::workspace::SolverWorkspace;
use crate::solver::{eval, guess};
use crate::util;

/// Compute the equilibrium mole fractions of all complexes.
///
/// Returns the mole fractions, the total Gibbs free energy, and per-solve
/// diagnostics. A [`SolveStatus::TrialsExhausted`] result still carries the
/// final iterate in `x`; a [`ConcError::Overflow`] error means the
/// exponential map blew past its cap outside the perturbation envelope and
/// the surrounding executable should exit with
/// [`crate::OVERFLOW_EXIT_CODE`].
pub fn solve(prob: &ProblemData, settings: &SolverSettings) -> ConcResult<SolveResult> {
    prob.validate().map_err(ConcError::InvalidProblem)?;
    settings.validate().map_err(ConcError::InvalidProblem)?;

    let m = prob.num_species();
    let n = prob.num_complexes();
    let mut ws = SolverWorkspace::new(m, n);

    for i in 0..m {
        ws.abs_tol[i] = settings.tol * prob.x0[i];
        // Preset above tolerance so the first attempt always runs
        ws.grad[i] = ws.abs_tol[i] + 1.0;
    }

    // The restart generator is seeded lazily, only when the fresh attempt
    // has already failed.
    let mut rng: Option<ChaCha8Rng> = None;

    let mut trials = 0usize;
    let mut total_iters = 0usize;
    let mut stats = StepStats::default();

    while !within_tolerance(&ws.grad, &ws.abs_tol) && trials < settings.max_trial {
        if trials == 1 {
            let seed = util::derive_seed(settings.seed);
            log::debug!("seeding restart generator ({})", seed);
            rng = Some(ChaCha8Rng::seed_from_u64(seed));
        }

        guess::initial_guess(
            &mut ws.lambda,
            prob,
            rng.as_mut(),
            settings.perturb_scale,
            &mut ws.new_lambda,
            &mut ws.new_x,
        );

        // The guess builder guarantees a safe point, so an overflow here is
        // terminal by contract.
        eval::mole_fractions(&mut ws.x, &ws.lambda, prob)
            .map_err(|o| ConcError::overflow(o.log_x))?;
        eval::gradient(&mut ws.grad, &ws.x, prob);

        let mut delta = 0.99 * settings.delta_bar;
        let mut iters = 0usize;
        let mut no_step = 0usize;
        stats = StepStats::default();

        while iters < settings.max_iters
            && !within_tolerance(&ws.grad, &ws.abs_tol)
            && no_step < settings.max_no_step
        {
            eval::hessian(&mut ws.hes, &ws.x, prob, &mut ws.avec);

            let kind = dogleg::search_direction(&mut ws.step, &ws.grad, &ws.hes, delta);
            stats.record(kind);

            let rho = eval::rho(
                prob,
                &ws.lambda,
                &ws.step,
                &ws.grad,
                &ws.x,
                &ws.hes,
                &mut ws.new_lambda,
                &mut ws.new_x,
                &mut ws.hp,
            );

            // Radius update: shrink on poor agreement; grow only when the
            // model did well and the step actually hit the boundary.
            if rho < 0.25 {
                delta /= 4.0;
            } else if rho > 0.75 && (norm(&ws.step) - delta).abs() < NUM_PRECISION {
                delta = (2.0 * delta).min(settings.delta_bar);
            }

            if rho > settings.eta {
                for (li, &pi) in ws.lambda.iter_mut().zip(&ws.step) {
                    *li += pi;
                }
                no_step = 0;
            } else {
                no_step += 1;
            }

            // An accepted step was already checked inside ρ; a rejected one
            // leaves λ where it was. Overflow here is therefore terminal.
            eval::mole_fractions(&mut ws.x, &ws.lambda, prob)
                .map_err(|o| ConcError::overflow(o.log_x))?;
            eval::gradient(&mut ws.grad, &ws.x, prob);

            iters += 1;
        }

        total_iters += iters;
        trials += 1;

        if !within_tolerance(&ws.grad, &ws.abs_tol) && trials < settings.max_trial {
            log::info!(
                "attempt {} stalled after {} iterations; restarting from perturbed multipliers",
                trials,
                iters
            );
        }
    }

    let converged = within_tolerance(&ws.grad, &ws.abs_tol);
    let status = if converged {
        SolveStatus::Converged
    } else {
        SolveStatus::TrialsExhausted
    };

    // The free energy is reported for both terminal outcomes; callers of a
    // non-converged solve still see the last iterate.
    let free_energy = eval::free_energy(&ws.x, prob);

    Ok(SolveResult {
        status,
        x: ws.x,
        free_energy,
        info: SolveInfo {
            iterations: total_iters,
            trials,
            steps: stats,
        },
    })
}

/// True when every gradient entry is within its absolute tolerance.
fn within_tolerance(grad: &[f64], abs_tol: &[f64]) -> bool {
    grad.iter()
        .zip(abs_tol)
        .all(|(&gi, &ti)| gi.abs() <= ti)
}

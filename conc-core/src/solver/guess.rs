//! Initial-guess builder for the dual multipliers.
//!
//! A fresh start sets every multiplier to the largest common value that
//! keeps every complex below the guess-time exponent cap; restarts add a
//! random perturbation first. Either way the returned multipliers are
//! immediately safe for the exponential map.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::problem::{ProblemData, GUESS_MAX_LOG_X};
use crate::solver::eval;

/// Build the starting multipliers in place.
///
/// `rng` is `None` for the fresh first attempt and `Some` for perturbed
/// restarts. `trial_lambda` and `probe_x` are scratch buffers used to test
/// perturbed candidates for overflow without touching `lambda`.
pub(crate) fn initial_guess(
    lambda: &mut [f64],
    prob: &ProblemData,
    rng: Option<&mut ChaCha8Rng>,
    perturb_scale: f64,
    trial_lambda: &mut [f64],
    probe_x: &mut [f64],
) {
    let n = prob.num_complexes();

    // Largest uniform multiplier value such that every complex satisfies
    // column_sum(j) * Λ - G[j] <= GUESS_MAX_LOG_X.
    let mut lambda_val = (GUESS_MAX_LOG_X + prob.g[0]) / f64::from(prob.stoich.column_sum(0));
    for j in 1..n {
        let candidate = (GUESS_MAX_LOG_X + prob.g[j]) / f64::from(prob.stoich.column_sum(j));
        if candidate < lambda_val {
            lambda_val = candidate;
        }
    }
    lambda.fill(lambda_val);

    if let Some(rng) = rng {
        perturb(lambda, perturb_scale, prob, rng, trial_lambda, probe_x);
    }

    // Inert species have a closed-form multiplier; overwrite last so the
    // perturbation cannot disturb it.
    for (i, li) in lambda.iter_mut().enumerate() {
        if let Some(j) = prob.stoich.single_complex_of(i) {
            *li = prob.x0[i].ln() + prob.g[j];
        }
    }
}

/// Add a uniform random offset in [-scale, scale] to every multiplier.
///
/// Candidates that overflow the exponential map are redrawn with the scale
/// halved, so the scale decreases monotonically within one restart and a
/// safe point is always reached.
fn perturb(
    lambda: &mut [f64],
    mut scale: f64,
    prob: &ProblemData,
    rng: &mut ChaCha8Rng,
    trial_lambda: &mut [f64],
    probe_x: &mut [f64],
) {
    loop {
        for (tl, &li) in trial_lambda.iter_mut().zip(lambda.iter()) {
            *tl = li + scale * rng.gen_range(-1.0..=1.0);
        }
        let safe = eval::mole_fractions(probe_x, trial_lambda, prob).is_ok();
        scale /= 2.0;
        if safe {
            break;
        }
    }
    lambda.copy_from_slice(trial_lambda);
}

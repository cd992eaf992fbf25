//! End-to-end integration tests for the concentration solver.
//!
//! These tests validate the full trust-region pipeline on small aggregation
//! systems whose equilibria are pinned down by mass balance and the
//! algebraic identities of the mole-fraction map.

use conc_core::{solve, ConcError, ProblemData, SolveStatus, SolverSettings, Stoichiometry};

const KT_37C: f64 = 0.616; // kcal/mol at 37 °C
const WATER_MOLARITY: f64 = 55.14; // mol/L at 37 °C

fn problem(rows: &[Vec<u32>], g: Vec<f64>, x0: Vec<f64>) -> ProblemData {
    ProblemData {
        stoich: Stoichiometry::from_rows(rows).expect("valid stoichiometry"),
        g,
        x0,
        kt: KT_37C,
        water_molarity: WATER_MOLARITY,
    }
}

/// Residual of the mass-balance constraint for monomer `i`.
fn mass_balance_residual(prob: &ProblemData, x: &[f64], i: usize) -> f64 {
    let total: f64 = x
        .iter()
        .zip(prob.stoich.row(i))
        .map(|(&xj, &aij)| f64::from(aij) * xj)
        .sum();
    total - prob.x0[i]
}

#[test]
fn test_single_species_identity() {
    // One monomer, one complex (itself): the solution is x = x0, found
    // analytically by the inert closed form in a single attempt.
    let prob = problem(&[vec![1]], vec![0.0], vec![2.5e-5]);

    let result = solve(&prob, &SolverSettings::default()).expect("solve failed");

    assert_eq!(result.status, SolveStatus::Converged);
    assert_eq!(result.status.code(), 1);
    assert_eq!(result.info.trials, 1);
    assert!(
        (result.x[0] - 2.5e-5).abs() < 2.5e-5 * 1e-9,
        "x = {:?}",
        result.x
    );
}

#[test]
fn test_monomer_trimer_mass_balance() {
    // Single strand a with complexes {a, aa, aaa}
    let prob = problem(&[vec![1, 2, 3]], vec![0.0, -1.0, -2.0], vec![1e-4]);

    let result = solve(&prob, &SolverSettings::default()).expect("solve failed");
    println!("status = {}, x = {:?}", result.status, result.x);

    assert_eq!(result.status, SolveStatus::Converged);
    assert!(
        mass_balance_residual(&prob, &result.x, 0).abs() <= 1e-7 * 1e-4,
        "mass balance violated: {}",
        mass_balance_residual(&prob, &result.x, 0)
    );

    // log x[aa] = 1 + 2λ and log x[a] = λ, so x[aa] = e * x[a]^2;
    // likewise x[aaa] = e^2 * x[a]^3.
    let xa = result.x[0];
    assert!((result.x[1] / (1.0f64.exp() * xa * xa) - 1.0).abs() < 1e-5);
    assert!((result.x[2] / (2.0f64.exp() * xa * xa * xa) - 1.0).abs() < 1e-5);
}

#[test]
fn test_two_strand_complexes() {
    // Two monomers a, b forming {a, b, ab, aa, bb}
    let prob = problem(
        &[vec![1, 0, 1, 2, 0], vec![0, 1, 1, 0, 2]],
        vec![0.0, 0.0, -2.0, -1.0, -1.0],
        vec![1e-6, 1e-6],
    );

    let result = solve(&prob, &SolverSettings::default()).expect("solve failed");
    println!("status = {}, x = {:?}", result.status, result.x);

    assert_eq!(result.status, SolveStatus::Converged);
    for i in 0..2 {
        assert!(
            mass_balance_residual(&prob, &result.x, i).abs() <= 1e-7 * 1e-6,
            "mass balance violated for monomer {}",
            i
        );
    }

    // Mole-fraction identities through the dual multipliers:
    // x[ab] = e^2 x[a] x[b], x[aa] = e x[a]^2, x[bb] = e x[b]^2.
    let (xa, xb) = (result.x[0], result.x[1]);
    assert!((result.x[2] / (2.0f64.exp() * xa * xb) - 1.0).abs() < 1e-5);
    assert!((result.x[3] / (1.0f64.exp() * xa * xa) - 1.0).abs() < 1e-5);
    assert!((result.x[4] / (1.0f64.exp() * xb * xb) - 1.0).abs() < 1e-5);

    // Free energy is a finite, negative quantity for a binding system
    assert!(result.free_energy.is_finite());
}

#[test]
fn test_inert_monomer_tracks_target() {
    // c participates only in its own singleton complex; its concentration
    // is pinned to the target by the closed-form multiplier.
    let prob = problem(
        &[
            vec![1, 0, 0, 1],
            vec![0, 1, 0, 1],
            vec![0, 0, 1, 0],
        ],
        vec![0.0, 0.0, 0.3, -1.0],
        vec![1e-6, 2e-6, 5e-7],
    );

    let result = solve(&prob, &SolverSettings::default()).expect("solve failed");

    assert_eq!(result.status, SolveStatus::Converged);
    assert!(
        (result.x[2] - 5e-7).abs() < 5e-7 * 1e-9,
        "inert complex drifted: {}",
        result.x[2]
    );
}

#[test]
fn test_free_energy_of_inert_species() {
    // For a single inert species, F = x0 * G * kT * molarity exactly: the
    // entropy terms of the reference and the solution cancel.
    let prob = problem(&[vec![1]], vec![0.7], vec![1e-4]);

    let result = solve(&prob, &SolverSettings::default()).expect("solve failed");

    assert_eq!(result.status, SolveStatus::Converged);
    let expected = 1e-4 * 0.7 * KT_37C * WATER_MOLARITY;
    assert!(
        (result.free_energy / expected - 1.0).abs() < 1e-4,
        "free energy {} vs expected {}",
        result.free_energy,
        expected
    );
}

#[test]
fn test_deterministic_across_runs() {
    // Same inputs, same seed: bit-identical output, including through the
    // restart path (attempts are deliberately too short to converge).
    let prob = problem(&[vec![1, 2]], vec![0.0, -1.0], vec![1e-5]);
    let settings = SolverSettings {
        max_iters: 2,
        max_trial: 6,
        seed: 777,
        ..Default::default()
    };

    let first = solve(&prob, &settings).expect("solve failed");
    let second = solve(&prob, &settings).expect("solve failed");

    assert_eq!(first.info.trials, second.info.trials);
    assert_eq!(first.x.len(), second.x.len());
    for (a, b) in first.x.iter().zip(&second.x) {
        assert_eq!(a.to_bits(), b.to_bits(), "outputs differ: {} vs {}", a, b);
    }
}

#[test]
fn test_budget_exhaustion_still_populates_x() {
    // With a one-iteration, one-trial budget on a non-trivial system the
    // solver must report non-convergence and still hand back the iterate.
    let prob = problem(
        &[vec![1, 0, 1], vec![0, 1, 1]],
        vec![0.0, 0.0, -5.0],
        vec![1e-6, 1e-6],
    );
    let settings = SolverSettings {
        max_iters: 1,
        max_trial: 1,
        ..Default::default()
    };

    let result = solve(&prob, &settings).expect("solve failed");

    assert_eq!(result.status, SolveStatus::TrialsExhausted);
    assert_eq!(result.status.code(), 0);
    assert_eq!(result.info.trials, 1);
    assert_eq!(result.info.iterations, 1);
    assert!(result.x.iter().all(|&xj| xj.is_finite() && xj >= 0.0));
    assert!(result.free_energy.is_finite());
}

#[test]
fn test_restart_machinery_runs_all_trials() {
    // Attempts capped at two iterations cannot converge from any start, so
    // every trial is consumed and each restart goes through the perturbed
    // guess builder.
    let prob = problem(&[vec![1, 2]], vec![0.0, -1.0], vec![1e-5]);
    let settings = SolverSettings {
        max_iters: 2,
        max_trial: 4,
        seed: 5,
        ..Default::default()
    };

    let result = solve(&prob, &settings).expect("solve failed");

    assert_eq!(result.status, SolveStatus::TrialsExhausted);
    assert_eq!(result.info.trials, 4);
    assert!(result.x.iter().all(|&xj| xj.is_finite()));
}

#[test]
fn test_tight_trust_region_uses_boundary_steps() {
    // A small radius forces boundary steps for most of the trajectory; the
    // solver still converges and the diagnostics show the non-Newton work.
    let prob = problem(
        &[vec![1, 0, 1], vec![0, 1, 1]],
        vec![0.0, 0.2, -4.0],
        vec![1e-6, 3e-6],
    );
    let settings = SolverSettings {
        delta_bar: 0.1,
        ..Default::default()
    };

    let result = solve(&prob, &settings).expect("solve failed");
    println!("steps = {:?}", result.info.steps);

    assert_eq!(result.status, SolveStatus::Converged);
    let boundary = result.info.steps.cauchy
        + result.info.steps.dogleg
        + result.info.steps.chol_fail_boundary_cauchy;
    assert!(boundary >= 1, "expected boundary steps: {:?}", result.info.steps);
    assert!(result.info.steps.newton >= 1, "final steps should be Newton");
}

#[test]
fn test_unrecoverable_overflow_is_reported() {
    // A target mole fraction beyond e^250 pushes the closed-form inert
    // multiplier past the overflow cap before any perturbation could help.
    let prob = problem(&[vec![1]], vec![0.0], vec![1e110]);

    let err = solve(&prob, &SolverSettings::default()).unwrap_err();
    match err {
        ConcError::Overflow { log_x, limit } => {
            assert!(log_x > limit);
        }
        other => panic!("expected overflow, got {:?}", other),
    }
}

#[test]
fn test_invalid_inputs_are_rejected() {
    // Non-positive target mole fraction
    let prob = problem(&[vec![1]], vec![0.0], vec![0.0]);
    assert!(matches!(
        solve(&prob, &SolverSettings::default()),
        Err(ConcError::InvalidProblem(_))
    ));

    // eta outside (0, 1/4)
    let prob = problem(&[vec![1]], vec![0.0], vec![1e-6]);
    let settings = SolverSettings {
        eta: 0.3,
        ..Default::default()
    };
    assert!(matches!(
        solve(&prob, &settings),
        Err(ConcError::InvalidProblem(_))
    ));
}

#[test]
fn test_randomized_systems_respect_mass_balance() {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for trial in 0..10 {
        let g = vec![
            0.0,
            0.0,
            rng.gen_range(-3.0..1.0),
            rng.gen_range(-3.0..1.0),
            rng.gen_range(-3.0..1.0),
        ];
        let x0 = vec![
            rng.gen_range(1e-8..1e-5),
            rng.gen_range(1e-8..1e-5),
        ];
        let prob = problem(
            &[vec![1, 0, 1, 2, 0], vec![0, 1, 1, 0, 2]],
            g,
            x0,
        );

        let result = solve(&prob, &SolverSettings::default()).expect("solve failed");
        assert_eq!(
            result.status,
            SolveStatus::Converged,
            "trial {} did not converge",
            trial
        );
        for i in 0..2 {
            let residual = mass_balance_residual(&prob, &result.x, i);
            assert!(
                residual.abs() <= 1e-7 * prob.x0[i],
                "trial {} monomer {}: residual {}",
                trial,
                i,
                residual
            );
        }
        assert!(result.x.iter().all(|&xj| xj >= 0.0 && xj.is_finite()));
    }
}

//! Equilibrium concentration solver for dilute multi-species systems.
//!
//! Given a catalog of complexes assembled from a fixed set of monomer
//! species, each with a known standard free energy, this library computes
//! the equilibrium mole fraction of every complex subject to mass
//! conservation of each monomer.
//!
//! # Algorithm
//!
//! The primal free-energy minimization is convex; the solver works on its
//! **dual**, driving the mass-balance gradient to zero with a trust-region
//! method (Nocedal & Wright, Numerical Optimization, ch. 4). Key features:
//!
//! - **Dogleg search directions**: Newton steps via dense Cholesky, with
//!   graceful degradation to Cauchy steps when the Hessian loses
//!   definiteness near convergence
//! - **Overflow-guarded exponentials**: every evaluation of the
//!   mole-fraction map checks its exponent against a hard cap
//! - **Restart-on-stall**: failed attempts are retried from randomly
//!   perturbed multipliers with a deterministic, lazily seeded generator
//!
//! # Example
//!
//! ```ignore
//! use conc_core::{solve, ProblemData, SolverSettings, Stoichiometry};
//!
//! // Two strands a, b forming complexes {a, b, ab}
//! let prob = ProblemData {
//!     stoich: Stoichiometry::from_rows(&[vec![1, 0, 1], vec![0, 1, 1]])?,
//!     g: vec![0.0, 0.0, -8.0],
//!     x0: vec![1e-6, 1e-6],
//!     kt: 0.616,
//!     water_molarity: 55.14,
//! };
//!
//! let result = solve(&prob, &SolverSettings::default())?;
//!
//! println!("Status: {}", result.status);
//! println!("x = {:?}", result.x);
//! println!("Free energy: {} kcal/L", result.free_energy);
//! ```

#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // evaluators thread many slices

pub mod error;
pub mod linalg;
pub mod problem;
pub mod solver;
pub mod util;

// Re-export main types
pub use error::{ConcError, ConcResult, OVERFLOW_EXIT_CODE};
pub use problem::{
    ProblemData, SolveInfo, SolveResult, SolveStatus, SolverSettings, Stoichiometry,
};
pub use solver::{StepKind, StepStats};

/// Main solve entry point.
///
/// Computes the equilibrium mole fractions of every complex in `prob` and
/// the total Gibbs free energy of the solution.
pub fn solve(
    prob: &ProblemData,
    settings: &SolverSettings,
) -> ConcResult<SolveResult> {
    solver::solve(prob, settings)
}

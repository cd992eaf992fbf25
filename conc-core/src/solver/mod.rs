//! Trust-region solver for the dual equilibrium problem.
//!
//! Implements the classical trust-region framework with:
//! - dogleg search directions (Newton via dense Cholesky, Cauchy fallback)
//! - overflow-guarded exponential evaluation of the mole fractions
//! - automatic restart from randomly perturbed multipliers on stall

pub mod dogleg;
pub mod eval;
pub mod guess;
pub mod solve;
pub mod workspace;

pub use dogleg::{StepKind, StepStats};
pub use solve::solve;
pub use workspace::SolverWorkspace;

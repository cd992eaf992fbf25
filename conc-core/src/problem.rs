//! Problem data structures and validation.
//!
//! This module defines the canonical equilibrium problem representation
//! and all associated types.

use std::fmt;

use crate::solver::dogleg::StepStats;

/// Overflow cap on the exponent argument of the mole-fraction map.
///
/// Any evaluation producing `log x > MAX_LOG_X` is treated as an overflow:
/// recoverable inside the perturbation and trial-step machinery, fatal
/// anywhere else.
pub const MAX_LOG_X: f64 = 250.0;

/// Safety cap used when building a fresh initial guess.
///
/// The fresh-start multipliers are chosen so that every complex satisfies
/// `log x[j] <= GUESS_MAX_LOG_X` (maximum mole fraction ~3). Keeping the
/// starting objective positive avoids precision trouble near zero.
pub const GUESS_MAX_LOG_X: f64 = 1.0;

/// Precision window for deciding that a step landed on the trust-region
/// boundary (radius growth is only allowed for boundary steps).
pub const NUM_PRECISION: f64 = 1e-12;

/// Stoichiometry matrix of the aggregation system.
///
/// `A` is an m×n non-negative integer matrix: `A[i][j]` is the number of
/// monomers of species `i` contained in complex `j`. Both `A` (row-major)
/// and its transpose (row-major, i.e. one contiguous row per complex) are
/// materialized because the two hot evaluation loops read along different
/// axes: the gradient walks rows of `A`, the exponential map walks rows of
/// `A^T`.
#[derive(Debug, Clone)]
pub struct Stoichiometry {
    /// Number of monomer species (rows of A)
    m: usize,
    /// Number of complexes (columns of A)
    n: usize,
    /// A, row-major, length m*n
    a: Vec<u32>,
    /// A^T, row-major, length n*m
    at: Vec<u32>,
}

impl Stoichiometry {
    /// Build from explicit rows (one per monomer species).
    ///
    /// Returns an error if the rows are empty, ragged, or describe a system
    /// with no complexes.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, String> {
        let m = rows.len();
        if m == 0 {
            return Err("stoichiometry has no monomer rows".to_string());
        }
        let n = rows[0].len();
        if n == 0 {
            return Err("stoichiometry has no complex columns".to_string());
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(format!(
                    "stoichiometry row {} has length {}, expected {}",
                    i,
                    row.len(),
                    n
                ));
            }
        }

        let mut a = Vec::with_capacity(m * n);
        for row in rows {
            a.extend_from_slice(row);
        }
        let mut at = vec![0u32; n * m];
        for i in 0..m {
            for j in 0..n {
                at[j * m + i] = a[i * n + j];
            }
        }

        Ok(Self { m, n, a, at })
    }

    /// Number of monomer species (m).
    pub fn num_species(&self) -> usize {
        self.m
    }

    /// Number of complexes (n).
    pub fn num_complexes(&self) -> usize {
        self.n
    }

    /// Row `i` of A: counts of monomer `i` across all complexes.
    #[inline]
    pub fn row(&self, i: usize) -> &[u32] {
        &self.a[i * self.n..(i + 1) * self.n]
    }

    /// Composition of complex `j` (row `j` of A^T).
    #[inline]
    pub fn column(&self, j: usize) -> &[u32] {
        &self.at[j * self.m..(j + 1) * self.m]
    }

    /// Total appearances of monomer `i` over all complexes.
    pub fn row_sum(&self, i: usize) -> u32 {
        self.row(i).iter().sum()
    }

    /// Total number of monomers in complex `j`.
    pub fn column_sum(&self, j: usize) -> u32 {
        self.column(j).iter().sum()
    }

    /// If monomer `i` is inert (appears in exactly one complex), return the
    /// index of that complex. Its dual multiplier then solves in closed form.
    pub fn single_complex_of(&self, i: usize) -> Option<usize> {
        if self.row_sum(i) != 1 {
            return None;
        }
        self.row(i).iter().position(|&count| count != 0)
    }
}

/// Equilibrium problem in canonical form.
///
/// The solver computes the mole fractions x minimizing total free energy
///
/// ```text
/// minimize    sum_j x[j] * (log x[j] + G[j] - 1)
/// subject to  A x = x0
/// ```
///
/// by maximizing the concave dual
///
/// ```text
/// h(lambda) = -sum_j x(lambda)[j] + lambda^T x0,
/// x(lambda)[j] = exp(-G[j] + A^T[j] . lambda)
/// ```
///
/// # Dimensions
///
/// - `m`: number of monomer species
/// - `n`: number of complexes
/// - A: m × n
/// - g: n (free energies, units of kT)
/// - x0: m (target monomer mole fractions, strictly positive)
#[derive(Debug, Clone)]
pub struct ProblemData {
    /// Stoichiometry matrix A together with its transpose
    pub stoich: Stoichiometry,

    /// Complex free energies in units of kT, ordered like the columns of A
    pub g: Vec<f64>,

    /// Target monomer mole fractions (mass-balance right-hand side)
    pub x0: Vec<f64>,

    /// kT in kcal/mol, used only for the free-energy conversion
    pub kt: f64,

    /// Moles of water per liter of solution, used only for the
    /// free-energy conversion
    pub water_molarity: f64,
}

impl ProblemData {
    /// Number of monomer species (m).
    pub fn num_species(&self) -> usize {
        self.stoich.num_species()
    }

    /// Number of complexes (n).
    pub fn num_complexes(&self) -> usize {
        self.stoich.num_complexes()
    }

    /// Validate problem dimensions and data.
    pub fn validate(&self) -> Result<(), String> {
        let m = self.num_species();
        let n = self.num_complexes();

        if self.g.len() != n {
            return Err(format!("g has length {}, expected {}", self.g.len(), n));
        }
        if self.x0.len() != m {
            return Err(format!("x0 has length {}, expected {}", self.x0.len(), m));
        }

        for (j, &gj) in self.g.iter().enumerate() {
            if !gj.is_finite() {
                return Err(format!("g[{}] is not finite", j));
            }
        }
        for (i, &x0i) in self.x0.iter().enumerate() {
            if !x0i.is_finite() || x0i <= 0.0 {
                return Err(format!(
                    "x0[{}] = {} must be strictly positive and finite",
                    i, x0i
                ));
            }
        }

        if !(self.kt > 0.0) {
            return Err(format!("kT = {} must be positive", self.kt));
        }
        if !(self.water_molarity > 0.0) {
            return Err(format!(
                "water molarity = {} must be positive",
                self.water_molarity
            ));
        }

        // Every complex must contain at least one monomer, and every monomer
        // must appear somewhere; empty rows/columns make the dual unbounded.
        for j in 0..n {
            if self.stoich.column_sum(j) == 0 {
                return Err(format!("complex {} contains no monomers", j));
            }
        }
        for i in 0..m {
            if self.stoich.row_sum(i) == 0 {
                return Err(format!("monomer {} appears in no complex", i));
            }
        }

        // The catalog must carry one unit column per monomer (each species as
        // a complex of itself); the inert closed form and the mass-balance
        // constraints rely on them.
        for i in 0..m {
            let has_unit_column = (0..n).any(|j| {
                self.stoich.column_sum(j) == 1 && self.stoich.row(i)[j] == 1
            });
            if !has_unit_column {
                return Err(format!("monomer {} has no singleton complex column", i));
            }
        }

        Ok(())
    }
}

/// Solver settings and parameters.
///
/// All tuning knobs are explicit; a solve call reads nothing from the
/// environment.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Maximum number of trust-region iterations per attempt
    pub max_iters: usize,

    /// Convergence tolerance, relative to x0: converged when
    /// |grad[i]| <= tol * x0[i] for every i
    pub tol: f64,

    /// Maximum trust-region radius
    pub delta_bar: f64,

    /// Step-acceptance threshold, must lie in (0, 1/4)
    pub eta: f64,

    /// Consecutive rejected steps before the attempt is declared stalled
    pub max_no_step: usize,

    /// Maximum number of initial conditions to try (first attempt included)
    pub max_trial: usize,

    /// Scale of the uniform random perturbation applied to restarted
    /// multipliers; halved internally until the perturbed point is safe
    pub perturb_scale: f64,

    /// Random seed for restart perturbations; 0 derives a seed from the
    /// platform clock
    pub seed: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            tol: 1e-7,
            delta_bar: 1000.0,
            eta: 0.125,
            max_no_step: 50,
            max_trial: 100_000,
            perturb_scale: 100.0,
            seed: 0,
        }
    }
}

impl SolverSettings {
    /// Validate the tuning knobs.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iters == 0 {
            return Err("max_iters must be at least 1".to_string());
        }
        if !(self.tol > 0.0) {
            return Err(format!("tol = {} must be positive", self.tol));
        }
        if !(self.delta_bar > 0.0) {
            return Err(format!("delta_bar = {} must be positive", self.delta_bar));
        }
        if !(self.eta > 0.0 && self.eta < 0.25) {
            return Err(format!("eta = {} must lie in (0, 1/4)", self.eta));
        }
        if self.max_no_step == 0 {
            return Err("max_no_step must be at least 1".to_string());
        }
        if self.max_trial == 0 {
            return Err("max_trial must be at least 1".to_string());
        }
        if !(self.perturb_scale > 0.0) {
            return Err(format!(
                "perturb_scale = {} must be positive",
                self.perturb_scale
            ));
        }
        Ok(())
    }
}

/// Solution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Every gradient entry met the tolerance
    Converged,

    /// All initial conditions were exhausted without convergence
    TrialsExhausted,
}

impl SolveStatus {
    /// Integer return contract used by the surrounding executables:
    /// 1 = converged, 0 = exhausted.
    pub fn code(&self) -> i32 {
        match self {
            SolveStatus::Converged => 1,
            SolveStatus::TrialsExhausted => 0,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Converged => write!(f, "Converged"),
            SolveStatus::TrialsExhausted => write!(f, "TrialsExhausted"),
        }
    }
}

/// Solve result with solution and diagnostics.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Solution status
    pub status: SolveStatus,

    /// Equilibrium mole fractions (length n); populated with the last
    /// iterate even when the solver did not converge
    pub x: Vec<f64>,

    /// Total Gibbs free energy of the solution, kcal per liter
    pub free_energy: f64,

    /// Detailed solve information and diagnostics
    pub info: SolveInfo,
}

/// Detailed solve information and diagnostics.
#[derive(Debug, Clone)]
pub struct SolveInfo {
    /// Total trust-region iterations across all attempts
    pub iterations: usize,

    /// Number of initial conditions tried (1 = fresh start only)
    pub trials: usize,

    /// Search-direction statistics for the final attempt
    pub steps: StepStats,
}

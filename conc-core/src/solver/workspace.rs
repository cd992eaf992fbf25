use nalgebra::DMatrix;

/// Working storage for one solver invocation, allocated once at entry.
///
/// The `new_*` buffers let the ρ evaluation probe λ + p without mutating
/// the current iterate.
#[derive(Debug)]
pub struct SolverWorkspace {
    pub m: usize,
    pub n: usize,

    // Current iterate (species-indexed, length m)
    pub lambda: Vec<f64>,
    pub grad: Vec<f64>,
    pub abs_tol: Vec<f64>,
    pub step: Vec<f64>,

    // Mole fractions at the current λ (length n)
    pub x: Vec<f64>,

    // Hessian of the negated dual objective (m×m, symmetric)
    pub hes: DMatrix<f64>,

    // Trial-step and evaluation scratch (allocation-free hot loop)
    pub new_lambda: Vec<f64>,
    pub new_x: Vec<f64>,
    pub hp: Vec<f64>,
    pub avec: Vec<f64>,
}

impl SolverWorkspace {
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            lambda: vec![0.0; m],
            grad: vec![0.0; m],
            abs_tol: vec![0.0; m],
            step: vec![0.0; m],
            x: vec![0.0; n],
            hes: DMatrix::zeros(m, m),
            new_lambda: vec![0.0; m],
            new_x: vec![0.0; n],
            hp: vec![0.0; m],
            avec: vec![0.0; n],
        }
    }
}

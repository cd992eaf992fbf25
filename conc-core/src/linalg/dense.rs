//! Slice-level vector helpers.

use nalgebra::DMatrix;

/// Dot product of two equally sized slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(ai, bi)| ai * bi).sum()
}

/// Squared Euclidean norm.
#[inline]
pub fn norm_sq(v: &[f64]) -> f64 {
    dot(v, v)
}

/// Euclidean norm.
#[inline]
pub fn norm(v: &[f64]) -> f64 {
    norm_sq(v).sqrt()
}

/// out = M v for a symmetric dense matrix M.
pub fn sym_matvec(mat: &DMatrix<f64>, v: &[f64], out: &mut [f64]) {
    let n = mat.nrows();
    debug_assert_eq!(mat.ncols(), n);
    debug_assert_eq!(v.len(), n);
    debug_assert_eq!(out.len(), n);

    for r in 0..n {
        let mut acc = 0.0;
        for c in 0..n {
            acc += mat[(r, c)] * v[c];
        }
        out[r] = acc;
    }
}

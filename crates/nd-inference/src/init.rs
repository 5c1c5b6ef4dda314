//! Parameter initialisation.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

/// Orthogonal initialisation of a `rows × cols` weight matrix.
///
/// Draws a Gaussian matrix, takes the Q factor of its QR decomposition and fixes
/// the column signs with the signs of R's diagonal. The result has orthonormal
/// columns when `rows >= cols` and orthonormal rows otherwise.
pub fn orthogonal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    if rows == 0 || cols == 0 {
        return DMatrix::zeros(rows, cols);
    }
    let transpose = rows < cols;
    let (r, c) = if transpose { (cols, rows) } else { (rows, cols) };

    let gaussian = DMatrix::from_fn(r, c, |_, _| rng.sample::<f64, _>(StandardNormal));
    let qr = gaussian.qr();
    let mut q = qr.q();
    let diag = qr.r().diagonal();
    for (j, mut col) in q.column_iter_mut().enumerate() {
        if diag[j] < 0.0 {
            col.neg_mut();
        }
    }

    if transpose { q.transpose() } else { q }
}

/// Zero-initialised bias vector.
pub fn zeros(len: usize) -> DVector<f64> {
    DVector::zeros(len)
}

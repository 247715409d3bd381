//! Operations on N×3×3 rotation matrix series
//!
//! Matrices are stored as `Array3<f64>` with the sample index first, so
//! `m.index_axis(Axis(0), i)` is the 3×3 matrix of sample `i`.

use nalgebra::Matrix3;
use ndarray::{Array2, Array3, ArrayView2, Axis};

/// N copies of the identity matrix
pub fn identity_series(n: usize) -> Array3<f64> {
    let mut out = Array3::zeros((n, 3, 3));
    for mut m in out.outer_iter_mut() {
        m.diag_mut().fill(1.0);
    }
    out
}

/// Assemble matrices whose rows are the given N×3 axis series
pub fn from_axes(x: &Array2<f64>, y: &Array2<f64>, z: &Array2<f64>) -> Array3<f64> {
    let mut out = Array3::zeros((x.nrows(), 3, 3));
    for (row, axis) in [x, y, z].into_iter().enumerate() {
        out.index_axis_mut(Axis(1), row).assign(axis);
    }
    out
}

/// Per-sample product `outer[i] · inner[i]`
///
/// Applying the result equals applying `inner` first, then `outer`.
pub fn compose(outer: &Array3<f64>, inner: &Array3<f64>) -> Array3<f64> {
    let mut out = Array3::zeros(outer.raw_dim());
    for ((mut o, a), b) in out
        .outer_iter_mut()
        .zip(outer.outer_iter())
        .zip(inner.outer_iter())
    {
        o.assign(&a.dot(&b));
    }
    out
}

/// Per-sample transpose, the inverse of each rotation
pub fn transpose_series(m: &Array3<f64>) -> Array3<f64> {
    m.view().permuted_axes([0, 2, 1]).as_standard_layout().into_owned()
}

/// Rotate vectors: `out[i] = m[i] · v[i]`
pub fn apply(m: &Array3<f64>, v: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(v.raw_dim());
    for ((mut o, r), x) in out.rows_mut().into_iter().zip(m.outer_iter()).zip(v.rows()) {
        o.assign(&r.dot(&x));
    }
    out
}

/// Copy one 3×3 slice into an nalgebra matrix
pub fn to_matrix3(m: ArrayView2<'_, f64>) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| m[[r, c]])
}

/// Largest elementwise deviation of `R·Rᵀ` from the identity over a series
pub fn max_orthonormal_error(m: &Array3<f64>) -> f64 {
    m.outer_iter()
        .map(|r| {
            let r = to_matrix3(r);
            (r * r.transpose() - Matrix3::identity()).abs().max()
        })
        .fold(0.0, f64::max)
}

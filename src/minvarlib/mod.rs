//! Minimum variance analysis
//!
//! Eigen-decomposition of the covariance of a window of vector samples into
//! an ordered, sign-normalised orthonormal basis. [`minvar`] handles one
//! window; [`window::minvar_matrix_make`] slides a window along a series.
//!
//! References:
//! - Sonnerup & Scheible (1998), "Minimum and maximum variance analysis",
//!   ISSI Scientific Report SR-001, ch. 8

pub mod window;

use std::cmp::Ordering;

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use ndarray::{Array2, ArrayView2};

use crate::errors::{CotransError, Result};

pub use window::{minvar_matrix_make, MinvarWindows, WindowOptions};

/// Iteration cap handed to the symmetric eigensolver
const MAX_EIGEN_ITERATIONS: usize = 1000;

/// Result of a minimum variance analysis of one window
#[derive(Debug, Clone, PartialEq)]
pub struct MinvarResult {
    /// Input samples expressed in the variance basis (max, mid, min)
    pub rotated: Array2<f64>,
    /// Rows are the maximum, intermediate and minimum variance axes
    pub basis: Matrix3<f64>,
    /// Absolute eigenvalues matching the rows of `basis`, non-increasing
    pub eigenvalues: Vector3<f64>,
}

impl MinvarResult {
    pub fn max_axis(&self) -> Vector3<f64> {
        self.basis.row(0).transpose()
    }

    pub fn mid_axis(&self) -> Vector3<f64> {
        self.basis.row(1).transpose()
    }

    pub fn min_axis(&self) -> Vector3<f64> {
        self.basis.row(2).transpose()
    }
}

/// Covariance matrix `M[i,j] = <x_i x_j> - <x_i><x_j>` of an N×3 window
///
/// Non-finite components count as zero in both the means and the second
/// moments.
pub fn covariance(window: ArrayView2<'_, f64>) -> Matrix3<f64> {
    let n = window.nrows() as f64;
    let mut mean = Vector3::zeros();
    let mut second = Matrix3::zeros();
    for row in window.rows() {
        let x = Vector3::from_fn(|i, _| if row[i].is_finite() { row[i] } else { 0.0 });
        mean += x;
        second += x * x.transpose();
    }
    mean /= n;
    second /= n;
    second - mean * mean.transpose()
}

/// Minimum variance analysis of one window of samples
///
/// # Arguments
///
/// * `window` - N×3 array of vector samples, already selected by the caller
///
/// # Returns
///
/// The samples rotated into the variance basis, the basis itself (rows =
/// maximum, intermediate, minimum variance axes) and the matching absolute
/// eigenvalues. The basis is right-handed, the minimum axis has a
/// non-negative third component, and so does the intermediate axis.
///
/// Fails with [`CotransError::LinearAlgebra`] for an empty window, a
/// non-finite covariance or an eigensolver that does not converge.
pub fn minvar(window: ArrayView2<'_, f64>) -> Result<MinvarResult> {
    if window.ncols() != 3 {
        return Err(CotransError::LinearAlgebra(format!(
            "window must have 3 columns, found {}",
            window.ncols()
        )));
    }
    if window.nrows() == 0 {
        return Err(CotransError::LinearAlgebra("empty window".to_string()));
    }

    let m = covariance(window);
    if m.iter().any(|v| !v.is_finite()) {
        return Err(CotransError::LinearAlgebra(
            "covariance matrix is not finite".to_string(),
        ));
    }

    let eigen = SymmetricEigen::try_new(m, f64::EPSILON, MAX_EIGEN_ITERATIONS).ok_or_else(|| {
        CotransError::LinearAlgebra("symmetric eigensolver did not converge".to_string())
    })?;

    let magnitudes = eigen.eigenvalues.map(f64::abs);
    let order = if magnitudes.sum() == 0.0 {
        // an all-zero covariance has no meaningful ordering
        [0, 2, 1]
    } else {
        let mut order = [0, 1, 2];
        order.sort_by(|&a, &b| {
            magnitudes[b]
                .partial_cmp(&magnitudes[a])
                .unwrap_or(Ordering::Equal)
        });
        order
    };

    let mut max = eigen.eigenvectors.column(order[0]).into_owned();
    let mut mid = eigen.eigenvectors.column(order[1]).into_owned();
    let mut min = eigen.eigenvectors.column(order[2]).into_owned();

    if max.cross(&mid).dot(&min) < 0.0 {
        mid = -mid;
    }
    if min[2] < 0.0 {
        min = -min;
        mid = -mid;
    }
    if mid[2] < 0.0 {
        mid = -mid;
        max = -max;
    }

    let basis = Matrix3::from_rows(&[max.transpose(), mid.transpose(), min.transpose()]);
    let eigenvalues = Vector3::new(magnitudes[order[0]], magnitudes[order[1]], magnitudes[order[2]]);

    let mut rotated = Array2::zeros(window.raw_dim());
    for (mut out, row) in rotated.rows_mut().into_iter().zip(window.rows()) {
        let v = basis * Vector3::new(row[0], row[1], row[2]);
        out[0] = v[0];
        out[1] = v[1];
        out[2] = v[2];
    }

    Ok(MinvarResult {
        rotated,
        basis,
        eigenvalues,
    })
}

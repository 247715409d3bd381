//! Precession from the J2000 mean equator to the mean equator of date
//!
//! Implements the Capitaine et al. (2003) 4-angle precession formulation.
//! Reference: Astronomy and Astrophysics 412, 567-586.
//!
//! The GEI frame of the geophysical chain is the mean equator and equinox
//! of date, so the J2000 → GEI edge is this matrix alone.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use ndarray::{Array1, Array3};

use crate::constants::{ASEC2RAD, J2000, JULIAN_CENTURY};
use crate::time::tt_julian_date;

/// Mean obliquity at J2000.0 in arcseconds
const EPS0: f64 = 84381.406;

/// Rotation of the coordinate axes about one axis by `angle` radians
fn axes_rotation(axis: Unit<Vector3<f64>>, angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&axis, -angle).into_inner()
}

/// Precession rotation matrix for a Julian date on the TT scale
///
/// The angle polynomials are in TT centuries. Callers holding UTC
/// timestamps convert with [`tt_julian_date`] first, as
/// [`precession_series`] does.
///
/// Composed as P = R3(chi_a) · R1(-omega_a) · R3(-psi_a) · R1(eps_0), so
/// that `P · v_j2000` gives the vector in mean-of-date axes.
pub fn compute_precession(jd_tt: f64) -> Matrix3<f64> {
    let t = (jd_tt - J2000) / JULIAN_CENTURY;

    // Precession angles, arcseconds
    let psi_a = ((((-0.0000000951 * t + 0.000132851) * t - 0.00114045) * t - 1.0790069) * t
        + 5038.481507)
        * t;

    let omega_a =
        ((((0.0000003337 * t - 0.000000467) * t - 0.00772503) * t + 0.0512623) * t - 0.025754) * t
            + EPS0;

    let chi_a = ((((-0.0000000560 * t + 0.000170663) * t - 0.00121197) * t - 2.3814292) * t
        + 10.556403)
        * t;

    axes_rotation(Vector3::z_axis(), chi_a * ASEC2RAD)
        * axes_rotation(Vector3::x_axis(), -omega_a * ASEC2RAD)
        * axes_rotation(Vector3::z_axis(), -psi_a * ASEC2RAD)
        * axes_rotation(Vector3::x_axis(), EPS0 * ASEC2RAD)
}

/// J2000 → mean-of-date matrices for Unix times (UTC)
///
/// Each time is shifted onto TT before the angles are evaluated.
pub fn precession_series(times: &Array1<f64>) -> Array3<f64> {
    let mut out = Array3::zeros((times.len(), 3, 3));
    for (mut m, &t) in out.outer_iter_mut().zip(times) {
        let p = compute_precession(tt_julian_date(t));
        for r in 0..3 {
            for c in 0..3 {
                m[[r, c]] = p[(r, c)];
            }
        }
    }
    out
}

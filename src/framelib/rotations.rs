//! Elementary frame rotations
//!
//! One provider per edge of the frame tree, each evaluated directly at the
//! requested times. Matrices rotate vector components from the edge's
//! source frame into its destination frame. Angle conventions follow
//! Hapgood (1992), Planet. Space Sci. 40, 711-717.

use std::sync::Arc;

use ndarray::{Array1, Array2, Array3, Zip};

use crate::igrflib::DipoleModel;
use crate::precessionlib::precession_series;
use crate::series::rotation::{apply, from_axes, transpose_series};
use crate::series::{cross_rows, normalize_rows};
use crate::sunlib::{sidereal_angle, SolarAngles};

/// Rotation matrices for one frame-pair edge as a function of time
pub trait RotationProvider: Send + Sync {
    /// One orthonormal matrix per Unix time, shape (N, 3, 3)
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64>;
}

impl<F> RotationProvider for F
where
    F: Fn(&Array1<f64>) -> Array3<f64> + Send + Sync,
{
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        self(times)
    }
}

/// Rotation of the axes about coordinate axis `axis` (0 = x, 1 = y, 2 = z)
///
/// For `axis = 2` each matrix is `[[c, s, 0], [-s, c, 0], [0, 0, 1]]`.
pub fn axis_rotation(axis: usize, angles: &Array1<f64>) -> Array3<f64> {
    let i = (axis + 1) % 3;
    let j = (axis + 2) % 3;
    let mut out = Array3::zeros((angles.len(), 3, 3));
    for (mut m, &angle) in out.outer_iter_mut().zip(angles) {
        let (s, c) = angle.sin_cos();
        m[[axis, axis]] = 1.0;
        m[[i, i]] = c;
        m[[i, j]] = s;
        m[[j, i]] = -s;
        m[[j, j]] = c;
    }
    out
}

/// GEI → GEO: rotation about Z by the Greenwich mean sidereal angle
#[derive(Debug, Clone, Copy, Default)]
pub struct GeiToGeo;

impl RotationProvider for GeiToGeo {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        axis_rotation(2, &sidereal_angle(times))
    }
}

/// GEI → GSE: X towards the Sun, Z along the ecliptic north pole
#[derive(Debug, Clone, Copy, Default)]
pub struct GeiToGse;

impl RotationProvider for GeiToGse {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        let angles = SolarAngles::at(times);
        let x = angles.sun_direction();
        let z = angles.ecliptic_pole();
        let y = cross_rows(&z, &x);
        from_axes(&x, &y, &z)
    }
}

/// J2000 → GEI: precession to the mean equator and equinox of date
#[derive(Debug, Clone, Copy, Default)]
pub struct J2000ToGei;

impl RotationProvider for J2000ToGei {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        precession_series(times)
    }
}

/// GEO → MAG: Z along the dipole axis, Y perpendicular to the geographic pole
#[derive(Debug, Clone)]
pub struct GeoToMag {
    model: Arc<dyn DipoleModel>,
}

impl GeoToMag {
    pub fn new(model: Arc<dyn DipoleModel>) -> Self {
        GeoToMag { model }
    }
}

impl RotationProvider for GeoToMag {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        let z = self.model.dipole_axis(times);
        let mut pole = Array2::zeros(z.raw_dim());
        pole.column_mut(2).fill(1.0);
        let y = normalize_rows(&cross_rows(&pole, &z));
        let x = cross_rows(&y, &z);
        from_axes(&x, &y, &z)
    }
}

/// GSE → GSM: rotation about X that brings the dipole into the X-Z plane
#[derive(Debug, Clone)]
pub struct GseToGsm {
    model: Arc<dyn DipoleModel>,
}

impl GseToGsm {
    pub fn new(model: Arc<dyn DipoleModel>) -> Self {
        GseToGsm { model }
    }
}

impl RotationProvider for GseToGsm {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        let d = dipole_in_gse(self.model.as_ref(), times);
        let psi = Zip::from(d.column(1))
            .and(d.column(2))
            .map_collect(|&dy, &dz| dy.atan2(dz));
        axis_rotation(0, &psi.mapv(|p| -p))
    }
}

/// GSM → SM: rotation about Y by the dipole tilt angle
#[derive(Debug, Clone)]
pub struct GsmToSm {
    model: Arc<dyn DipoleModel>,
}

impl GsmToSm {
    pub fn new(model: Arc<dyn DipoleModel>) -> Self {
        GsmToSm { model }
    }
}

impl RotationProvider for GsmToSm {
    fn matrices(&self, times: &Array1<f64>) -> Array3<f64> {
        let d = dipole_in_gse(self.model.as_ref(), times);
        axis_rotation(1, &dipole_tilt_from_gse(&d))
    }
}

/// Dipole axis expressed in GSE, one row per time
pub fn dipole_in_gse(model: &dyn DipoleModel, times: &Array1<f64>) -> Array2<f64> {
    let d_geo = model.dipole_axis(times);
    let d_gei = apply(&transpose_series(&GeiToGeo.matrices(times)), &d_geo);
    apply(&GeiToGse.matrices(times), &d_gei)
}

/// Dipole tilt angle μ in radians, positive when the northern dipole axis
/// leans towards the Sun
pub fn dipole_tilt(model: &dyn DipoleModel, times: &Array1<f64>) -> Array1<f64> {
    dipole_tilt_from_gse(&dipole_in_gse(model, times))
}

fn dipole_tilt_from_gse(d: &Array2<f64>) -> Array1<f64> {
    let mut mu = Array1::zeros(d.nrows());
    for (m, row) in mu.iter_mut().zip(d.rows()) {
        *m = row[0].atan2(row[1].hypot(row[2]));
    }
    mu
}

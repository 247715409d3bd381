//! Geomagnetic dipole axis from the IGRF degree-1 Gauss coefficients
//!
//! The MAG, GSM and SM frames are defined by the axis of Earth's centred
//! dipole. Its direction in GEO follows from the first three IGRF
//! coefficients g(1,0), g(1,1), h(1,1):
//!
//! ```text
//! d = (-g11, -h11, -g10) / sqrt(g10² + g11² + h11²)
//! ```
//!
//! Coefficients are linearly interpolated between the five-year model
//! epochs, extrapolated with the secular variation for up to five years
//! past the last epoch, and held constant outside that range.

use ndarray::{Array1, Array2};

use crate::time::dipole_epoch;

/// IGRF-14 degree-1 coefficients in nT
#[rustfmt::skip]
const COEFFICIENTS: [DipoleCoefficients; 13] = [
    DipoleCoefficients { epoch: 1965.0, g10: -30334.00, g11: -2119.00, h11: 5776.00 },
    DipoleCoefficients { epoch: 1970.0, g10: -30220.00, g11: -2068.00, h11: 5737.00 },
    DipoleCoefficients { epoch: 1975.0, g10: -30100.00, g11: -2013.00, h11: 5675.00 },
    DipoleCoefficients { epoch: 1980.0, g10: -29992.00, g11: -1956.00, h11: 5604.00 },
    DipoleCoefficients { epoch: 1985.0, g10: -29873.00, g11: -1905.00, h11: 5500.00 },
    DipoleCoefficients { epoch: 1990.0, g10: -29775.00, g11: -1848.00, h11: 5406.00 },
    DipoleCoefficients { epoch: 1995.0, g10: -29692.00, g11: -1784.00, h11: 5306.00 },
    DipoleCoefficients { epoch: 2000.0, g10: -29619.40, g11: -1728.20, h11: 5186.10 },
    DipoleCoefficients { epoch: 2005.0, g10: -29554.63, g11: -1669.05, h11: 5077.99 },
    DipoleCoefficients { epoch: 2010.0, g10: -29496.57, g11: -1586.42, h11: 4944.26 },
    DipoleCoefficients { epoch: 2015.0, g10: -29441.46, g11: -1501.77, h11: 4795.99 },
    DipoleCoefficients { epoch: 2020.0, g10: -29403.41, g11: -1451.37, h11: 4653.35 },
    DipoleCoefficients { epoch: 2025.0, g10: -29350.00, g11: -1410.30, h11: 4545.50 },
];

/// Secular variation after the last epoch in nT/year: (g10, g11, h11)
const IGRF_SECULAR: (f64, f64, f64) = (12.6, 10.0, -21.5);

/// Years past the last epoch the secular variation is trusted for
const SECULAR_SPAN: f64 = 5.0;

/// Degree-1 Gauss coefficients at one epoch, in nT
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleCoefficients {
    pub epoch: f64,
    pub g10: f64,
    pub g11: f64,
    pub h11: f64,
}

impl DipoleCoefficients {
    /// Coefficients for a decimal year
    pub fn at_year(year: f64) -> Self {
        let table = &COEFFICIENTS;
        let first = table[0];
        let last = table[table.len() - 1];

        if year <= first.epoch {
            return DipoleCoefficients { epoch: year, ..first };
        }
        if year >= last.epoch {
            let dt = (year - last.epoch).min(SECULAR_SPAN);
            let (sg10, sg11, sh11) = IGRF_SECULAR;
            return DipoleCoefficients {
                epoch: year,
                g10: last.g10 + sg10 * dt,
                g11: last.g11 + sg11 * dt,
                h11: last.h11 + sh11 * dt,
            };
        }

        let i = table.partition_point(|c| c.epoch <= year) - 1;
        let (a, b) = (table[i], table[i + 1]);
        let f = (year - a.epoch) / (b.epoch - a.epoch);
        DipoleCoefficients {
            epoch: year,
            g10: a.g10 + f * (b.g10 - a.g10),
            g11: a.g11 + f * (b.g11 - a.g11),
            h11: a.h11 + f * (b.h11 - a.h11),
        }
    }

    /// Unit vector along the dipole axis in GEO
    ///
    /// Points to the northern geomagnetic pole (the pole the field lines
    /// enter), so its third component is positive.
    pub fn axis(&self) -> [f64; 3] {
        let norm = (self.g10 * self.g10 + self.g11 * self.g11 + self.h11 * self.h11).sqrt();
        [-self.g11 / norm, -self.h11 / norm, -self.g10 / norm]
    }

    /// Geographic (latitude, longitude) of the northern geomagnetic pole in degrees
    pub fn pole(&self) -> (f64, f64) {
        let [x, y, z] = self.axis();
        (z.asin().to_degrees(), y.atan2(x).to_degrees())
    }
}

/// Source of the dipole axis direction as a function of time
pub trait DipoleModel: Send + Sync + std::fmt::Debug {
    /// Unit dipole axis in GEO, one row per Unix time
    fn dipole_axis(&self, times: &Array1<f64>) -> Array2<f64>;
}

/// IGRF dipole evaluated at the epoch of each sample's UTC day
#[derive(Debug, Clone, Copy, Default)]
pub struct Igrf;

impl DipoleModel for Igrf {
    fn dipole_axis(&self, times: &Array1<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((times.len(), 3));
        for (mut row, &t) in out.rows_mut().into_iter().zip(times) {
            let [x, y, z] = DipoleCoefficients::at_year(dipole_epoch(t)).axis();
            row[0] = x;
            row[1] = y;
            row[2] = z;
        }
        out
    }
}

/// IGRF dipole frozen at one decimal year for every sample
///
/// Gives reproducible reference values independent of the sample epochs.
#[derive(Debug, Clone, Copy)]
pub struct FixedEpoch {
    pub year: f64,
}

impl FixedEpoch {
    pub fn new(year: f64) -> Self {
        FixedEpoch { year }
    }
}

impl DipoleModel for FixedEpoch {
    fn dipole_axis(&self, times: &Array1<f64>) -> Array2<f64> {
        let axis = DipoleCoefficients::at_year(self.year).axis();
        let mut out = Array2::zeros((times.len(), 3));
        for mut row in out.rows_mut() {
            row[0] = axis[0];
            row[1] = axis[1];
            row[2] = axis[2];
        }
        out
    }
}

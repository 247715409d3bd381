//! Low-precision solar ephemeris and mean sidereal time
//!
//! Implements the `SUN` routine of the GEOPACK library (Russell 1971,
//! Cosmic Electrodynamics 2, 184), which the geophysical frames GSE, GSM and
//! SM are conventionally defined with. Accuracy is about 0.006 degrees for
//! 1901-2099, well beyond what the frame definitions need.
//!
//! All functions work on whole time arrays (Unix seconds) at once.

use ndarray::{Array1, Array2, Zip};
use std::f64::consts::{PI, TAU};

use crate::constants::{DEG2RAD, JD_1900, JULIAN_CENTURY};
use crate::time::{day_fraction, julian_date};

/// Aberration correction applied to the solar longitude (radians)
const ABERRATION: f64 = 9.924e-5;

/// Greenwich mean sidereal angle in radians at the given Unix times
pub fn sidereal_angle(times: &Array1<f64>) -> Array1<f64> {
    times.mapv(|t| {
        let dj = julian_date(t) - JD_1900;
        let fday = day_fraction(t);
        (279.690983 + 0.9856473354 * dj + 360.0 * fday + 180.0).rem_euclid(360.0) * DEG2RAD
    })
}

/// Solar angles for a series of times, all in radians
#[derive(Debug, Clone)]
pub struct SolarAngles {
    /// Greenwich mean sidereal time
    pub gst: Array1<f64>,
    /// Ecliptic longitude of the Sun
    pub longitude: Array1<f64>,
    /// Right ascension of the Sun (mean equinox of date)
    pub right_ascension: Array1<f64>,
    /// Declination of the Sun
    pub declination: Array1<f64>,
    /// Mean obliquity of the ecliptic
    pub obliquity: Array1<f64>,
}

impl SolarAngles {
    /// Compute the solar angles at the given Unix times
    pub fn at(times: &Array1<f64>) -> Self {
        // Days since 1900 January 0.5 and Julian centuries since then
        let dj = times.mapv(|t| julian_date(t) - JD_1900);
        let centuries = dj.mapv(|d| d / JULIAN_CENTURY);

        let gst = sidereal_angle(times);

        let mean_longitude = dj.mapv(|d| (279.696678 + 0.9856473354 * d).rem_euclid(360.0));
        let mean_anomaly = dj.mapv(|d| (358.475845 + 0.985600267 * d).rem_euclid(360.0) * DEG2RAD);

        let longitude = Zip::from(&mean_longitude)
            .and(&centuries)
            .and(&mean_anomaly)
            .map_collect(|&vl, &t, &g| {
                let slong = vl + (1.91946 - 0.004789 * t) * g.sin() + 0.020094 * (2.0 * g).sin();
                (slong * DEG2RAD).rem_euclid(TAU)
            });

        let obliquity = centuries.mapv(|t| (23.45229 - 0.0130125 * t) * DEG2RAD);

        let mut declination = Array1::zeros(times.len());
        let mut right_ascension = Array1::zeros(times.len());
        Zip::from(&mut declination)
            .and(&mut right_ascension)
            .and(&longitude)
            .and(&obliquity)
            .for_each(|dec, ra, &slong, &obliq| {
                let slp = slong - ABERRATION;
                let sob = obliq.sin();
                let sind = sob * slp.sin();
                let cosd = (1.0 - sind * sind).sqrt();
                *dec = (sind / cosd).atan();
                *ra = PI - (obliq.cos() / sob * sind / cosd).atan2(-slp.cos() / cosd);
            });

        SolarAngles {
            gst,
            longitude,
            right_ascension,
            declination,
            obliquity,
        }
    }

    pub fn len(&self) -> usize {
        self.gst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gst.is_empty()
    }

    /// Unit vector towards the Sun in GEI, one row per time
    pub fn sun_direction(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), 3));
        for ((mut row, &ra), &dec) in out
            .rows_mut()
            .into_iter()
            .zip(&self.right_ascension)
            .zip(&self.declination)
        {
            let (sra, cra) = ra.sin_cos();
            let (sdec, cdec) = dec.sin_cos();
            row[0] = cra * cdec;
            row[1] = sra * cdec;
            row[2] = sdec;
        }
        out
    }

    /// Unit vector along the ecliptic north pole in GEI, one row per time
    pub fn ecliptic_pole(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), 3));
        for (mut row, &obliq) in out.rows_mut().into_iter().zip(&self.obliquity) {
            let (s, c) = obliq.sin_cos();
            row[1] = -s;
            row[2] = c;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_time;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn angles_at(text: &str) -> SolarAngles {
        SolarAngles::at(&array![parse_time(text).unwrap()])
    }

    #[test]
    fn test_gst_at_j2000() {
        // GMST at 2000-01-01 12:00 UT1 is 280.4606 degrees
        let angles = angles_at("2000-01-01 12:00:00");
        assert_relative_eq!(angles.gst[0].to_degrees(), 280.4606, epsilon = 0.01);
    }

    #[test]
    fn test_sun_position_at_j2000() {
        // Apparent Sun: RA 18h45m (281.28 deg), Dec -23.04 deg
        let angles = angles_at("2000-01-01 12:00:00");
        assert_relative_eq!(angles.right_ascension[0].to_degrees(), 281.28, epsilon = 0.05);
        assert_relative_eq!(angles.declination[0].to_degrees(), -23.04, epsilon = 0.05);
        assert_relative_eq!(angles.obliquity[0].to_degrees(), 23.439, epsilon = 0.01);
    }

    #[test]
    fn test_declination_zero_at_equinox() {
        // March equinox 2020-03-20 03:50 UTC
        let angles = angles_at("2020-03-20 03:50:00");
        assert_relative_eq!(angles.declination[0].to_degrees(), 0.0, epsilon = 0.02);
        // longitude sits next to the 0/2π wrap, compare through its sine
        assert_relative_eq!(angles.longitude[0].sin(), 0.0, epsilon = 5e-4);
    }

    #[test]
    fn test_sun_direction_lies_in_ecliptic() {
        let times = Array1::linspace(0.0, 1.6e9, 50);
        let angles = SolarAngles::at(&times);
        let sun = angles.sun_direction();
        let pole = angles.ecliptic_pole();
        for (s, p) in sun.rows().into_iter().zip(pole.rows()) {
            assert_relative_eq!(s.dot(&s), 1.0, epsilon = 1e-14);
            assert_relative_eq!(s.dot(&p), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_gst_advances_one_sidereal_day() {
        let t0 = parse_time("2015-06-01").unwrap();
        let sidereal_day = 86164.0905;
        let angles = SolarAngles::at(&array![t0, t0 + sidereal_day]);
        let diff = (angles.gst[1] - angles.gst[0]).rem_euclid(TAU);
        let diff = if diff > PI { diff - TAU } else { diff };
        assert_relative_eq!(diff, 0.0, epsilon = 1e-5);
    }
}

//! Time conversion between calendar representations and Unix seconds
//!
//! Every series in the crate is stamped in floating-point seconds since
//! 1970-01-01 00:00 UTC. The angle formulas need Julian dates, Julian
//! centuries and decimal years, which are derived here.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use ndarray::Array1;

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY, TT_MINUS_UTC, UNIX_EPOCH_JD};
use crate::errors::{CotransError, Result};

/// Calendar layouts accepted by [`parse_time`] besides RFC 3339
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d/%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// UTC Julian date for Unix seconds
pub fn julian_date(unix_s: f64) -> f64 {
    unix_s / DAY_S + UNIX_EPOCH_JD
}

/// Unix seconds for a UTC Julian date
pub fn unix_seconds(jd: f64) -> f64 {
    (jd - UNIX_EPOCH_JD) * DAY_S
}

/// Approximate TT Julian date for Unix seconds
///
/// Uses a fixed TT - UTC offset; sub-second clock models are not needed for
/// precession, which changes by ~0.14 mas per second.
pub fn tt_julian_date(unix_s: f64) -> f64 {
    julian_date(unix_s + TT_MINUS_UTC)
}

/// Fraction of the UTC day elapsed at the given time, in [0, 1)
pub fn day_fraction(unix_s: f64) -> f64 {
    unix_s.rem_euclid(DAY_S) / DAY_S
}

/// Julian centuries since J2000.0 for a Julian date
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000) / JULIAN_CENTURY
}

/// Calendar year plus the elapsed fraction of that year
///
/// Times chrono cannot represent fall back to a Julian-year estimate.
pub fn decimal_year(unix_s: f64) -> f64 {
    let Some(dt) = to_datetime(unix_s) else {
        return 1970.0 + unix_s / (DAY_S * crate::constants::JULIAN_YEAR);
    };
    let year = dt.year();
    let start = year_start(year);
    let end = year_start(year + 1);
    match (start, end) {
        (Some(start), Some(end)) => year as f64 + (unix_s - start) / (end - start),
        _ => 1970.0 + unix_s / (DAY_S * crate::constants::JULIAN_YEAR),
    }
}

/// Model epoch for the dipole coefficients: year plus whole days elapsed
///
/// Resolves to the start of the UTC day and counts a year as 365.25 days,
/// the epoch convention of the GEOPACK dipole recalculation.
pub fn dipole_epoch(unix_s: f64) -> f64 {
    match to_datetime(unix_s) {
        Some(dt) => dt.year() as f64 + f64::from(dt.ordinal0()) / crate::constants::JULIAN_YEAR,
        None => decimal_year(unix_s),
    }
}

fn year_start(year: i32) -> Option<f64> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp() as f64)
}

/// Convert Unix seconds to a chrono UTC timestamp
pub fn to_datetime(unix_s: f64) -> Option<DateTime<Utc>> {
    if !unix_s.is_finite() {
        return None;
    }
    let secs = unix_s.floor();
    let nanos = ((unix_s - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}

/// Convert a chrono UTC timestamp to Unix seconds
pub fn from_datetime(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 * 1e-9
}

/// Parse a UTC calendar string into Unix seconds
///
/// Accepts RFC 3339 (`2017-03-23T12:00:00Z`), `YYYY-MM-DD HH:MM:SS[.fff]`
/// with a space, `T` or `/` separator, `YYYY-MM-DD HH:MM` and a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_time(text: &str) -> Result<f64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(from_datetime(&dt.with_timezone(&Utc)));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(from_datetime(&naive.and_utc()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| from_datetime(&naive.and_utc()))
        .ok_or_else(|| CotransError::InvalidTime(text.to_string()))
}

/// Parse several calendar strings into a time array
pub fn parse_times<S: AsRef<str>>(texts: &[S]) -> Result<Array1<f64>> {
    texts
        .iter()
        .map(|t| parse_time(t.as_ref()))
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_julian_date_at_j2000() {
        let t = parse_time("2000-01-01 12:00:00").unwrap();
        assert_eq!(t, 946_728_000.0);
        assert_relative_eq!(julian_date(t), J2000, epsilon = 1e-9);
        assert_relative_eq!(unix_seconds(J2000), t, epsilon = 1e-5);
    }

    #[test]
    fn test_parse_formats_agree() {
        let a = parse_time("2017-03-23T12:30:15Z").unwrap();
        let b = parse_time("2017-03-23 12:30:15").unwrap();
        let c = parse_time("2017-03-23/12:30:15.000").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        let midnight = parse_time("2017-03-23").unwrap();
        assert_eq!(a - midnight, 12.0 * 3600.0 + 30.0 * 60.0 + 15.0);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let t = parse_time("2015-10-16 13:07:02.250").unwrap();
        assert_relative_eq!(t.fract(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            parse_time("yesterday"),
            Err(CotransError::InvalidTime("yesterday".to_string()))
        );
    }

    #[test]
    fn test_day_fraction() {
        let t = parse_time("2020-06-01 18:00:00").unwrap();
        assert_relative_eq!(day_fraction(t), 0.75, epsilon = 1e-12);
        assert_relative_eq!(day_fraction(-DAY_S / 4.0), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_decimal_year() {
        let t = parse_time("2020-01-01").unwrap();
        assert_relative_eq!(decimal_year(t), 2020.0, epsilon = 1e-12);
        // 2020 is a leap year: July 2 00:00 is day 183 of 366
        let t = parse_time("2020-07-02").unwrap();
        assert_relative_eq!(decimal_year(t), 2020.0 + 183.0 / 366.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dipole_epoch_counts_whole_days() {
        let t = parse_time("2019-12-25 21:20:00").unwrap();
        assert_relative_eq!(dipole_epoch(t), 2019.0 + 358.0 / 365.25, epsilon = 1e-12);
        let midnight = parse_time("2019-12-25").unwrap();
        assert_eq!(dipole_epoch(t), dipole_epoch(midnight));
        assert_eq!(dipole_epoch(parse_time("2021-01-01 06:00").unwrap()), 2021.0);
    }

    #[test]
    fn test_datetime_roundtrip() {
        let t = 1_577_836_800.5;
        let dt = to_datetime(t).unwrap();
        assert_relative_eq!(from_datetime(&dt), t, epsilon = 1e-6);
        assert!(to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_centuries() {
        assert_eq!(centuries_since_j2000(J2000), 0.0);
        assert_relative_eq!(
            centuries_since_j2000(J2000 + JULIAN_CENTURY),
            1.0,
            epsilon = 1e-15
        );
    }
}

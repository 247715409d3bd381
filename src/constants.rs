//! Astronomical and calendar constants shared across the crate

/// Julian date of the J2000.0 epoch (2000-01-01 12:00 TT)
pub const J2000: f64 = 2451545.0;

/// Julian date of the Unix epoch (1970-01-01 00:00 UTC)
pub const UNIX_EPOCH_JD: f64 = 2440587.5;

/// Julian date of 1900 January 0.5, the origin of the GEOPACK day count
pub const JD_1900: f64 = 2415020.0;

/// Seconds per day
pub const DAY_S: f64 = 86400.0;

/// Days per Julian century
pub const JULIAN_CENTURY: f64 = 36525.0;

/// Days per Julian year
pub const JULIAN_YEAR: f64 = 365.25;

/// Arcseconds to radians
pub const ASEC2RAD: f64 = 4.848136811095359935899141e-6;

/// Degrees to radians
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// TT - UTC in seconds used for precession epochs (32.184 s + 37 leap seconds)
pub const TT_MINUS_UTC: f64 = 69.184;

/// Tolerance on |R·Rᵀ - I| for every rotation matrix the crate produces
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-9;

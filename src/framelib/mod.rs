//! Geophysical reference frames and the rotations between them
//!
//! The supported frames form a tree of elementary edges:
//!
//! ```text
//! J2000 ── GEI ── GEO ── MAG
//!           │
//!          GSE ── GSM ── SM
//! ```
//!
//! Each edge is a [`RotationProvider`], a pure function of time returning
//! one rotation matrix per sample. [`FrameGraph`] keeps the edge registry
//! and resolves a request into the ordered list of hops.

pub mod graph;
pub mod rotations;

use std::fmt;
use std::str::FromStr;

use crate::errors::{CotransError, Result};

pub use graph::{FrameGraph, Hop};
pub use rotations::RotationProvider;

/// A supported coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoordinateFrame {
    /// Geocentric Equatorial Inertial (mean equator and equinox of date)
    Gei,
    /// Geographic, rotating with the Earth
    Geo,
    /// Geomagnetic, z along the dipole axis
    Mag,
    /// Geocentric Solar Ecliptic
    Gse,
    /// Geocentric Solar Magnetospheric
    Gsm,
    /// Solar Magnetic
    Sm,
    /// Mean equator and equinox of J2000.0
    J2000,
}

impl CoordinateFrame {
    pub const ALL: [CoordinateFrame; 7] = [
        CoordinateFrame::Gei,
        CoordinateFrame::Geo,
        CoordinateFrame::Mag,
        CoordinateFrame::Gse,
        CoordinateFrame::Gsm,
        CoordinateFrame::Sm,
        CoordinateFrame::J2000,
    ];

    /// Lower-case name, as stored in frame tags
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateFrame::Gei => "gei",
            CoordinateFrame::Geo => "geo",
            CoordinateFrame::Mag => "mag",
            CoordinateFrame::Gse => "gse",
            CoordinateFrame::Gsm => "gsm",
            CoordinateFrame::Sm => "sm",
            CoordinateFrame::J2000 => "j2000",
        }
    }

    /// Parse a frame name, reporting `argument` as the offending input
    pub fn parse_arg(value: &str, argument: &'static str) -> Result<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CotransError::UnsupportedFrame {
                argument,
                value: value.to_string(),
            })
    }
}

impl fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordinateFrame {
    type Err = CotransError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_arg(s, "frame")
    }
}

//! Rotations between geophysical reference frames and local vector bases
//!
//! The crate transforms three-component vector time series (magnetic field,
//! position, velocity) between GEI, GEO, MAG, GSE, GSM, SM and J2000, and
//! builds per-sample orthonormal bases from that data:
//!
//! - [`cotrans`]: validates a request, resolves the frame path and applies
//!   the composed time-dependent rotation
//! - [`framelib`]: the frame set, the elementary edge providers and the
//!   path resolver
//! - [`minvarlib`]: minimum variance analysis of one window and of a
//!   sliding window over a series
//! - [`faclib`]: field-aligned coordinate systems
//! - [`store`]: a named-variable store and thin wrappers that read and
//!   write series by name
//!
//! # Example
//!
//! ```ignore
//! use cotrans::cotrans::Cotrans;
//! use cotrans::series::Vector3Series;
//!
//! let b_gse = Vector3Series::new("b_gse", times, values)?.with_frame("gse");
//! let b_gsm = Cotrans::default().transform(&b_gse, None, Some("gsm"))?;
//! ```

pub mod constants;
pub mod cotrans;
pub mod errors;
pub mod faclib;
pub mod framelib;
pub mod igrflib;
pub mod minvarlib;
pub mod precessionlib;
pub mod series;
pub mod store;
pub mod sunlib;
pub mod time;

#[cfg(test)]
pub(crate) mod test_utils;

pub use errors::{CotransError, Result};

//! Error types for frame transformations and basis construction

use thiserror::Error;

use crate::framelib::CoordinateFrame;

/// Main error type for the crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CotransError {
    /// A frame name outside the supported set
    #[error("Unsupported coordinate frame for {argument}: {value:?}")]
    UnsupportedFrame { argument: &'static str, value: String },

    /// Neither an explicit input frame nor a frame tag was available
    #[error("No input frame given and {variable} carries no frame tag")]
    MissingInputFrame { variable: String },

    /// No output frame was requested
    #[error("No output frame given for {variable}")]
    MissingOutputFrame { variable: String },

    /// The explicit input frame disagrees with the series' frame tag
    #[error("{variable} is tagged {tag} but input frame {requested} was requested")]
    FrameMismatch {
        variable: String,
        tag: String,
        requested: String,
    },

    /// The frame graph has no chain of edges between two frames
    #[error("No rotation path from {from} to {to}")]
    NoPath {
        from: CoordinateFrame,
        to: CoordinateFrame,
    },

    /// The input series has no samples
    #[error("{variable} contains no data")]
    EmptyData { variable: String },

    /// A series required by a basis builder was not supplied
    #[error("Missing support data: {variable}")]
    MissingSupportData { variable: String },

    /// The eigen-decomposition of a covariance matrix failed
    #[error("Linear algebra failure: {0}")]
    LinearAlgebra(String),

    /// Times and values disagree in length, or a series is not N×3
    #[error("Malformed series {variable}: {reason}")]
    SeriesShape { variable: String, reason: String },

    /// Window or slide settings that cannot produce a window
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// A field-aligned variant name that is not recognised
    #[error("Unknown field-aligned variant: {0:?}")]
    UnknownVariant(String),

    /// A time string that could not be parsed
    #[error("Cannot parse time {0:?}")]
    InvalidTime(String),
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, CotransError>;

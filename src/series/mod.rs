//! Vector time series and frame tags
//!
//! A [`Vector3Series`] pairs N timestamps (Unix seconds) with an N×3 array
//! of components. It optionally carries a [`FrameTag`] naming the frame the
//! components are expressed in, the way a persisted variable carries its
//! coordinate-system attribute.

pub mod rotation;

use std::fmt;

use nalgebra::Vector3;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::errors::{CotransError, Result};
use crate::framelib::CoordinateFrame;

/// Frame attribute attached to a series
///
/// Stored as the raw text so that a tag outside the supported frame set can
/// be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTag(String);

impl FrameTag {
    pub fn new(tag: impl Into<String>) -> Self {
        FrameTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this tag names `frame`, ignoring case and surrounding blanks
    pub fn matches(&self, frame: &str) -> bool {
        self.0.trim().eq_ignore_ascii_case(frame.trim())
    }

    /// Resolve the tag to a supported frame
    pub fn frame(&self) -> Result<CoordinateFrame> {
        CoordinateFrame::parse_arg(&self.0, "frame tag")
    }
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CoordinateFrame> for FrameTag {
    fn from(frame: CoordinateFrame) -> Self {
        FrameTag(frame.name().to_string())
    }
}

/// Time series of three-component vectors
#[derive(Debug, Clone, PartialEq)]
pub struct Vector3Series {
    name: String,
    times: Array1<f64>,
    values: Array2<f64>,
    frame: Option<FrameTag>,
}

impl Vector3Series {
    /// Create a series from a time array and an N×3 value array
    ///
    /// Fails with [`CotransError::SeriesShape`] when the value array is not
    /// N×3, when its row count differs from the time count, or when the
    /// times decrease.
    pub fn new(name: impl Into<String>, times: Array1<f64>, values: Array2<f64>) -> Result<Self> {
        let name = name.into();
        if values.ncols() != 3 {
            return Err(CotransError::SeriesShape {
                variable: name,
                reason: format!("expected 3 components, found {}", values.ncols()),
            });
        }
        if values.nrows() != times.len() {
            return Err(CotransError::SeriesShape {
                variable: name,
                reason: format!(
                    "{} timestamps but {} vectors",
                    times.len(),
                    values.nrows()
                ),
            });
        }
        if let Some(i) = (1..times.len()).find(|&i| times[i] < times[i - 1]) {
            return Err(CotransError::SeriesShape {
                variable: name,
                reason: format!("time decreases at index {i}"),
            });
        }
        Ok(Vector3Series {
            name,
            times,
            values,
            frame: None,
        })
    }

    /// Create a series from plain vectors
    pub fn from_rows(name: impl Into<String>, times: Vec<f64>, rows: &[[f64; 3]]) -> Result<Self> {
        let values = Array2::from_shape_fn((rows.len(), 3), |(i, j)| rows[i][j]);
        Self::new(name, Array1::from(times), values)
    }

    /// Attach a frame tag
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(FrameTag::new(frame));
        self
    }

    /// Drop the frame tag
    pub fn without_frame(mut self) -> Self {
        self.frame = None;
        self
    }

    /// Rename the series
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build a series sharing this one's times and tag with new values
    pub(crate) fn derived(&self, name: String, values: Array2<f64>, frame: Option<FrameTag>) -> Self {
        debug_assert_eq!(values.nrows(), self.times.len());
        Vector3Series {
            name,
            times: self.times.clone(),
            values,
            frame,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn frame_tag(&self) -> Option<&FrameTag> {
        self.frame.as_ref()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Components of sample `i`
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// Sample `i` as an nalgebra vector
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        let r = self.values.row(i);
        Vector3::new(r[0], r[1], r[2])
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Same times and tag with every vector scaled to unit length
    ///
    /// Zero vectors become NaN, as a direction is undefined for them.
    pub fn normalized(&self) -> Self {
        self.derived(
            self.name.clone(),
            normalize_rows(&self.values),
            self.frame.clone(),
        )
    }
}

/// Scale every row of an N×3 array to unit length
pub fn normalize_rows(values: &Array2<f64>) -> Array2<f64> {
    let mut out = values.clone();
    for mut row in out.rows_mut() {
        let norm = row.dot(&row).sqrt();
        row.mapv_inplace(|v| v / norm);
    }
    out
}

/// Row-wise cross product of two N×3 arrays
pub fn cross_rows(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros(a.raw_dim());
    for ((mut o, a), b) in out.rows_mut().into_iter().zip(a.rows()).zip(b.rows()) {
        o[0] = a[1] * b[2] - a[2] * b[1];
        o[1] = a[2] * b[0] - a[0] * b[2];
        o[2] = a[0] * b[1] - a[1] * b[0];
    }
    out
}

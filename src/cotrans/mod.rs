//! Coordinate transformation of vector time series
//!
//! [`Cotrans`] validates a transformation request against the series'
//! frame tag, resolves the hop sequence on its [`FrameGraph`], evaluates
//! every hop at the series' own timestamps and applies the composed
//! rotation sample by sample.
//!
//! Validation failures are logged at error level and returned as `Err`
//! before any numerical work, so batch callers can move on to the next
//! variable.

use std::sync::Arc;

use ndarray::{Array1, Array3};
use tracing::{debug, error, info};

use crate::errors::{CotransError, Result};
use crate::framelib::graph::default_graph;
use crate::framelib::{CoordinateFrame, FrameGraph};
use crate::igrflib::DipoleModel;
use crate::series::rotation::apply;
use crate::series::{FrameTag, Vector3Series};

/// Transformation executor bound to one frame graph
#[derive(Debug, Clone)]
pub struct Cotrans {
    graph: FrameGraph,
}

impl Default for Cotrans {
    fn default() -> Self {
        Cotrans {
            graph: default_graph(),
        }
    }
}

impl Cotrans {
    pub fn new(graph: FrameGraph) -> Self {
        Cotrans { graph }
    }

    /// Standard graph with a specific dipole model
    pub fn with_dipole_model(model: Arc<dyn DipoleModel>) -> Self {
        Cotrans {
            graph: FrameGraph::standard(model),
        }
    }

    pub fn graph(&self) -> &FrameGraph {
        &self.graph
    }

    /// Work out the input and output frames of a request
    ///
    /// Checks, in order: an output frame is given; an explicit input frame
    /// agrees with the frame tag; some input frame is known; both frames
    /// are supported.
    pub fn resolve_frames(
        &self,
        data: &Vector3Series,
        frame_in: Option<&str>,
        frame_out: Option<&str>,
    ) -> Result<(CoordinateFrame, CoordinateFrame)> {
        let variable = data.name();
        let frame_out = frame_out.ok_or_else(|| {
            reject(
                variable,
                CotransError::MissingOutputFrame {
                    variable: variable.to_string(),
                },
            )
        })?;

        let tag = data.frame_tag();
        let (frame_in, argument) = match (frame_in, tag) {
            (Some(requested), Some(tag)) if !tag.matches(requested) => {
                return Err(reject(
                    variable,
                    CotransError::FrameMismatch {
                        variable: variable.to_string(),
                        tag: tag.to_string(),
                        requested: requested.to_string(),
                    },
                ));
            }
            (Some(requested), _) => (requested, "frame_in"),
            (None, Some(tag)) => (tag.as_str(), "frame tag"),
            (None, None) => {
                return Err(reject(
                    variable,
                    CotransError::MissingInputFrame {
                        variable: variable.to_string(),
                    },
                ));
            }
        };

        let from =
            CoordinateFrame::parse_arg(frame_in, argument).map_err(|err| reject(variable, err))?;
        let to =
            CoordinateFrame::parse_arg(frame_out, "frame_out").map_err(|err| reject(variable, err))?;
        Ok((from, to))
    }

    /// Transform `data` from `frame_in` (or its tag) to `frame_out`
    ///
    /// The result is named `<name>_<frame_out>` and tagged with the output
    /// frame. Equal frames return an unchanged copy after an info notice.
    pub fn transform(
        &self,
        data: &Vector3Series,
        frame_in: Option<&str>,
        frame_out: Option<&str>,
    ) -> Result<Vector3Series> {
        let (from, to) = self.resolve_frames(data, frame_in, frame_out)?;
        if data.is_empty() {
            return Err(reject(
                data.name(),
                CotransError::EmptyData {
                    variable: data.name().to_string(),
                },
            ));
        }

        let name = format!("{}_{}", data.name(), to);
        if from == to {
            info!(
                variable = data.name(),
                frame = %from,
                "input and output frames are identical; data returned unchanged"
            );
            return Ok(data.derived(name, data.values().clone(), Some(FrameTag::from(to))));
        }

        let path = self
            .graph
            .resolve_path(from, to)
            .map_err(|err| reject(data.name(), err))?;
        debug!(
            variable = data.name(),
            samples = data.len(),
            path = ?path.iter().map(|h| h.to.name()).collect::<Vec<_>>(),
            "rotating {} -> {}",
            from,
            to
        );
        let rotation = self.graph.path_matrices(&path, data.times());
        let values = apply(&rotation, data.values());
        Ok(data.derived(name, values, Some(FrameTag::from(to))))
    }

    /// Transform using the series' frame tag as the input frame
    pub fn transform_to(&self, data: &Vector3Series, frame_out: &str) -> Result<Vector3Series> {
        self.transform(data, None, Some(frame_out))
    }

    /// Composed rotation matrices from `from` to `to` at `times`
    pub fn rotation_matrices(
        &self,
        times: &Array1<f64>,
        from: CoordinateFrame,
        to: CoordinateFrame,
    ) -> Result<Array3<f64>> {
        self.graph.rotation(from, to, times).map_err(|err| {
            error!(from = %from, to = %to, error = %err, "rotation matrices rejected");
            err
        })
    }

    /// Rotate a series between two already-validated frames
    ///
    /// Used by the basis builders for intermediate quantities; no tag
    /// checks and no identity notice.
    pub(crate) fn rotate(
        &self,
        data: &Vector3Series,
        from: CoordinateFrame,
        to: CoordinateFrame,
    ) -> Result<Vector3Series> {
        let rotation = self
            .graph
            .rotation(from, to, data.times())
            .map_err(|err| reject(data.name(), err))?;
        let values = apply(&rotation, data.values());
        Ok(data.derived(data.name().to_string(), values, Some(FrameTag::from(to))))
    }
}

/// Log a validation failure and hand it back
fn reject(variable: &str, err: CotransError) -> CotransError {
    error!(variable, error = %err, "coordinate transformation rejected");
    err
}

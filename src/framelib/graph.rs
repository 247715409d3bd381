//! Frame graph: the edge registry and the path resolver

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array3};

use super::rotations::{GeiToGeo, GeiToGse, GeoToMag, GseToGsm, GsmToSm, J2000ToGei};
use super::{CoordinateFrame, RotationProvider};
use crate::errors::{CotransError, Result};
use crate::igrflib::{DipoleModel, Igrf};
use crate::series::rotation::{compose, identity_series, transpose_series};

struct Edge {
    from: CoordinateFrame,
    to: CoordinateFrame,
    provider: Arc<dyn RotationProvider>,
}

/// One directed step of a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub from: CoordinateFrame,
    pub to: CoordinateFrame,
    edge: usize,
    inverse: bool,
}

impl Hop {
    /// Whether this hop runs against the registered direction of its edge
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }
}

/// Registry of elementary edges between frames
///
/// Edges are undirected for path finding; traversing one backwards uses
/// the transpose of its matrices.
#[derive(Clone, Default)]
pub struct FrameGraph {
    edges: Vec<Arc<Edge>>,
}

impl FrameGraph {
    /// An empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// The six geophysical edges with the given dipole model
    pub fn standard(model: Arc<dyn DipoleModel>) -> Self {
        let mut graph = FrameGraph::new();
        graph
            .register(CoordinateFrame::J2000, CoordinateFrame::Gei, J2000ToGei)
            .register(CoordinateFrame::Gei, CoordinateFrame::Geo, GeiToGeo)
            .register(CoordinateFrame::Geo, CoordinateFrame::Mag, GeoToMag::new(model.clone()))
            .register(CoordinateFrame::Gei, CoordinateFrame::Gse, GeiToGse)
            .register(CoordinateFrame::Gse, CoordinateFrame::Gsm, GseToGsm::new(model.clone()))
            .register(CoordinateFrame::Gsm, CoordinateFrame::Sm, GsmToSm::new(model));
        graph
    }

    /// Add the edge `from → to`, replacing any edge between the same frames
    pub fn register<P>(&mut self, from: CoordinateFrame, to: CoordinateFrame, provider: P) -> &mut Self
    where
        P: RotationProvider + 'static,
    {
        self.register_shared(from, to, Arc::new(provider))
    }

    /// Add an edge whose provider is already shared
    pub fn register_shared(
        &mut self,
        from: CoordinateFrame,
        to: CoordinateFrame,
        provider: Arc<dyn RotationProvider>,
    ) -> &mut Self {
        self.edges
            .retain(|e| !((e.from == from && e.to == to) || (e.from == to && e.to == from)));
        self.edges.push(Arc::new(Edge { from, to, provider }));
        self
    }

    /// Registered edges in their defining direction
    pub fn edges(&self) -> impl Iterator<Item = (CoordinateFrame, CoordinateFrame)> + '_ {
        self.edges.iter().map(|e| (e.from, e.to))
    }

    /// Ordered hops whose composition takes `from` to `to`
    ///
    /// The path is empty when the frames are equal. Breadth-first search
    /// returns a shortest path; on the standard tree it is the only one.
    pub fn resolve_path(&self, from: CoordinateFrame, to: CoordinateFrame) -> Result<Vec<Hop>> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut previous: HashMap<CoordinateFrame, Hop> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(frame) = queue.pop_front() {
            if frame == to {
                break;
            }
            for (index, edge) in self.edges.iter().enumerate() {
                let hop = if edge.from == frame {
                    Hop { from: frame, to: edge.to, edge: index, inverse: false }
                } else if edge.to == frame {
                    Hop { from: frame, to: edge.from, edge: index, inverse: true }
                } else {
                    continue;
                };
                if hop.to != from && !previous.contains_key(&hop.to) {
                    previous.insert(hop.to, hop);
                    queue.push_back(hop.to);
                }
            }
        }

        let mut path = Vec::new();
        let mut current = to;
        while current != from {
            let hop = previous
                .get(&current)
                .ok_or(CotransError::NoPath { from, to })?;
            path.push(*hop);
            current = hop.from;
        }
        path.reverse();
        Ok(path)
    }

    /// Matrices of one hop evaluated at `times`
    pub fn hop_matrices(&self, hop: &Hop, times: &Array1<f64>) -> Array3<f64> {
        let m = self.edges[hop.edge].provider.matrices(times);
        if hop.inverse {
            transpose_series(&m)
        } else {
            m
        }
    }

    /// Net rotation of a path: `R = R_k ⋯ R_2 · R_1`
    pub fn path_matrices(&self, path: &[Hop], times: &Array1<f64>) -> Array3<f64> {
        path.iter().fold(identity_series(times.len()), |acc, hop| {
            compose(&self.hop_matrices(hop, times), &acc)
        })
    }

    /// Resolve and evaluate the net rotation between two frames
    pub fn rotation(
        &self,
        from: CoordinateFrame,
        to: CoordinateFrame,
        times: &Array1<f64>,
    ) -> Result<Array3<f64>> {
        let path = self.resolve_path(from, to)?;
        Ok(self.path_matrices(&path, times))
    }
}

impl fmt::Debug for FrameGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.edges.iter().map(|e| format!("{} -> {}", e.from, e.to)))
            .finish()
    }
}

/// Standard graph with the IGRF dipole
pub fn default_graph() -> FrameGraph {
    FrameGraph::standard(Arc::new(Igrf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framelib::rotations::axis_rotation;
    use crate::series::rotation::apply;
    use approx::assert_relative_eq;
    use ndarray::array;
    use CoordinateFrame::*;

    fn route(path: &[Hop]) -> Vec<CoordinateFrame> {
        let mut frames = vec![path[0].from];
        frames.extend(path.iter().map(|h| h.to));
        frames
    }

    #[test]
    fn test_identity_path_is_empty() {
        let graph = default_graph();
        for frame in CoordinateFrame::ALL {
            assert!(graph.resolve_path(frame, frame).unwrap().is_empty());
        }
    }

    #[test]
    fn test_known_routes() {
        let graph = default_graph();
        assert_eq!(route(&graph.resolve_path(Gse, Gsm).unwrap()), vec![Gse, Gsm]);
        assert_eq!(
            route(&graph.resolve_path(Geo, Sm).unwrap()),
            vec![Geo, Gei, Gse, Gsm, Sm]
        );
        assert_eq!(
            route(&graph.resolve_path(Mag, J2000).unwrap()),
            vec![Mag, Geo, Gei, J2000]
        );
    }

    #[test]
    fn test_reverse_path_mirrors_forward() {
        let graph = default_graph();
        for a in CoordinateFrame::ALL {
            for b in CoordinateFrame::ALL {
                let forward = graph.resolve_path(a, b).unwrap();
                let backward = graph.resolve_path(b, a).unwrap();
                assert_eq!(forward.len(), backward.len());
                for (f, r) in forward.iter().zip(backward.iter().rev()) {
                    assert_eq!((f.from, f.to), (r.to, r.from));
                    assert_ne!(f.is_inverse(), r.is_inverse());
                }
            }
        }
    }

    #[test]
    fn test_missing_edge_reports_no_path() {
        let mut graph = FrameGraph::new();
        graph.register(Gse, Gsm, |t: &Array1<f64>| identity_series(t.len()));
        assert_eq!(
            graph.resolve_path(Gse, Geo).unwrap_err(),
            CotransError::NoPath { from: Gse, to: Geo }
        );
    }

    #[test]
    fn test_register_replaces_edge() {
        let mut graph = FrameGraph::new();
        graph.register(Gei, Geo, |t: &Array1<f64>| identity_series(t.len()));
        graph.register(Geo, Gei, |t: &Array1<f64>| axis_rotation(2, &t.mapv(|_| 0.5)));
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(Geo, Gei)]);

        // the replacement is used, inverted, for the opposite direction
        let times = array![0.0];
        let m = graph.rotation(Gei, Geo, &times).unwrap();
        let v = apply(&m, &array![[1.0, 0.0, 0.0]]);
        assert_relative_eq!(v[[0, 1]], 0.5_f64.sin(), epsilon = 1e-15);
    }

    #[test]
    fn test_path_composition_order() {
        // two custom edges with non-commuting rotations
        let mut graph = FrameGraph::new();
        graph
            .register(Gei, Gse, |t: &Array1<f64>| axis_rotation(2, &t.mapv(|_| 0.3)))
            .register(Gse, Gsm, |t: &Array1<f64>| axis_rotation(0, &t.mapv(|_| 0.7)));
        let times = array![0.0];
        let net = graph.rotation(Gei, Gsm, &times).unwrap();
        let v = array![[0.2, -0.4, 0.9]];
        let stepwise = apply(
            &axis_rotation(0, &array![0.7]),
            &apply(&axis_rotation(2, &array![0.3]), &v),
        );
        let direct = apply(&net, &v);
        for (a, b) in direct.iter().zip(stepwise.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-15);
        }
    }
}

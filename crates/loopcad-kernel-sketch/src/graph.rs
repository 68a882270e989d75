//! The sketch vertex/edge graph.

use std::collections::BTreeMap;
use std::fmt;

use loopcad_kernel_math::Point2;
use serde::{Deserialize, Serialize};

use crate::plane::Plane;

/// Identifier of a sketch vertex, unique within its sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u64);

/// Identifier of a sketch edge, unique within its sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A point in the sketch plane's (u, v) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Vertex id.
    pub id: VertexId,
    /// u coordinate.
    pub u: f64,
    /// v coordinate.
    pub v: f64,
}

impl Vertex {
    /// Position as a 2D point.
    pub fn position(&self) -> Point2 {
        Point2::new(self.u, self.v)
    }
}

/// Kind of sketch edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Straight segment between the two endpoints.
    #[default]
    Line,
}

/// An undirected connection between two vertices, referenced by id.
///
/// Endpoints are lookups, not ownership: an edge may name a vertex that does
/// not exist, and loop detection skips such edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Edge id.
    pub id: EdgeId,
    /// Edge kind.
    pub kind: EdgeKind,
    /// First endpoint.
    pub v1: VertexId,
    /// Second endpoint.
    pub v2: VertexId,
}

impl Edge {
    /// The endpoint opposite `from`, or `None` if `from` is not an endpoint.
    pub fn opposite(&self, from: VertexId) -> Option<VertexId> {
        if from == self.v1 {
            Some(self.v2)
        } else if from == self.v2 {
            Some(self.v1)
        } else {
            None
        }
    }
}

/// A 2D sketch: vertices and edges on a [`Plane`], plus free-form parameters.
///
/// Vertex and edge ids are assigned from per-sketch counters. Iteration over
/// vertices and edges is always in ascending id order.
///
/// Counters start at or below [`Sketch::MAX_ID`] + 1, so they cannot wrap
/// within any reachable number of insertions.
#[derive(Debug, Clone)]
pub struct Sketch {
    plane: Plane,
    pub(crate) vertices: BTreeMap<VertexId, Vertex>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
    pub(crate) parameters: BTreeMap<String, serde_json::Value>,
    pub(crate) next_vertex_id: u64,
    pub(crate) next_edge_id: u64,
}

impl Sketch {
    /// Largest id accepted when loading a record.
    pub const MAX_ID: u64 = i64::MAX as u64;

    /// Create an empty sketch on `plane`.
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
            parameters: BTreeMap::new(),
            next_vertex_id: 0,
            next_edge_id: 0,
        }
    }

    /// The sketch plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Insert a vertex at `(u, v)`. Coincident vertices are allowed.
    pub fn add_vertex(&mut self, u: f64, v: f64) -> Vertex {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;
        let vertex = Vertex { id, u, v };
        self.vertices.insert(id, vertex);
        vertex
    }

    /// Insert an edge between two vertex ids.
    ///
    /// The endpoints are not checked; an edge to a missing vertex is legal
    /// and simply never takes part in a loop.
    pub fn add_edge(&mut self, v1: VertexId, v2: VertexId, kind: EdgeKind) -> Edge {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        let edge = Edge { id, kind, v1, v2 };
        self.edges.insert(id, edge);
        edge
    }

    /// Insert a line edge.
    pub fn add_line(&mut self, v1: VertexId, v2: VertexId) -> Edge {
        self.add_edge(v1, v2, EdgeKind::Line)
    }

    /// Look up a vertex by id.
    pub fn get_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Look up an edge by id.
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the sketch has no vertices and no edges.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Remove all vertices and edges and restart id assignment at 0.
    ///
    /// The plane and parameters are kept.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.next_vertex_id = 0;
        self.next_edge_id = 0;
    }

    /// Set a named parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.parameters.insert(name.into(), value);
    }

    /// Read a named parameter.
    pub fn parameter(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters.get(name)
    }

    /// All parameters by name.
    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0);
        let b = sketch.add_vertex(1.0, 0.0);
        let e = sketch.add_line(a.id, b.id);
        assert_eq!(a.id, VertexId(0));
        assert_eq!(b.id, VertexId(1));
        assert_eq!(e.id, EdgeId(0));
        assert_eq!(e.kind, EdgeKind::Line);
        assert_eq!(sketch.vertex_count(), 2);
        assert_eq!(sketch.edge_count(), 1);
    }

    #[test]
    fn test_coincident_vertices_allowed() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(1.0, 1.0);
        let b = sketch.add_vertex(1.0, 1.0);
        assert_ne!(a.id, b.id);
        assert_eq!(sketch.vertex_count(), 2);
    }

    #[test]
    fn test_dangling_edge_is_stored() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0);
        let e = sketch.add_line(a.id, VertexId(42));
        assert_eq!(sketch.get_edge(e.id), Some(&e));
        assert!(sketch.get_vertex(VertexId(42)).is_none());
    }

    #[test]
    fn test_opposite_endpoint() {
        let edge = Edge {
            id: EdgeId(0),
            kind: EdgeKind::Line,
            v1: VertexId(3),
            v2: VertexId(7),
        };
        assert_eq!(edge.opposite(VertexId(3)), Some(VertexId(7)));
        assert_eq!(edge.opposite(VertexId(7)), Some(VertexId(3)));
        assert_eq!(edge.opposite(VertexId(1)), None);
    }

    #[test]
    fn test_clear_resets_counters() {
        let mut sketch = Sketch::new(Plane::xy());
        sketch.set_parameter("depth", serde_json::json!(5.0));
        let a = sketch.add_vertex(0.0, 0.0);
        sketch.add_vertex(1.0, 0.0);
        sketch.add_line(a.id, a.id);
        sketch.clear();
        assert!(sketch.is_empty());
        assert_eq!(sketch.add_vertex(2.0, 2.0).id, VertexId(0));
        assert_eq!(sketch.parameter("depth"), Some(&serde_json::json!(5.0)));
    }

    #[test]
    fn test_iteration_in_id_order() {
        let mut sketch = Sketch::new(Plane::xy());
        for i in 0..5 {
            sketch.add_vertex(i as f64, 0.0);
        }
        let ids: Vec<u64> = sketch.vertices().map(|v| v.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }
}

//! Persisted sketch format.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{Edge, EdgeId, EdgeKind, Sketch, Vertex, VertexId};
use crate::plane::{Plane, PlaneRecord};
use crate::SketchError;

/// A stored vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    /// Vertex id.
    pub id: VertexId,
    /// u coordinate.
    pub u: f64,
    /// v coordinate.
    pub v: f64,
}

/// A stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Edge id.
    pub id: EdgeId,
    /// Edge kind.
    #[serde(default)]
    pub kind: EdgeKind,
    /// First endpoint.
    pub v1: VertexId,
    /// Second endpoint.
    pub v2: VertexId,
}

/// A stored sketch. Loops are not stored; they are recomputed after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchRecord {
    /// Sketch plane.
    pub plane: PlaneRecord,
    /// Vertices.
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    /// Edges.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    /// Free-form parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl Sketch {
    /// Snapshot the sketch into its persisted form.
    pub fn to_record(&self) -> SketchRecord {
        SketchRecord {
            plane: self.plane().to_record(),
            vertices: self
                .vertices()
                .map(|v| VertexRecord {
                    id: v.id,
                    u: v.u,
                    v: v.v,
                })
                .collect(),
            edges: self
                .edges()
                .map(|e| EdgeRecord {
                    id: e.id,
                    kind: e.kind,
                    v1: e.v1,
                    v2: e.v2,
                })
                .collect(),
            parameters: self.parameters.clone(),
        }
    }

    /// Rebuild a sketch from its persisted form.
    ///
    /// Ids are kept as stored. New ids continue after the largest stored id.
    /// Edges may reference vertices absent from the record.
    ///
    /// # Errors
    ///
    /// Fails on a degenerate plane, a repeated id, or an id above
    /// [`Sketch::MAX_ID`].
    pub fn from_record(record: &SketchRecord) -> Result<Self, SketchError> {
        let mut sketch = Sketch::new(Plane::from_record(&record.plane)?);

        let mut seen = HashSet::new();
        for v in &record.vertices {
            check_id("vertex", v.id.0)?;
            if !seen.insert(v.id) {
                return Err(SketchError::DuplicateId {
                    kind: "vertex",
                    id: v.id.0,
                });
            }
            sketch.vertices.insert(
                v.id,
                Vertex {
                    id: v.id,
                    u: v.u,
                    v: v.v,
                },
            );
        }

        let mut seen = HashSet::new();
        for e in &record.edges {
            check_id("edge", e.id.0)?;
            if !seen.insert(e.id) {
                return Err(SketchError::DuplicateId {
                    kind: "edge",
                    id: e.id.0,
                });
            }
            sketch.edges.insert(
                e.id,
                Edge {
                    id: e.id,
                    kind: e.kind,
                    v1: e.v1,
                    v2: e.v2,
                },
            );
        }

        sketch.next_vertex_id = next_id(sketch.vertices.keys().next_back().map(|id| id.0));
        sketch.next_edge_id = next_id(sketch.edges.keys().next_back().map(|id| id.0));
        sketch.parameters = record.parameters.clone();

        debug!(
            vertices = sketch.vertex_count(),
            edges = sketch.edge_count(),
            "loaded sketch record"
        );
        Ok(sketch)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, SketchError> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    /// Parse a sketch from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SketchError> {
        let record: SketchRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }
}

fn check_id(kind: &'static str, id: u64) -> Result<(), SketchError> {
    if id > Sketch::MAX_ID {
        return Err(SketchError::IdOutOfRange { kind, id });
    }
    Ok(())
}

/// Counter value after the largest loaded id. Ids are already bounded by
/// [`Sketch::MAX_ID`], so the add cannot overflow.
fn next_id(largest: Option<u64>) -> u64 {
    largest.map_or(0, |id| id.saturating_add(1))
}

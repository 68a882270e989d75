#![warn(missing_docs)]

//! Sketch topology for the loopcad kernel.
//!
//! A [`Sketch`] holds vertices in a [`Plane`]'s (u, v) coordinates and line
//! edges between them. [`Sketch::detect_closed_loops`] recovers closed
//! polygon boundaries from that unordered graph, and [`extrude`] sweeps one
//! of them along the plane normal into a triangulated solid.
//!
//! # Example
//!
//! ```
//! use loopcad_kernel_sketch::{ExtrudeDirection, Plane, Sketch};
//!
//! let mut sketch = Sketch::new(Plane::xy());
//! let a = sketch.add_vertex(0.0, 0.0).id;
//! let b = sketch.add_vertex(4.0, 0.0).id;
//! let c = sketch.add_vertex(4.0, 2.0).id;
//! let d = sketch.add_vertex(0.0, 2.0).id;
//! for (v1, v2) in [(a, b), (b, c), (c, d), (d, a)] {
//!     sketch.add_line(v1, v2);
//! }
//!
//! let loops = sketch.detect_closed_loops();
//! assert_eq!(loops.len(), 1);
//!
//! let solid = sketch
//!     .to_geometry(10.0, ExtrudeDirection::Forward)
//!     .unwrap()
//!     .expect("one loop to extrude");
//! assert_eq!(solid.num_triangles(), 12);
//! ```

mod extrude;
mod graph;
mod loops;
mod plane;
mod record;

pub use extrude::{extrude, profile_face_mesh, ExtrudeDirection};
pub use graph::{Edge, EdgeId, EdgeKind, Sketch, Vertex, VertexId};
pub use loops::{Loop, LoopSettings};
pub use plane::{Plane, PlaneRecord, Xyz};
pub use record::{EdgeRecord, SketchRecord, VertexRecord};

use thiserror::Error;

/// Errors from sketch construction, serialization and extrusion.
#[derive(Debug, Error)]
pub enum SketchError {
    /// A plane normal has zero (or non-finite) length.
    #[error("plane normal is degenerate")]
    DegenerateNormal,

    /// A loop references a vertex that is no longer in the sketch.
    #[error("vertex {0} not found")]
    MissingVertex(VertexId),

    /// A loop references an edge that is no longer in the sketch.
    #[error("edge {0} not found")]
    MissingEdge(EdgeId),

    /// Consecutive loop edges do not share a vertex.
    #[error("loop is broken at edge {0}")]
    BrokenLoop(EdgeId),

    /// Profile has fewer than three vertices.
    #[error("profile needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Profile encloses no area.
    #[error("profile has zero area")]
    ZeroArea,

    /// Extrusion distance is not a positive finite number.
    #[error("invalid extrusion distance: {0}")]
    InvalidDistance(f64),

    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Two records in a sketch file share an id.
    #[error("duplicate {kind} id {id} in sketch record")]
    DuplicateId {
        /// `"vertex"` or `"edge"`.
        kind: &'static str,
        /// The repeated id.
        id: u64,
    },

    /// A stored id is too large for new ids to follow it.
    #[error("{kind} id {id} exceeds the maximum of {max}", max = Sketch::MAX_ID)]
    IdOutOfRange {
        /// `"vertex"` or `"edge"`.
        kind: &'static str,
        /// The offending id.
        id: u64,
    },

    /// JSON (de)serialization failed.
    #[error("sketch serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sketch operations.
pub type Result<T> = std::result::Result<T, SketchError>;

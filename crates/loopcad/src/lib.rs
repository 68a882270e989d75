#![warn(missing_docs)]

//! Sketch-to-solid modeling core for loopcad.
//!
//! Re-exports the kernel crates and provides [`Document`], which owns the
//! sketches and body meshes of one modeling session together with the face
//! grouping cache used for hover and selection.
//!
//! # Example
//!
//! ```
//! use loopcad::{Document, ExtrudeDirection, Plane, Sketch};
//!
//! let mut sketch = Sketch::new(Plane::xy());
//! let ids: Vec<_> = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
//!     .iter()
//!     .map(|&(u, v)| sketch.add_vertex(u, v).id)
//!     .collect();
//! for i in 0..4 {
//!     sketch.add_line(ids[i], ids[(i + 1) % 4]);
//! }
//!
//! let mut doc = Document::new();
//! let sketch_id = doc.add_sketch(sketch);
//! let body = doc
//!     .extrude(sketch_id, 3.0, ExtrudeDirection::Forward)
//!     .unwrap()
//!     .expect("square sketch has a loop");
//! assert_eq!(doc.face_groups(body).unwrap().len(), 6);
//! ```

mod document;

pub use document::{Document, DocumentError};

pub use loopcad_kernel_faces;
pub use loopcad_kernel_math;
pub use loopcad_kernel_sketch;
pub use loopcad_kernel_tessellate;

pub use loopcad_kernel_faces::{
    BodyMesh, FaceGroupCache, FaceGroupId, FaceGroups, FaceOwner, FacePick, GroupingSettings,
    MeshId, PerimeterEdge, SketchId, TriangleHit,
};
pub use loopcad_kernel_math::{Point2, Point3, Transform, Vec3};
pub use loopcad_kernel_sketch::{ExtrudeDirection, Loop, LoopSettings, Plane, Sketch};
pub use loopcad_kernel_tessellate::TriangleMesh;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

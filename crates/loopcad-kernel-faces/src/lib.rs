#![warn(missing_docs)]

//! Face identity for triangle meshes.
//!
//! A tessellated body has many triangles per visible face. [`FaceGroups`]
//! clusters coplanar, edge-adjacent triangles into logical faces so a
//! hover or click on any triangle selects the whole face, and extracts each
//! face's outline for highlighting. [`FaceGroupCache`] keeps groupings per
//! `(mesh, generation)` so hover queries do not regroup the mesh.
//!
//! # Example
//!
//! ```
//! use loopcad_kernel_faces::{FaceGroups, GroupingSettings};
//! use loopcad_kernel_tessellate::TriangleMesh;
//!
//! // A unit square split along its diagonal.
//! let mesh = TriangleMesh {
//!     vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
//!     indices: vec![0, 1, 2, 0, 2, 3],
//!     normals: Vec::new(),
//! };
//!
//! let groups = FaceGroups::build(&mesh, &GroupingSettings::default()).unwrap();
//! assert_eq!(groups.len(), 1);
//!
//! let face = groups.group_of(1).unwrap();
//! assert_eq!(groups.perimeter(face).unwrap().len(), 4);
//! ```

pub mod cache;
pub mod error;
pub mod grouping;
pub mod perimeter;
pub mod picking;

pub use cache::{BodyMesh, CacheStats, FaceGroupCache, MeshId, MeshKey};
pub use error::{FaceError, Result};
pub use grouping::{triangle_normal, FaceGroup, FaceGroupId, FaceGroups};
pub use perimeter::{perimeter_edges, PerimeterEdge};
pub use picking::{is_front_facing, resolve_pick, FaceOwner, FacePick, SketchId, TriangleHit};

use serde::{Deserialize, Serialize};

/// Thresholds for grouping triangles into faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingSettings {
    /// Minimum `|n1 · n2|` for two triangles to count as coplanar.
    pub coplanar_dot: f64,
    /// Distance under which two vertex positions count as shared.
    pub adjacency_tolerance: f64,
    /// Grid size used to match edge endpoints when extracting perimeters.
    pub perimeter_precision: f64,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            coplanar_dot: 0.9999,
            adjacency_tolerance: 1e-4,
            perimeter_precision: 1e-4,
        }
    }
}

impl GroupingSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.coplanar_dot > 0.0 && self.coplanar_dot <= 1.0) {
            return Err(FaceError::InvalidSettings(
                "coplanar_dot must be in (0, 1]".into(),
            ));
        }
        if !(self.adjacency_tolerance.is_finite() && self.adjacency_tolerance > 0.0) {
            return Err(FaceError::InvalidSettings(
                "adjacency_tolerance must be positive".into(),
            ));
        }
        if !(self.perimeter_precision.is_finite() && self.perimeter_precision > 0.0) {
            return Err(FaceError::InvalidSettings(
                "perimeter_precision must be positive".into(),
            ));
        }
        Ok(())
    }
}

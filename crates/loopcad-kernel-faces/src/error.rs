//! Error types for face grouping.

use thiserror::Error;

use crate::grouping::FaceGroupId;

/// Errors that can occur while grouping or picking faces.
#[derive(Error, Debug)]
pub enum FaceError {
    /// Vertex or index buffers do not describe whole triangles.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),

    /// A triangle index is past the end of the mesh.
    #[error("triangle {triangle} out of range for mesh with {count} triangles")]
    TriangleOutOfRange {
        /// Requested triangle.
        triangle: usize,
        /// Triangles in the mesh.
        count: usize,
    },

    /// A group id does not belong to this grouping.
    #[error("unknown face group {0}")]
    UnknownGroup(FaceGroupId),

    /// Invalid grouping settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for face grouping operations.
pub type Result<T> = std::result::Result<T, FaceError>;

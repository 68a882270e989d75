#![warn(missing_docs)]

//! Math types for the loopcad kernel.
//!
//! Thin aliases over nalgebra for sketch-plane and mesh geometry, an affine
//! [`Transform`] for taking body meshes from local to world space, and the
//! [`Tolerance`] constants shared by the sketch and face crates.

use nalgebra::{Matrix4, Unit, Vector3};

/// A point in 3D world or mesh-local space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit direction in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in a sketch plane's (u, v) coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// Local-to-world placement of a body, as a homogeneous 4x4 matrix.
///
/// Only affine matrices are expected; the projective row is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Right-handed rotation by `angle` radians about an axis through the origin.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self {
            matrix: Matrix4::from_axis_angle(axis, angle),
        }
    }

    /// Map a point (translation applies).
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// Map a surface normal by the inverse transpose of the linear part.
    ///
    /// The result is not renormalized. A singular linear part leaves the
    /// normal unchanged.
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let linear = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        linear
            .try_inverse()
            .map_or(*n, |inv| inv.transpose() * n)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerances for plane and profile checks.
///
/// Mesh-level comparisons (vertex matching, coplanarity) carry their own
/// settings in the face crate.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear and area threshold below which a quantity counts as zero.
    pub linear: f64,
    /// Squared length below which a vector cannot be normalized.
    pub zero_length_sq: f64,
}

impl Tolerance {
    /// Default tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        zero_length_sq: 1e-18,
    };

    /// Whether `v` is non-finite or too short to normalize.
    pub fn is_zero_vec(&self, v: &Vec3) -> bool {
        !v.iter().all(|c| c.is_finite()) || v.norm_squared() < self.zero_length_sq
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

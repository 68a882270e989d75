//! Sketch planes: a 2D (u, v) frame embedded in 3D.

use loopcad_kernel_math::{Dir3, Point2, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::SketchError;

/// `|normal.x|` at or above which world-Y replaces world-X as the helper axis.
const HELPER_SWITCH: f64 = 0.9;

/// A plane with an orthonormal (u, v, normal) basis.
///
/// The basis satisfies `v_axis × normal = u_axis` (equivalently
/// `u_axis × v_axis = normal`). Planes are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Dir3,
    u_axis: Dir3,
    v_axis: Dir3,
}

impl Plane {
    /// Build a plane from a normal, deriving the in-plane axes deterministically.
    ///
    /// The helper vector is world-X unless `|normal.x| >= 0.9`, in which case
    /// world-Y is used, so the cross products never collapse.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::DegenerateNormal`] for a zero or non-finite normal.
    pub fn from_normal(normal: Vec3, origin: Point3) -> Result<Self, SketchError> {
        Ok(Self::from_unit_normal(unit_normal(normal)?, origin))
    }

    /// Build a plane whose v axis is the camera's up vector projected onto it.
    ///
    /// When `camera_up` is parallel to `normal` there is no usable projection;
    /// the basis then falls back to the [`Plane::from_normal`] rule.
    pub fn from_camera_view(
        normal: Vec3,
        camera_up: Vec3,
        origin: Point3,
    ) -> Result<Self, SketchError> {
        let n = unit_normal(normal)?;
        let projected = camera_up - n.as_ref() * camera_up.dot(n.as_ref());

        let up_len = camera_up.norm();
        if !up_len.is_finite() || projected.norm() <= up_len * 1e-9 || up_len == 0.0 {
            warn!(
                ?camera_up,
                normal = ?n.as_ref(),
                "camera up is parallel to the sketch normal, using default basis"
            );
            return Ok(Self::from_unit_normal(n, origin));
        }

        let v_axis = Dir3::new_normalize(projected);
        let u_axis = Dir3::new_normalize(v_axis.cross(n.as_ref()));
        Ok(Self {
            origin,
            normal: n,
            u_axis,
            v_axis,
        })
    }

    /// World XY plane through the origin (normal +Z, u = +X, v = +Y).
    pub fn xy() -> Self {
        Self::from_unit_normal(Vec3::z_axis(), Point3::origin())
    }

    /// World XZ plane through the origin (normal +Y).
    pub fn xz() -> Self {
        Self::from_unit_normal(Vec3::y_axis(), Point3::origin())
    }

    /// World YZ plane through the origin (normal +X).
    pub fn yz() -> Self {
        Self::from_unit_normal(Vec3::x_axis(), Point3::origin())
    }

    fn from_unit_normal(normal: Dir3, origin: Point3) -> Self {
        let helper = if normal.x.abs() >= HELPER_SWITCH {
            Vec3::y()
        } else {
            Vec3::x()
        };
        let v_axis = Dir3::new_normalize(normal.cross(&helper));
        let u_axis = Dir3::new_normalize(v_axis.cross(normal.as_ref()));
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    /// Origin of the plane in world space.
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// Unit normal.
    pub fn normal(&self) -> Dir3 {
        self.normal
    }

    /// Unit vector of the local u axis.
    pub fn u_axis(&self) -> Dir3 {
        self.u_axis
    }

    /// Unit vector of the local v axis.
    pub fn v_axis(&self) -> Dir3 {
        self.v_axis
    }

    /// Map plane coordinates to world space: `origin + u·u_axis + v·v_axis`.
    pub fn to_world(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.u_axis.as_ref() * u + self.v_axis.as_ref() * v
    }

    /// [`Plane::to_world`] for a [`Point2`].
    pub fn to_world_point(&self, p: &Point2) -> Point3 {
        self.to_world(p.x, p.y)
    }

    /// Project a world point onto the plane's (u, v) coordinates.
    ///
    /// The out-of-plane component is discarded; this is a projection, not a
    /// containment test.
    pub fn to_plane(&self, world: &Point3) -> Point2 {
        let d = world - self.origin;
        Point2::new(d.dot(self.u_axis.as_ref()), d.dot(self.v_axis.as_ref()))
    }

    /// Signed distance of a world point from the plane along its normal.
    pub fn distance_to(&self, world: &Point3) -> f64 {
        (world - self.origin).dot(self.normal.as_ref())
    }

    /// Serializable form. The basis is not stored; it is rederived on load.
    pub fn to_record(&self) -> PlaneRecord {
        PlaneRecord {
            origin: self.origin.coords.into(),
            normal: self.normal.into_inner().into(),
        }
    }

    /// Rebuild a plane from its record using the [`Plane::from_normal`] rule.
    pub fn from_record(record: &PlaneRecord) -> Result<Self, SketchError> {
        Self::from_normal(record.normal.into(), Point3::from(Vec3::from(record.origin)))
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::xy()
    }
}

fn unit_normal(normal: Vec3) -> Result<Dir3, SketchError> {
    if Tolerance::DEFAULT.is_zero_vec(&normal) {
        return Err(SketchError::DegenerateNormal);
    }
    Ok(Dir3::new_normalize(normal))
}

/// A 3D vector in records, as `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl From<Vec3> for Xyz {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Xyz> for Vec3 {
    fn from(v: Xyz) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Persisted plane: `{ origin: {x,y,z}, normal: {x,y,z} }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRecord {
    /// Plane origin.
    pub origin: Xyz,
    /// Plane normal (need not be unit length).
    pub normal: Xyz,
}

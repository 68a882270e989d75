//! Turning a raw triangle hit into a face selection.

use std::fmt;

use loopcad_kernel_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::{BodyMesh, FaceGroupCache, MeshId};
use crate::error::{FaceError, Result};
use crate::grouping::{FaceGroupId, FaceGroups};

/// Identity of a sketch whose profile faces are pickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SketchId(pub u64);

impl fmt::Display for SketchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sketch{}", self.0)
    }
}

/// What a picked mesh belongs to.
///
/// Passed in by the caller alongside the hit; the mesh itself carries no
/// back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceOwner {
    /// A closed solid. Back-facing triangles are not pickable.
    Body,
    /// A flat, double-sided sketch profile surface.
    Sketch(SketchId),
}

/// A ray/triangle intersection reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Triangle index in the mesh.
    pub triangle: usize,
    /// Intersection point in world space.
    pub point: Point3,
}

/// A resolved face selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FacePick {
    /// Picked mesh.
    pub mesh: MeshId,
    /// Face group containing the hit triangle.
    pub group: FaceGroupId,
    /// Owner of the mesh.
    pub owner: FaceOwner,
}

/// Whether a surface with `world_normal` at `world_hit` faces `camera`.
///
/// Grazing hits (zero dot product) count as front-facing.
pub fn is_front_facing(world_normal: &Vec3, world_hit: &Point3, camera: &Point3) -> bool {
    world_normal.dot(&(camera - world_hit)) >= 0.0
}

/// Resolve a hit on `body` to its face group.
///
/// Body hits on back-facing or degenerate triangles yield `Ok(None)`.
/// Sketch surfaces are pickable from either side.
///
/// # Errors
///
/// [`FaceError::TriangleOutOfRange`] if the hit names a triangle the
/// grouping does not have.
pub fn resolve_pick(
    body: &BodyMesh,
    groups: &FaceGroups,
    owner: FaceOwner,
    hit: &TriangleHit,
    camera: &Point3,
) -> Result<Option<FacePick>> {
    let group = groups
        .group_of(hit.triangle)
        .ok_or(FaceError::TriangleOutOfRange {
            triangle: hit.triangle,
            count: groups.num_triangles(),
        })?;

    if owner == FaceOwner::Body {
        let Some(local) = groups.triangle_normal(hit.triangle) else {
            trace!(triangle = hit.triangle, "ignoring hit on degenerate triangle");
            return Ok(None);
        };
        let world_normal = body.transform().apply_normal(&local);
        if !is_front_facing(&world_normal, &hit.point, camera) {
            trace!(triangle = hit.triangle, "ignoring back-facing hit");
            return Ok(None);
        }
    }

    Ok(Some(FacePick {
        mesh: body.id(),
        group,
        owner,
    }))
}

impl FaceGroupCache {
    /// [`resolve_pick`] against the cached grouping of `body`.
    pub fn pick(
        &mut self,
        body: &BodyMesh,
        owner: FaceOwner,
        hit: &TriangleHit,
        camera: &Point3,
    ) -> Result<Option<FacePick>> {
        let groups = self.get_or_build(body)?;
        resolve_pick(body, groups, owner, hit, camera)
    }
}

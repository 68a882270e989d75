//! Session state: sketches, pickable meshes and their face groupings.

use std::collections::BTreeMap;

use loopcad_kernel_faces::{
    BodyMesh, FaceError, FaceGroupCache, FaceGroupId, FaceGroups, FaceOwner, FacePick,
    GroupingSettings, MeshId, PerimeterEdge, SketchId, TriangleHit,
};
use loopcad_kernel_math::{Point3, Transform};
use loopcad_kernel_sketch::{ExtrudeDirection, Sketch, SketchError};
use loopcad_kernel_tessellate::TriangleMesh;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Result;

/// Errors from document operations.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No sketch with this id.
    #[error("unknown sketch {0}")]
    UnknownSketch(SketchId),

    /// No mesh with this id.
    #[error("unknown mesh {0}")]
    UnknownMesh(MeshId),

    /// Sketch or extrusion failure.
    #[error(transparent)]
    Sketch(#[from] SketchError),

    /// Face grouping or picking failure.
    #[error(transparent)]
    Face(#[from] FaceError),
}

#[derive(Debug)]
struct Pickable {
    body: BodyMesh,
    owner: FaceOwner,
}

/// Sketches and pickable meshes of one modeling session.
///
/// Every mesh is registered with an owner: extruded solids are
/// [`FaceOwner::Body`], flat sketch profile faces are
/// [`FaceOwner::Sketch`]. Replacing a mesh's geometry invalidates its face
/// grouping immediately.
#[derive(Debug, Default)]
pub struct Document {
    sketches: BTreeMap<SketchId, Sketch>,
    meshes: BTreeMap<MeshId, Pickable>,
    faces: FaceGroupCache,
    next_sketch_id: u64,
    next_mesh_id: u64,
}

impl Document {
    /// Empty document with default grouping settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document with custom grouping settings.
    pub fn with_grouping_settings(settings: GroupingSettings) -> Result<Self> {
        Ok(Self {
            faces: FaceGroupCache::with_settings(settings)?,
            ..Self::default()
        })
    }

    // =========================================================================
    // Sketches
    // =========================================================================

    /// Take ownership of a sketch.
    pub fn add_sketch(&mut self, sketch: Sketch) -> SketchId {
        let id = SketchId(self.next_sketch_id);
        self.next_sketch_id += 1;
        self.sketches.insert(id, sketch);
        id
    }

    /// Look up a sketch.
    pub fn sketch(&self, id: SketchId) -> Option<&Sketch> {
        self.sketches.get(&id)
    }

    /// Look up a sketch for editing.
    pub fn sketch_mut(&mut self, id: SketchId) -> Option<&mut Sketch> {
        self.sketches.get_mut(&id)
    }

    /// Sketch ids in creation order.
    pub fn sketch_ids(&self) -> impl Iterator<Item = SketchId> + '_ {
        self.sketches.keys().copied()
    }

    /// Extrude the sketch's first loop into a new body.
    ///
    /// Returns `Ok(None)` when the sketch has no closed loop.
    pub fn extrude(
        &mut self,
        sketch: SketchId,
        distance: f64,
        direction: ExtrudeDirection,
    ) -> Result<Option<MeshId>> {
        let source = self
            .sketches
            .get(&sketch)
            .ok_or(DocumentError::UnknownSketch(sketch))?;
        let Some(mesh) = source.to_geometry(distance, direction)? else {
            warn!(%sketch, "nothing to extrude");
            return Ok(None);
        };
        let id = self.insert_mesh(mesh, FaceOwner::Body);
        debug!(%sketch, mesh = %id, "extruded sketch into body");
        Ok(Some(id))
    }

    /// Register the sketch's profile faces as pickable meshes, one per loop.
    pub fn add_sketch_faces(&mut self, sketch: SketchId) -> Result<Vec<MeshId>> {
        let source = self
            .sketches
            .get(&sketch)
            .ok_or(DocumentError::UnknownSketch(sketch))?;
        let meshes = source.profile_face_meshes()?;
        Ok(meshes
            .into_iter()
            .map(|mesh| self.insert_mesh(mesh, FaceOwner::Sketch(sketch)))
            .collect())
    }

    // =========================================================================
    // Meshes
    // =========================================================================

    /// Register an externally built solid.
    pub fn add_body(&mut self, mesh: TriangleMesh) -> MeshId {
        self.insert_mesh(mesh, FaceOwner::Body)
    }

    fn insert_mesh(&mut self, mesh: TriangleMesh, owner: FaceOwner) -> MeshId {
        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;
        self.meshes.insert(
            id,
            Pickable {
                body: BodyMesh::new(id, mesh),
                owner,
            },
        );
        id
    }

    /// Look up a mesh.
    pub fn body(&self, id: MeshId) -> Option<&BodyMesh> {
        self.meshes.get(&id).map(|p| &p.body)
    }

    /// Owner a mesh was registered with.
    pub fn owner(&self, id: MeshId) -> Option<FaceOwner> {
        self.meshes.get(&id).map(|p| p.owner)
    }

    /// Mesh ids in creation order.
    pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.meshes.keys().copied()
    }

    /// Place a mesh in the world.
    pub fn set_transform(&mut self, id: MeshId, transform: Transform) -> Result<()> {
        self.pickable_mut(id)?.body.set_transform(transform);
        Ok(())
    }

    /// Swap in regenerated geometry and drop the stale face grouping.
    pub fn replace_geometry(&mut self, id: MeshId, mesh: TriangleMesh) -> Result<()> {
        self.pickable_mut(id)?.body.replace_geometry(mesh);
        self.faces.invalidate(id);
        Ok(())
    }

    /// Remove a mesh and its cached grouping.
    pub fn remove_mesh(&mut self, id: MeshId) -> Option<BodyMesh> {
        let removed = self.meshes.remove(&id)?;
        self.faces.invalidate(id);
        Some(removed.body)
    }

    fn pickable(&self, id: MeshId) -> Result<&Pickable> {
        self.meshes.get(&id).ok_or(DocumentError::UnknownMesh(id))
    }

    fn pickable_mut(&mut self, id: MeshId) -> Result<&mut Pickable> {
        self.meshes.get_mut(&id).ok_or(DocumentError::UnknownMesh(id))
    }

    // =========================================================================
    // Faces
    // =========================================================================

    /// Face grouping of a mesh, built on first use.
    pub fn face_groups(&mut self, id: MeshId) -> Result<&FaceGroups> {
        let pickable = self.meshes.get(&id).ok_or(DocumentError::UnknownMesh(id))?;
        Ok(self.faces.get_or_build(&pickable.body)?)
    }

    /// Resolve a renderer hit on a mesh to a face.
    ///
    /// `Ok(None)` means the hit is not selectable (a back face of a solid).
    pub fn pick(&mut self, id: MeshId, hit: &TriangleHit, camera: &Point3) -> Result<Option<FacePick>> {
        let pickable = self.meshes.get(&id).ok_or(DocumentError::UnknownMesh(id))?;
        Ok(self.faces.pick(&pickable.body, pickable.owner, hit, camera)?)
    }

    /// Outline of a face in world space.
    pub fn face_outline(&mut self, id: MeshId, group: FaceGroupId) -> Result<Vec<PerimeterEdge>> {
        let pickable = self.meshes.get(&id).ok_or(DocumentError::UnknownMesh(id))?;
        let transform = pickable.body.transform();
        let groups = self.faces.get_or_build(&pickable.body)?;
        Ok(groups
            .perimeter(group)?
            .iter()
            .map(|e| PerimeterEdge {
                start: transform.apply_point(&e.start),
                end: transform.apply_point(&e.end),
            })
            .collect())
    }

    /// Highlight overlay for a face, in world space.
    pub fn face_highlight(&mut self, id: MeshId, group: FaceGroupId) -> Result<TriangleMesh> {
        let pickable = self.meshes.get(&id).ok_or(DocumentError::UnknownMesh(id))?;
        let transform = pickable.body.transform();
        let groups = self.faces.get_or_build(&pickable.body)?;
        Ok(groups.group_mesh(group)?.transformed(transform))
    }

    /// Number of meshes with a cached grouping.
    pub fn cached_groupings(&self) -> usize {
        self.faces.len()
    }

    /// Whether a mesh id is registered.
    pub fn contains_mesh(&self, id: MeshId) -> bool {
        self.pickable(id).is_ok()
    }
}

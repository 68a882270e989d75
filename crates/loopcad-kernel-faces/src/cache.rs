//! Face groupings cached per mesh generation.

use std::collections::HashMap;
use std::fmt;

use loopcad_kernel_math::Transform;
use loopcad_kernel_tessellate::TriangleMesh;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::grouping::FaceGroups;
use crate::GroupingSettings;

/// Stable identity of a body mesh across geometry replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshId(pub u64);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh{}", self.0)
    }
}

/// Cache key: a mesh at one geometry generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshKey {
    /// Mesh identity.
    pub mesh: MeshId,
    /// Geometry generation.
    pub generation: u64,
}

/// A body's triangle mesh in local space, plus its placement in the world.
///
/// `generation` increases every time the geometry is replaced, so a cached
/// grouping can never be served for geometry it was not built from.
#[derive(Debug, Clone)]
pub struct BodyMesh {
    id: MeshId,
    generation: u64,
    mesh: TriangleMesh,
    transform: Transform,
}

impl BodyMesh {
    /// Wrap a mesh at generation 0 with an identity transform.
    pub fn new(id: MeshId, mesh: TriangleMesh) -> Self {
        Self {
            id,
            generation: 0,
            mesh,
            transform: Transform::identity(),
        }
    }

    /// Builder-style placement.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Mesh identity.
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Current geometry generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cache key for the current geometry.
    pub fn key(&self) -> MeshKey {
        MeshKey {
            mesh: self.id,
            generation: self.generation,
        }
    }

    /// Local-space triangles.
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Local to world transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Move the body. Grouping is done in local space, so the generation
    /// is unchanged.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Swap in regenerated geometry and bump the generation.
    pub fn replace_geometry(&mut self, mesh: TriangleMesh) {
        self.mesh = mesh;
        self.generation += 1;
        trace!(mesh = %self.id, generation = self.generation, "replaced body geometry");
    }
}

/// Hit and miss counters for a [`FaceGroupCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to group the mesh.
    pub misses: u64,
}

/// Face groupings keyed by `(mesh, generation)`.
#[derive(Debug, Default)]
pub struct FaceGroupCache {
    settings: GroupingSettings,
    entries: HashMap<MeshKey, FaceGroups>,
    stats: CacheStats,
}

impl FaceGroupCache {
    /// Empty cache with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache with custom settings.
    pub fn with_settings(settings: GroupingSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    /// Settings used for every build.
    pub fn settings(&self) -> &GroupingSettings {
        &self.settings
    }

    /// Grouping for the body's current geometry, building it on a miss.
    ///
    /// Building a generation drops any cached generation of the same mesh.
    pub fn get_or_build(&mut self, body: &BodyMesh) -> Result<&FaceGroups> {
        let key = body.key();
        let groups = match self.entries.remove(&key) {
            Some(groups) => {
                self.stats.hits += 1;
                trace!(mesh = %key.mesh, generation = key.generation, "face group cache hit");
                groups
            }
            None => {
                self.stats.misses += 1;
                let groups = FaceGroups::build(body.mesh(), &self.settings)?;
                let before = self.entries.len();
                self.entries.retain(|k, _| k.mesh != key.mesh);
                debug!(
                    mesh = %key.mesh,
                    generation = key.generation,
                    evicted = before - self.entries.len(),
                    "face group cache miss"
                );
                groups
            }
        };
        Ok(self.entries.entry(key).or_insert(groups))
    }

    /// Cached grouping for `key`, without building.
    pub fn get(&self, key: MeshKey) -> Option<&FaceGroups> {
        self.entries.get(&key)
    }

    /// Drop every cached generation of `mesh`. Returns whether anything was removed.
    pub fn invalidate(&mut self, mesh: MeshId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.mesh != mesh);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(mesh = %mesh, removed, "invalidated face groups");
        }
        removed > 0
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "cleared face group cache");
        self.entries.clear();
    }

    /// Number of cached groupings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit and miss counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

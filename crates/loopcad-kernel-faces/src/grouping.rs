//! Flood-fill grouping of coplanar, edge-adjacent triangles.
//!
//! Every triangle seeds a group unless an earlier group already claimed it.
//! From the seed, the group grows breadth-first: each wave scans all
//! unclaimed triangles and takes those whose normal is parallel to the
//! seed's (either sign) and which share an edge, by position, with the
//! triangle being expanded. Normals are always compared with the seed's,
//! never with the neighbour's.
//!
//! Cost is quadratic in the triangle count, which suits the low-poly bodies
//! a sketch extrusion produces.
//! TODO: bucket vertices in a hash grid so the adjacency scan only visits
//! nearby triangles on dense meshes.

use std::cell::OnceCell;
use std::collections::VecDeque;
use std::fmt;

use loopcad_kernel_math::{Point3, Tolerance, Vec3};
use loopcad_kernel_tessellate::TriangleMesh;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FaceError, Result};
use crate::perimeter::{perimeter_edges, PerimeterEdge};
use crate::GroupingSettings;

/// Index of a face group within one [`FaceGroups`].
///
/// Ids are dense, start at 0, and follow the order of each group's lowest
/// triangle index. They are stable for a given mesh and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceGroupId(pub usize);

impl fmt::Display for FaceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face{}", self.0)
    }
}

/// One logical face: a set of coplanar, connected triangles.
#[derive(Debug, Clone)]
pub struct FaceGroup {
    id: FaceGroupId,
    triangles: Vec<usize>,
    normal: Option<Vec3>,
    perimeter: OnceCell<Vec<PerimeterEdge>>,
}

impl FaceGroup {
    /// Group id.
    pub fn id(&self) -> FaceGroupId {
        self.id
    }

    /// Member triangle indices, ascending.
    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    /// Unit normal of the seed triangle, in mesh-local space.
    ///
    /// `None` for a degenerate triangle, which always forms its own group.
    pub fn normal(&self) -> Option<Vec3> {
        self.normal
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Always false; groups hold at least their seed.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Whether `triangle` belongs to this group.
    pub fn contains(&self, triangle: usize) -> bool {
        self.triangles.binary_search(&triangle).is_ok()
    }
}

/// Partition of a mesh's triangles into face groups.
#[derive(Debug, Clone)]
pub struct FaceGroups {
    groups: Vec<FaceGroup>,
    triangle_to_group: Vec<FaceGroupId>,
    corners: Vec<[Point3; 3]>,
    normals: Vec<Option<Vec3>>,
    perimeter_precision: f64,
}

impl FaceGroups {
    /// Group the triangles of `mesh`.
    ///
    /// Works on indexed meshes and on non-indexed soups alike; vertices are
    /// matched by position, never by index.
    ///
    /// # Errors
    ///
    /// Fails on invalid settings or buffers that do not describe whole
    /// triangles. An empty mesh gives an empty grouping.
    pub fn build(mesh: &TriangleMesh, settings: &GroupingSettings) -> Result<Self> {
        settings.validate()?;
        let corners = collect_triangles(mesh)?;
        let normals: Vec<Option<Vec3>> = corners.iter().map(triangle_normal).collect();

        let n = corners.len();
        let tol_sq = settings.adjacency_tolerance * settings.adjacency_tolerance;
        let mut claimed = vec![false; n];
        let mut groups: Vec<FaceGroup> = Vec::new();
        let mut degenerate = 0usize;

        for seed in 0..n {
            if claimed[seed] {
                continue;
            }
            claimed[seed] = true;
            let mut members = vec![seed];

            match normals[seed] {
                Some(seed_normal) => {
                    let mut queue = VecDeque::from([seed]);
                    while let Some(current) = queue.pop_front() {
                        for other in 0..n {
                            if claimed[other] {
                                continue;
                            }
                            let Some(other_normal) = normals[other] else {
                                continue;
                            };
                            if seed_normal.dot(&other_normal).abs() > settings.coplanar_dot
                                && shares_edge(&corners[current], &corners[other], tol_sq)
                            {
                                claimed[other] = true;
                                members.push(other);
                                queue.push_back(other);
                            }
                        }
                    }
                }
                None => degenerate += 1,
            }

            members.sort_unstable();
            groups.push(FaceGroup {
                id: FaceGroupId(groups.len()),
                triangles: members,
                normal: normals[seed],
                perimeter: OnceCell::new(),
            });
        }

        let mut triangle_to_group = vec![FaceGroupId(0); n];
        for group in &groups {
            for &t in &group.triangles {
                triangle_to_group[t] = group.id;
            }
        }

        debug!(
            triangles = n,
            groups = groups.len(),
            degenerate,
            "built face groups"
        );

        Ok(Self {
            groups,
            triangle_to_group,
            corners,
            normals,
            perimeter_precision: settings.perimeter_precision,
        })
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups (the mesh had no triangles).
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of triangles in the grouped mesh.
    pub fn num_triangles(&self) -> usize {
        self.corners.len()
    }

    /// Group containing `triangle`.
    pub fn group_of(&self, triangle: usize) -> Option<FaceGroupId> {
        self.triangle_to_group.get(triangle).copied()
    }

    /// Look up a group.
    pub fn group(&self, id: FaceGroupId) -> Option<&FaceGroup> {
        self.groups.get(id.0)
    }

    /// All groups, in id order.
    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    /// The group's normal in mesh-local space.
    pub fn group_normal(&self, id: FaceGroupId) -> Option<Vec3> {
        self.group(id)?.normal
    }

    /// Unit normal of one triangle in mesh-local space.
    pub fn triangle_normal(&self, triangle: usize) -> Option<Vec3> {
        self.normals.get(triangle).copied().flatten()
    }

    /// Corner positions of one triangle in mesh-local space.
    pub fn triangle_corners(&self, triangle: usize) -> Option<&[Point3; 3]> {
        self.corners.get(triangle)
    }

    /// Outline of a group: edges used by exactly one of its triangles.
    ///
    /// Computed on first request and kept for later calls.
    pub fn perimeter(&self, id: FaceGroupId) -> Result<&[PerimeterEdge]> {
        let group = self.group(id).ok_or(FaceError::UnknownGroup(id))?;
        let edges: &Vec<PerimeterEdge> = group.perimeter.get_or_init(|| {
            perimeter_edges(
                group.triangles.iter().map(|&t| &self.corners[t]),
                self.perimeter_precision,
            )
        });
        Ok(edges.as_slice())
    }

    /// Highlight overlay: a mesh holding only the group's triangles.
    ///
    /// Vertices carry the group normal, or the zero vector for a degenerate
    /// singleton.
    pub fn group_mesh(&self, id: FaceGroupId) -> Result<TriangleMesh> {
        let group = self.group(id).ok_or(FaceError::UnknownGroup(id))?;
        let normal = group.normal.unwrap_or_else(Vec3::zeros);
        let mut mesh = TriangleMesh::new();
        for &t in &group.triangles {
            let [a, b, c] = &self.corners[t];
            let ia = mesh.push_vertex(a, &normal);
            let ib = mesh.push_vertex(b, &normal);
            let ic = mesh.push_vertex(c, &normal);
            mesh.push_triangle(ia, ib, ic);
        }
        Ok(mesh)
    }
}

/// Unit normal `normalize((b - a) × (c - a))`, or `None` for a zero-area triangle.
pub fn triangle_normal(corners: &[Point3; 3]) -> Option<Vec3> {
    let [a, b, c] = corners;
    let n = (b - a).cross(&(c - a));
    if Tolerance::DEFAULT.is_zero_vec(&n) {
        return None;
    }
    Some(n.normalize())
}

/// At least two corners of `a` lie within tolerance of some corner of `b`.
fn shares_edge(a: &[Point3; 3], b: &[Point3; 3], tol_sq: f64) -> bool {
    a.iter()
        .filter(|p| b.iter().any(|q| (*p - q).norm_squared() <= tol_sq))
        .count()
        >= 2
}

fn collect_triangles(mesh: &TriangleMesh) -> Result<Vec<[Point3; 3]>> {
    if mesh.vertices.len() % 3 != 0 {
        return Err(FaceError::MalformedMesh(format!(
            "vertex buffer length {} is not a multiple of 3",
            mesh.vertices.len()
        )));
    }
    if mesh.is_indexed() {
        if mesh.indices.len() % 3 != 0 {
            return Err(FaceError::MalformedMesh(format!(
                "index buffer length {} is not a multiple of 3",
                mesh.indices.len()
            )));
        }
        let nv = mesh.num_vertices();
        if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= nv) {
            return Err(FaceError::MalformedMesh(format!(
                "index {bad} out of range for {nv} vertices"
            )));
        }
    } else if mesh.num_vertices() % 3 != 0 {
        return Err(FaceError::MalformedMesh(format!(
            "non-indexed mesh has {} vertices, not a multiple of 3",
            mesh.num_vertices()
        )));
    }

    (0..mesh.num_triangles())
        .map(|t| {
            mesh.triangle(t).ok_or(FaceError::TriangleOutOfRange {
                triangle: t,
                count: mesh.num_triangles(),
            })
        })
        .collect()
}

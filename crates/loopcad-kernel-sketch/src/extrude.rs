//! Linear extrusion of closed sketch profiles.

use loopcad_kernel_math::{Point2, Point3, Tolerance, Vec3};
use loopcad_kernel_tessellate::{signed_area, triangulate_polygon, TriangleMesh};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::Sketch;
use crate::plane::Plane;
use crate::SketchError;

/// Which side of the sketch plane an extrusion grows towards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtrudeDirection {
    /// Along the plane normal.
    #[default]
    Forward,
    /// Against the plane normal.
    Reverse,
}

impl ExtrudeDirection {
    /// `1.0` for [`Forward`](Self::Forward), `-1.0` for [`Reverse`](Self::Reverse).
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Sweep a closed profile along the plane normal by `distance`.
///
/// The profile is in plane (u, v) coordinates and may be wound either way.
/// The output is in world space with outward-facing triangles and flat
/// per-face normals; vertices are not shared between faces.
///
/// # Errors
///
/// - [`SketchError::InvalidDistance`] if `distance` is not positive and finite.
/// - [`SketchError::TooFewVertices`] for fewer than three profile points.
/// - [`SketchError::ZeroArea`] if the profile encloses no area.
pub fn extrude(
    plane: &Plane,
    profile: &[Point2],
    distance: f64,
    direction: ExtrudeDirection,
) -> Result<TriangleMesh, SketchError> {
    if !distance.is_finite() || distance <= 0.0 {
        return Err(SketchError::InvalidDistance(distance));
    }
    let ring = counter_clockwise(profile)?;
    let tris = triangulate_polygon(&ring);

    let sign = direction.sign();
    let normal = plane.normal().into_inner();
    let offset = normal * (sign * distance);

    let base: Vec<Point3> = ring.iter().map(|p| plane.to_world_point(p)).collect();
    let top: Vec<Point3> = base.iter().map(|p| p + offset).collect();

    let mut mesh = TriangleMesh::new();

    // A counter-clockwise (u, v) triangle faces +normal. The far cap faces
    // the sweep direction and the base cap faces away from it.
    push_cap(&mut mesh, &top, &tris, &(normal * sign), sign < 0.0);
    push_cap(&mut mesh, &base, &tris, &(normal * -sign), sign > 0.0);

    let n = ring.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let edge = base[j] - base[i];
        let side = edge.cross(&normal);
        if Tolerance::DEFAULT.is_zero_vec(&side) {
            continue;
        }
        let side = side.normalize();

        let quad = [base[i], base[j], top[j], top[i]];
        let idx: Vec<u32> = quad.iter().map(|p| mesh.push_vertex(p, &side)).collect();
        if sign > 0.0 {
            mesh.push_triangle(idx[0], idx[1], idx[2]);
            mesh.push_triangle(idx[0], idx[2], idx[3]);
        } else {
            mesh.push_triangle(idx[0], idx[2], idx[1]);
            mesh.push_triangle(idx[0], idx[3], idx[2]);
        }
    }

    debug!(
        profile_vertices = n,
        triangles = mesh.num_triangles(),
        distance,
        ?direction,
        "extruded profile"
    );
    Ok(mesh)
}

/// Flat fill of a closed profile, visible from both sides of the plane.
///
/// Every triangle is emitted twice: once facing the plane normal and once
/// facing away from it.
pub fn profile_face_mesh(plane: &Plane, profile: &[Point2]) -> Result<TriangleMesh, SketchError> {
    let ring = counter_clockwise(profile)?;
    let tris = triangulate_polygon(&ring);
    let world: Vec<Point3> = ring.iter().map(|p| plane.to_world_point(p)).collect();
    let normal = plane.normal().into_inner();

    let mut mesh = TriangleMesh::new();
    push_cap(&mut mesh, &world, &tris, &normal, false);
    push_cap(&mut mesh, &world, &tris, &-normal, true);
    Ok(mesh)
}

/// Validate a profile and return it wound counter-clockwise.
fn counter_clockwise(profile: &[Point2]) -> Result<Vec<Point2>, SketchError> {
    if profile.len() < 3 {
        return Err(SketchError::TooFewVertices(profile.len()));
    }
    let area = signed_area(profile);
    if !area.is_finite() || area.abs() <= Tolerance::DEFAULT.linear {
        return Err(SketchError::ZeroArea);
    }
    let mut ring = profile.to_vec();
    if area < 0.0 {
        ring.reverse();
    }
    Ok(ring)
}

fn push_cap(mesh: &mut TriangleMesh, ring: &[Point3], tris: &[[usize; 3]], normal: &Vec3, flip: bool) {
    let base = mesh.num_vertices() as u32;
    for p in ring {
        mesh.push_vertex(p, normal);
    }
    for &[a, b, c] in tris {
        let (a, b, c) = (base + a as u32, base + b as u32, base + c as u32);
        if flip {
            mesh.push_triangle(a, c, b);
        } else {
            mesh.push_triangle(a, b, c);
        }
    }
}

impl Sketch {
    /// Extrude the first detected loop.
    ///
    /// Returns `Ok(None)` when the sketch has no closed loop. Additional
    /// loops are ignored.
    pub fn to_geometry(
        &self,
        distance: f64,
        direction: ExtrudeDirection,
    ) -> Result<Option<TriangleMesh>, SketchError> {
        let loops = self.detect_closed_loops();
        let Some(first) = loops.first() else {
            warn!("sketch has no closed loop to extrude");
            return Ok(None);
        };
        if loops.len() > 1 {
            debug!(loops = loops.len(), "extruding the first loop only");
        }
        let profile = self.loop_points(first)?;
        extrude(self.plane(), &profile, distance, direction).map(Some)
    }

    /// One double-sided face mesh per detected loop, in loop order.
    ///
    /// Loops whose profile encloses no area are skipped.
    pub fn profile_face_meshes(&self) -> Result<Vec<TriangleMesh>, SketchError> {
        let mut meshes = Vec::new();
        for lp in self.detect_closed_loops() {
            let profile = self.loop_points(&lp)?;
            match profile_face_mesh(self.plane(), &profile) {
                Ok(mesh) => meshes.push(mesh),
                Err(SketchError::ZeroArea) => {
                    debug!(edges = lp.len(), "skipping zero-area loop");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(meshes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn square(half: f64) -> Vec<Point2> {
        vec![
            Point2::new(-half, -half),
            Point2::new(half, -half),
            Point2::new(half, half),
            Point2::new(-half, half),
        ]
    }

    #[test]
    fn test_square_extrude_counts() {
        let mesh = extrude(&Plane::xy(), &square(1.0), 3.0, ExtrudeDirection::Forward).unwrap();
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_relative_eq!(mesh.signed_volume(), 12.0, epsilon = 1e-5);
        assert_relative_eq!(mesh.surface_area(), 2.0 * 4.0 + 4.0 * 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_square_extrude_bounds() {
        let mesh = extrude(&Plane::xy(), &square(1.0), 3.0, ExtrudeDirection::Forward).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_abs_diff_eq!(min, Point3::new(-1.0, -1.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(max, Point3::new(1.0, 1.0, 3.0), epsilon = 1e-6);
    }

    #[test]
    fn test_reverse_grows_against_normal() {
        let mesh = extrude(&Plane::xy(), &square(1.0), 2.0, ExtrudeDirection::Reverse).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_abs_diff_eq!(min.z, -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(max.z, 0.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_clockwise_profile_still_outward() {
        let mut cw = square(1.0);
        cw.reverse();
        let mesh = extrude(&Plane::yz(), &cw, 1.5, ExtrudeDirection::Forward).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_face_normals_point_outward() {
        let mesh = extrude(&Plane::xy(), &square(1.0), 3.0, ExtrudeDirection::Forward).unwrap();
        let centroid = Point3::new(0.0, 0.0, 1.5);
        for t in 0..mesh.num_triangles() {
            let [a, b, c] = mesh.triangle(t).unwrap();
            let n = (b - a).cross(&(c - a));
            let center = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            assert!(n.dot(&(center - centroid)) > 0.0, "triangle {t} faces inward");

            let [i, _, _] = mesh.triangle_indices(t).unwrap();
            let stored = Vec3::new(
                mesh.normals[i * 3] as f64,
                mesh.normals[i * 3 + 1] as f64,
                mesh.normals[i * 3 + 2] as f64,
            );
            assert_abs_diff_eq!(stored, n.normalize(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_tilted_plane_extent_along_normal() {
        let plane = Plane::from_normal(Vec3::new(1.0, 1.0, 1.0), Point3::new(2.0, 0.0, 0.0)).unwrap();
        let mesh = extrude(&plane, &square(0.5), 4.0, ExtrudeDirection::Forward).unwrap();
        let (lo, hi) = (0..mesh.num_vertices())
            .filter_map(|i| mesh.vertex(i))
            .map(|p| plane.distance_to(&p))
            .fold((f64::MAX, f64::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
        assert_abs_diff_eq!(lo, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hi, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_inputs() {
        let plane = Plane::xy();
        let fwd = ExtrudeDirection::Forward;
        assert!(matches!(
            extrude(&plane, &square(1.0), 0.0, fwd),
            Err(SketchError::InvalidDistance(_))
        ));
        assert!(matches!(
            extrude(&plane, &square(1.0), f64::NAN, fwd),
            Err(SketchError::InvalidDistance(_))
        ));
        assert!(matches!(
            extrude(&plane, &square(1.0)[..2], 1.0, fwd),
            Err(SketchError::TooFewVertices(2))
        ));
        let collinear = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(matches!(
            extrude(&plane, &collinear, 1.0, fwd),
            Err(SketchError::ZeroArea)
        ));
    }

    #[test]
    fn test_profile_face_is_double_sided() {
        let mesh = profile_face_mesh(&Plane::xz(), &square(1.0)).unwrap();
        assert_eq!(mesh.num_triangles(), 4);
        assert_relative_eq!(mesh.surface_area(), 8.0, epsilon = 1e-5);
        for p in (0..mesh.num_vertices()).filter_map(|i| mesh.vertex(i)) {
            assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_to_geometry_without_loops() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0).id;
        let b = sketch.add_vertex(1.0, 0.0).id;
        sketch.add_line(a, b);
        assert!(sketch
            .to_geometry(1.0, ExtrudeDirection::Forward)
            .unwrap()
            .is_none());
        assert!(sketch.profile_face_meshes().unwrap().is_empty());
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(
            serde_json::to_string(&ExtrudeDirection::Reverse).unwrap(),
            "\"reverse\""
        );
        assert_eq!(ExtrudeDirection::default().sign(), 1.0);
    }
}

#![warn(missing_docs)]

//! Triangle mesh buffers for the loopcad kernel.
//!
//! [`TriangleMesh`] is the flat, GPU-ready layout shared by extrusion output,
//! sketch face meshes and the face grouping engine. [`triangulate_polygon`]
//! turns a simple 2D polygon into triangles by ear clipping.

mod triangulate;

pub use triangulate::{signed_area, triangulate_polygon};

use loopcad_kernel_math::{Point3, Transform, Vec3};

/// Output triangle mesh for rendering and picking.
///
/// When `indices` is empty the mesh is a non-indexed soup: every three
/// consecutive vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals, same length as `vertices` or empty.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the mesh uses an index buffer.
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        if self.is_indexed() {
            self.indices.len() / 3
        } else {
            self.num_vertices() / 3
        }
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: usize) -> Option<Point3> {
        let v = self.vertices.get(i * 3..i * 3 + 3)?;
        Some(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
    }

    /// Vertex indices of triangle `t`.
    pub fn triangle_indices(&self, t: usize) -> Option<[usize; 3]> {
        if t >= self.num_triangles() {
            return None;
        }
        if self.is_indexed() {
            let tri = &self.indices[t * 3..t * 3 + 3];
            Some([tri[0] as usize, tri[1] as usize, tri[2] as usize])
        } else {
            Some([t * 3, t * 3 + 1, t * 3 + 2])
        }
    }

    /// Corner positions of triangle `t`, or `None` if it is out of range or
    /// references a vertex past the end of the buffer.
    pub fn triangle(&self, t: usize) -> Option<[Point3; 3]> {
        let [a, b, c] = self.triangle_indices(t)?;
        Some([self.vertex(a)?, self.vertex(b)?, self.vertex(c)?])
    }

    /// Append a vertex with its normal and return its index.
    pub fn push_vertex(&mut self, p: &Point3, n: &Vec3) -> u32 {
        let idx = self.num_vertices() as u32;
        self.vertices
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        self.normals
            .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        idx
    }

    /// Append a triangle by vertex indices.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Copy of the mesh with positions and normals mapped by `transform`.
    ///
    /// Normals go through the inverse transpose and are renormalized; zero
    /// normals stay zero. Indices are unchanged.
    pub fn transformed(&self, transform: &Transform) -> TriangleMesh {
        let vertices = self
            .vertices
            .chunks_exact(3)
            .flat_map(|v| {
                let p = Point3::new(v[0] as f64, v[1] as f64, v[2] as f64);
                let p = transform.apply_point(&p);
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect();
        let normals = self
            .normals
            .chunks_exact(3)
            .flat_map(|n| {
                let n = transform.apply_normal(&Vec3::new(n[0] as f64, n[1] as f64, n[2] as f64));
                let n = n.try_normalize(0.0).unwrap_or(n);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();
        TriangleMesh {
            vertices,
            indices: self.indices.clone(),
            normals,
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        if self.vertices.len() < 3 {
            return None;
        }

        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);

        for v in self.vertices.chunks_exact(3) {
            let (x, y, z) = (v[0] as f64, v[1] as f64, v[2] as f64);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        }

        Some((min, max))
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.num_triangles())
            .filter_map(|t| self.triangle(t))
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() / 2.0)
            .sum()
    }

    /// Enclosed volume by the divergence theorem (positive for outward winding).
    pub fn signed_volume(&self) -> f64 {
        (0..self.num_triangles())
            .filter_map(|t| self.triangle(t))
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum::<f64>()
            / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_cube_mesh() -> TriangleMesh {
        let size = 10.0f32;
        let vertices = vec![
            0.0, 0.0, 0.0, size, 0.0, 0.0, size, size, 0.0, 0.0, size, 0.0,
            0.0, 0.0, size, size, 0.0, size, size, size, size, 0.0, size, size,
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2,
            4, 5, 6, 4, 6, 7,
            0, 1, 5, 0, 5, 4,
            2, 3, 7, 2, 7, 6,
            0, 4, 7, 0, 7, 3,
            1, 2, 6, 1, 6, 5,
        ];
        TriangleMesh {
            vertices,
            indices,
            normals: Vec::new(),
        }
    }

    #[test]
    fn test_cube_counts_and_bounds() {
        let mesh = make_cube_mesh();
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.num_vertices(), 8);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min, Point3::origin());
        assert_relative_eq!(max, Point3::new(10.0, 10.0, 10.0));
    }

    #[test]
    fn test_cube_volume_and_area() {
        let mesh = make_cube_mesh();
        assert_relative_eq!(mesh.signed_volume(), 1000.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.surface_area(), 600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_non_indexed_soup() {
        let mesh = TriangleMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: Vec::new(),
            normals: Vec::new(),
        };
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.triangle_indices(0), Some([0, 1, 2]));
        assert!(mesh.triangle(1).is_none());
    }

    #[test]
    fn test_triangle_with_bad_index() {
        let mesh = TriangleMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 7],
            normals: Vec::new(),
        };
        assert!(mesh.triangle(0).is_none());
    }

    #[test]
    fn test_transformed_moves_points_and_turns_normals() {
        let mesh = make_cube_mesh();
        let quarter = Transform::rotation_about_axis(&Vec3::z_axis(), std::f64::consts::FRAC_PI_2);
        let moved = mesh.transformed(&Transform::translation(0.0, 0.0, 5.0));
        let (min, max) = moved.bounds().unwrap();
        assert_relative_eq!(min.z, 5.0, epsilon = 1e-6);
        assert_relative_eq!(max.z, 6.0, epsilon = 1e-6);
        assert_eq!(moved.indices, mesh.indices);

        let turned = TriangleMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: Vec::new(),
            normals: vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        }
        .transformed(&quarter);
        assert_relative_eq!(turned.normals[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(turned.normals[1], 1.0, epsilon = 1e-6);
        assert_eq!(&turned.normals[6..], &[0.0, 0.0, 0.0]);
        assert_relative_eq!(turned.vertices[4], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_bounds() {
        assert!(TriangleMesh::new().bounds().is_none());
        assert!(TriangleMesh::new().is_empty());
    }
}

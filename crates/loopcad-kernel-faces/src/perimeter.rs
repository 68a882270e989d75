//! Boundary edges of a triangle patch.

use std::collections::HashMap;

use loopcad_kernel_math::Point3;
use serde::{Deserialize, Serialize};

/// One outline segment, oriented as it appears in its triangle's winding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerimeterEdge {
    /// First endpoint, mesh-local space.
    pub start: Point3,
    /// Second endpoint, mesh-local space.
    pub end: Point3,
}

impl PerimeterEdge {
    /// Segment length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

type PointKey = [i64; 3];

fn quantize(p: &Point3, precision: f64) -> PointKey {
    [
        (p.x / precision).round() as i64,
        (p.y / precision).round() as i64,
        (p.z / precision).round() as i64,
    ]
}

/// Edges used by exactly one of `triangles`.
///
/// Endpoints are snapped to a grid of size `precision` before comparison,
/// so the two copies of a shared edge in an unwelded mesh match. Edges seen
/// two or more times are interior. Edges that collapse to a point are
/// ignored. Output follows first appearance.
pub fn perimeter_edges<'a>(
    triangles: impl IntoIterator<Item = &'a [Point3; 3]>,
    precision: f64,
) -> Vec<PerimeterEdge> {
    let mut index: HashMap<(PointKey, PointKey), usize> = HashMap::new();
    let mut edges: Vec<(PerimeterEdge, usize)> = Vec::new();

    for tri in triangles {
        for i in 0..3 {
            let (a, b) = (tri[i], tri[(i + 1) % 3]);
            let (ka, kb) = (quantize(&a, precision), quantize(&b, precision));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            match index.get(&key) {
                Some(&slot) => edges[slot].1 += 1,
                None => {
                    index.insert(key, edges.len());
                    edges.push((PerimeterEdge { start: a, end: b }, 1));
                }
            }
        }
    }

    edges
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(edge, _)| edge)
        .collect()
}

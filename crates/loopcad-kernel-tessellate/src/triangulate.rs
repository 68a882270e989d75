//! Ear-clipping triangulation of simple 2D polygons.

use loopcad_kernel_math::Point2;

/// Signed area of a closed polygon (positive when counter-clockwise).
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area / 2.0
}

/// Triangulate a simple polygon given in either winding.
///
/// Returns triangles as index triples into `points`, each wound
/// counter-clockwise. Polygons with fewer than three points produce nothing.
/// If no ear can be found (self-intersecting input) the remainder is fanned.
pub fn triangulate_polygon(points: &[Point2]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    if signed_area(points) < 0.0 {
        remaining.reverse();
    }

    let mut out = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let mut ear = None;

        for i in 0..m {
            let prev = remaining[(i + m - 1) % m];
            let cur = remaining[i];
            let next = remaining[(i + 1) % m];

            let (a, b, c) = (points[prev], points[cur], points[next]);
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if cross <= 0.0 {
                continue;
            }

            let blocked = remaining
                .iter()
                .filter(|&&j| j != prev && j != cur && j != next)
                .any(|&j| point_in_triangle(points[j], a, b, c));

            if !blocked {
                ear = Some(i);
                break;
            }
        }

        match ear {
            Some(i) => {
                let m = remaining.len();
                out.push([
                    remaining[(i + m - 1) % m],
                    remaining[i],
                    remaining[(i + 1) % m],
                ]);
                remaining.remove(i);
            }
            None => {
                for k in 1..remaining.len() - 1 {
                    out.push([remaining[0], remaining[k], remaining[k + 1]]);
                }
                return out;
            }
        }
    }

    out.push([remaining[0], remaining[1], remaining[2]]);
    out
}

/// Strict interior test via barycentric coordinates.
fn point_in_triangle(p: Point2, a: Point2, b: Point2, c: Point2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < f64::EPSILON {
        return false;
    }
    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    let eps = 1e-10;
    u > eps && v > eps && (u + v) < 1.0 - eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn total_area(points: &[Point2], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum()
    }

    #[test]
    fn test_square_either_winding() {
        let ccw = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let mut cw = ccw.clone();
        cw.reverse();

        for pts in [ccw, cw] {
            let tris = triangulate_polygon(&pts);
            assert_eq!(tris.len(), 2);
            assert_relative_eq!(total_area(&pts, &tris), 4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_concave_l_shape() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let tris = triangulate_polygon(&pts);
        assert_eq!(tris.len(), 4);
        // Every triangle is CCW, so no area is cancelled out.
        for t in &tris {
            assert!(signed_area(&[pts[t[0]], pts[t[1]], pts[t[2]]]) > 0.0);
        }
        assert_relative_eq!(total_area(&pts, &tris), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        assert!(triangulate_polygon(&[Point2::origin(), Point2::new(1.0, 0.0)]).is_empty());
        assert_eq!(signed_area(&[Point2::origin()]), 0.0);
    }
}

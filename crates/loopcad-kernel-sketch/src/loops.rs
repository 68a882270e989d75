//! Closed-loop detection over the sketch graph.
//!
//! Loops are found greedily: edges are tried in id order as starting points
//! and each attempt walks forward taking the first free incident edge. An
//! edge claimed by an accepted loop is never reused. On graphs where a
//! vertex has more than two incident edges the result depends on edge order
//! and is not guaranteed to be the best partition.

use std::collections::{HashMap, HashSet};

use loopcad_kernel_math::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::graph::{Edge, EdgeId, Sketch, Vertex, VertexId};
use crate::SketchError;

/// Loop detection limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Maximum number of edges a single walk may take before it is abandoned.
    pub max_walk_steps: usize,
    /// Minimum number of edges for a closed walk to count as a loop.
    pub min_loop_edges: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_walk_steps: 100,
            min_loop_edges: 3,
        }
    }
}

impl LoopSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<(), SketchError> {
        if self.min_loop_edges < 3 {
            return Err(SketchError::InvalidSettings(
                "min_loop_edges must be at least 3".into(),
            ));
        }
        if self.max_walk_steps < self.min_loop_edges {
            return Err(SketchError::InvalidSettings(
                "max_walk_steps must not be below min_loop_edges".into(),
            ));
        }
        Ok(())
    }
}

/// A closed walk over sketch edges, in traversal order.
///
/// Loops are derived values: they are recomputed from the current sketch and
/// hold no references into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loop {
    edges: Vec<EdgeId>,
}

impl Loop {
    /// Wrap an ordered edge list.
    pub fn from_edges(edges: Vec<EdgeId>) -> Self {
        Self { edges }
    }

    /// Edge ids in traversal order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the loop has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Vertex id to incident edge ids, in edge id order.
type Adjacency = HashMap<VertexId, Vec<EdgeId>>;

impl Sketch {
    /// Find closed loops with default [`LoopSettings`].
    pub fn detect_closed_loops(&self) -> Vec<Loop> {
        self.detect_closed_loops_with(&LoopSettings::default())
    }

    /// Find closed loops.
    ///
    /// Never fails: dangling edges, self-loops, open chains and walks that
    /// exceed the step limit are left out of the result.
    pub fn detect_closed_loops_with(&self, settings: &LoopSettings) -> Vec<Loop> {
        let min_edges = settings.min_loop_edges.max(3);
        let adjacency = self.build_adjacency();

        let mut visited: HashSet<EdgeId> = HashSet::new();
        let mut loops = Vec::new();
        let mut rejected = 0usize;

        for edge in self.edges.values() {
            if visited.contains(&edge.id) || !self.is_traversable(edge) {
                continue;
            }

            match self.walk_loop(edge, &adjacency, &visited, settings.max_walk_steps, min_edges) {
                Some(edges) => {
                    visited.extend(edges.iter().copied());
                    loops.push(Loop { edges });
                }
                None => {
                    trace!(start = %edge.id, "no closed loop from edge");
                    rejected += 1;
                }
            }
        }

        debug!(
            edges = self.edges.len(),
            loops = loops.len(),
            rejected,
            "detected closed loops"
        );
        loops
    }

    /// Vertices of a loop in traversal order, without repeating the first.
    ///
    /// The walk starts at the first edge's `v1`, so the list has exactly
    /// `lp.len()` entries.
    pub fn loop_vertices(&self, lp: &Loop) -> Result<Vec<Vertex>, SketchError> {
        let Some(&first_id) = lp.edges.first() else {
            return Ok(Vec::new());
        };
        let first = self.edge(first_id)?;
        let start = first.v1;
        let mut current = start;
        let mut out = Vec::with_capacity(lp.len());

        for &edge_id in &lp.edges {
            let edge = self.edge(edge_id)?;
            let vertex = self
                .get_vertex(current)
                .ok_or(SketchError::MissingVertex(current))?;
            out.push(*vertex);
            current = edge
                .opposite(current)
                .ok_or(SketchError::BrokenLoop(edge_id))?;
        }

        if current != start {
            let last = lp.edges[lp.len() - 1];
            return Err(SketchError::BrokenLoop(last));
        }
        Ok(out)
    }

    /// Loop vertex positions in plane coordinates.
    pub fn loop_points(&self, lp: &Loop) -> Result<Vec<Point2>, SketchError> {
        Ok(self
            .loop_vertices(lp)?
            .iter()
            .map(Vertex::position)
            .collect())
    }

    /// Loop vertex positions in world space.
    pub fn loop_world_points(&self, lp: &Loop) -> Result<Vec<Point3>, SketchError> {
        Ok(self
            .loop_vertices(lp)?
            .iter()
            .map(|v| self.plane().to_world(v.u, v.v))
            .collect())
    }

    fn edge(&self, id: EdgeId) -> Result<&Edge, SketchError> {
        self.get_edge(id).ok_or(SketchError::MissingEdge(id))
    }

    /// An edge takes part in loops only if both endpoints exist and differ.
    fn is_traversable(&self, edge: &Edge) -> bool {
        edge.v1 != edge.v2
            && self.vertices.contains_key(&edge.v1)
            && self.vertices.contains_key(&edge.v2)
    }

    fn build_adjacency(&self) -> Adjacency {
        let mut adjacency: Adjacency = HashMap::new();
        for edge in self.edges.values() {
            if !self.is_traversable(edge) {
                trace!(edge = %edge.id, "skipping edge with missing or repeated endpoint");
                continue;
            }
            adjacency.entry(edge.v1).or_default().push(edge.id);
            adjacency.entry(edge.v2).or_default().push(edge.id);
        }
        adjacency
    }

    /// Walk from `start.v2` back to `start.v1` without reusing edges.
    fn walk_loop(
        &self,
        start: &Edge,
        adjacency: &Adjacency,
        visited: &HashSet<EdgeId>,
        max_steps: usize,
        min_edges: usize,
    ) -> Option<Vec<EdgeId>> {
        let target = start.v1;
        let mut current = start.v2;
        let mut path = vec![start.id];
        let mut used: HashSet<EdgeId> = HashSet::from([start.id]);

        loop {
            if current == target {
                return (path.len() >= min_edges).then_some(path);
            }
            if path.len() >= max_steps {
                return None;
            }

            let next_id = *adjacency
                .get(&current)?
                .iter()
                .find(|id| !visited.contains(id) && !used.contains(id))?;
            let next = self.edges.get(&next_id)?;

            current = next.opposite(current)?;
            path.push(next_id);
            used.insert(next_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::plane::Plane;

    fn polygon(sketch: &mut Sketch, pts: &[(f64, f64)]) -> Vec<VertexId> {
        let ids: Vec<VertexId> = pts.iter().map(|&(u, v)| sketch.add_vertex(u, v).id).collect();
        for i in 0..ids.len() {
            sketch.add_line(ids[i], ids[(i + 1) % ids.len()]);
        }
        ids
    }

    #[test]
    fn test_box_gives_one_loop() {
        let mut sketch = Sketch::new(Plane::xy());
        let ids = polygon(&mut sketch, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);

        let loops = sketch.detect_closed_loops();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);

        let verts: Vec<VertexId> = sketch
            .loop_vertices(&loops[0])
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(verts, ids);
    }

    #[test]
    fn test_open_chain_has_no_loop() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0).id;
        let b = sketch.add_vertex(1.0, 0.0).id;
        let c = sketch.add_vertex(1.0, 1.0).id;
        sketch.add_line(a, b);
        sketch.add_line(b, c);
        assert!(sketch.detect_closed_loops().is_empty());
    }

    #[test]
    fn test_dangling_edge_is_ignored() {
        let mut sketch = Sketch::new(Plane::xy());
        let ids = polygon(&mut sketch, &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        sketch.add_line(ids[0], VertexId(99));
        sketch.add_line(VertexId(98), VertexId(99));

        let loops = sketch.detect_closed_loops();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].edges(), &[EdgeId(0), EdgeId(1), EdgeId(2)]);
    }

    #[test]
    fn test_only_dangling_edges() {
        let mut sketch = Sketch::new(Plane::xy());
        sketch.add_edge(VertexId(1), VertexId(2), EdgeKind::Line);
        sketch.add_edge(VertexId(2), VertexId(3), EdgeKind::Line);
        sketch.add_edge(VertexId(3), VertexId(1), EdgeKind::Line);
        assert!(sketch.detect_closed_loops().is_empty());
    }

    #[test]
    fn test_edge_direction_does_not_matter() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0).id;
        let b = sketch.add_vertex(1.0, 0.0).id;
        let c = sketch.add_vertex(0.0, 1.0).id;
        sketch.add_line(a, b);
        sketch.add_line(c, b);
        sketch.add_line(c, a);

        let loops = sketch.detect_closed_loops();
        assert_eq!(loops.len(), 1);
        let verts: Vec<VertexId> = sketch
            .loop_vertices(&loops[0])
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(verts, vec![a, b, c]);
    }

    #[test]
    fn test_two_parallel_edges_are_not_a_loop() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0).id;
        let b = sketch.add_vertex(1.0, 0.0).id;
        sketch.add_line(a, b);
        sketch.add_line(b, a);
        assert!(sketch.detect_closed_loops().is_empty());
    }

    #[test]
    fn test_disjoint_shapes_in_edge_order() {
        let mut sketch = Sketch::new(Plane::xy());
        polygon(&mut sketch, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        polygon(&mut sketch, &[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0)]);

        let loops = sketch.detect_closed_loops();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].len(), 3);
        assert_eq!(loops[1].len(), 4);
        assert_eq!(loops[1].edges()[0], EdgeId(3));
    }

    #[test]
    fn test_shared_edge_claims_first_loop_only() {
        // Two unit squares sharing the edge (1,0)-(1,1). The first square
        // claims the shared edge, so the second can no longer close.
        let mut sketch = Sketch::new(Plane::xy());
        let v: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (2.0, 0.0), (2.0, 1.0)]
            .iter()
            .map(|&(u, w)| sketch.add_vertex(u, w).id)
            .collect();
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0), (1, 4), (4, 5), (5, 2)] {
            sketch.add_line(v[a], v[b]);
        }

        let loops = sketch.detect_closed_loops();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].edges(), &[EdgeId(0), EdgeId(1), EdgeId(2), EdgeId(3)]);

        // Same input, same answer.
        assert_eq!(sketch.detect_closed_loops(), loops);
    }

    #[test]
    fn test_walk_step_limit() {
        let mut sketch = Sketch::new(Plane::xy());
        let pts: Vec<(f64, f64)> = (0..150)
            .map(|i| {
                let t = i as f64 / 150.0 * std::f64::consts::TAU;
                (t.cos(), t.sin())
            })
            .collect();
        polygon(&mut sketch, &pts);

        assert!(sketch.detect_closed_loops().is_empty());

        let settings = LoopSettings {
            max_walk_steps: 200,
            ..Default::default()
        };
        let loops = sketch.detect_closed_loops_with(&settings);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 150);
    }

    #[test]
    fn test_self_loop_edge_is_skipped() {
        let mut sketch = Sketch::new(Plane::xy());
        let ids = polygon(&mut sketch, &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        sketch.add_line(ids[1], ids[1]);
        assert_eq!(sketch.detect_closed_loops().len(), 1);
    }

    #[test]
    fn test_loop_world_points() {
        let mut sketch = Sketch::new(Plane::xz());
        polygon(&mut sketch, &[(0.0, 0.0), (2.0, 0.0), (2.0, 3.0)]);
        let loops = sketch.detect_closed_loops();
        let world = sketch.loop_world_points(&loops[0]).unwrap();
        assert_eq!(world.len(), 3);
        for p in &world {
            assert!(p.y.abs() < 1e-12);
        }
        let plane_pts = sketch.loop_points(&loops[0]).unwrap();
        assert_eq!(plane_pts[2], Point2::new(2.0, 3.0));
    }

    #[test]
    fn test_broken_loop_is_reported() {
        let mut sketch = Sketch::new(Plane::xy());
        let a = sketch.add_vertex(0.0, 0.0).id;
        let b = sketch.add_vertex(1.0, 0.0).id;
        let c = sketch.add_vertex(0.0, 1.0).id;
        let e0 = sketch.add_line(a, b).id;
        let e1 = sketch.add_line(a, c).id;
        let bogus = Loop::from_edges(vec![e0, e1]);
        assert!(matches!(
            sketch.loop_vertices(&bogus),
            Err(SketchError::BrokenLoop(id)) if id == e1
        ));
        assert!(matches!(
            sketch.loop_vertices(&Loop::from_edges(vec![EdgeId(77)])),
            Err(SketchError::MissingEdge(_))
        ));
    }

    #[test]
    fn test_settings_validation() {
        assert!(LoopSettings::default().validate().is_ok());
        let bad = LoopSettings {
            min_loop_edges: 2,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}

//! Ordered first-ring neighborhoods.
//!
//! For every vertex, the triangles around it are given in no particular
//! order. This module stitches the edges opposite the vertex back into a
//! chain: a closed loop for interior vertices, an open path for vertices on
//! a border. Stars that are not a single fan (non-manifold vertices) still
//! receive a best-effort ring and are flagged.
//!
//! # Example
//!
//! ```
//! use harmonic::mesh::{RingSet, TriMesh};
//! use nalgebra::Point3;
//!
//! // A fan of four triangles around vertex 0, listed out of order
//! let mesh = TriMesh::new(
//!     vec![Point3::origin(); 5],
//!     vec![[0, 3, 4], [0, 1, 2], [0, 4, 1], [0, 2, 3]],
//! )
//! .unwrap();
//! let rings = RingSet::from_mesh(&mesh);
//!
//! let center = rings.get(0);
//! assert_eq!(center.len(), 4);
//! assert!(!center.is_boundary());
//! assert!(center.is_manifold());
//! ```

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::{TriMesh, VertexFaceMap};

/// Ordered first-ring neighbors of a single vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexRing {
    neighbors: Vec<usize>,
    is_boundary: bool,
    is_manifold: bool,
}

impl VertexRing {
    /// Ring of a vertex that belongs to no triangle.
    pub fn empty() -> Self {
        Self {
            neighbors: Vec::new(),
            is_boundary: false,
            is_manifold: true,
        }
    }

    /// Neighbor vertex indices in fan order.
    #[inline]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Number of neighbors.
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if the ring has no neighbors (disconnected vertex).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// The ring is an open path: the vertex lies on a mesh border.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    /// Every step of the walk matched a single neighbor.
    #[inline]
    pub fn is_manifold(&self) -> bool {
        self.is_manifold
    }
}

/// Options for ring construction.
#[derive(Debug, Clone)]
pub struct RingOptions {
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for RingOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl RingOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// First rings of every vertex of a mesh.
#[derive(Debug, Clone, Default)]
pub struct RingSet {
    rings: Vec<VertexRing>,
}

impl RingSet {
    /// Build the ring of every vertex.
    ///
    /// Disconnected vertices get an empty ring. The result does not depend on
    /// `options.parallel`.
    pub fn build(mesh: &TriMesh, faces: &VertexFaceMap, options: &RingOptions) -> Self {
        let n = mesh.num_vertices();
        debug_assert_eq!(faces.len(), n);

        let ring_of = |v: usize| {
            if faces.is_connected(v) {
                build_ring(mesh, v, faces.faces(v))
            } else {
                VertexRing::empty()
            }
        };

        let rings: Vec<VertexRing> = if options.parallel {
            (0..n).into_par_iter().map(ring_of).collect()
        } else {
            (0..n).map(ring_of).collect()
        };

        let set = Self { rings };
        let non_manifold = set.non_manifold_vertices();
        if !non_manifold.is_empty() {
            warn!(
                count = non_manifold.len(),
                first = non_manifold[0],
                "non-manifold vertices: rings were built in arbitrary order"
            );
        }
        debug!(
            vertices = n,
            boundary = set.boundary_vertices().len(),
            non_manifold = non_manifold.len(),
            "built first rings"
        );
        set
    }

    /// Build rings with default options, computing the incidence map on the way.
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        let faces = VertexFaceMap::build(mesh);
        Self::build(mesh, &faces, &RingOptions::default())
    }

    /// Number of rings (one per vertex).
    #[inline]
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Check if there are no rings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Ring of vertex `v`.
    #[inline]
    pub fn get(&self, v: usize) -> &VertexRing {
        &self.rings[v]
    }

    /// Iterate over all rings in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = &VertexRing> + '_ {
        self.rings.iter()
    }

    /// Vertices whose star is not a single fan.
    pub fn non_manifold_vertices(&self) -> Vec<usize> {
        self.collect_where(|r| !r.is_manifold)
    }

    /// Vertices whose ring is an open path.
    pub fn boundary_vertices(&self) -> Vec<usize> {
        self.collect_where(|r| r.is_boundary)
    }

    /// No vertex lies on a border.
    pub fn is_closed(&self) -> bool {
        self.rings.iter().all(|r| !r.is_boundary)
    }

    /// Every ring was built unambiguously.
    pub fn is_manifold(&self) -> bool {
        self.rings.iter().all(|r| r.is_manifold)
    }

    /// Neighbor lists in the form the Laplacian assembler consumes.
    pub fn neighbor_lists(&self) -> Vec<Vec<usize>> {
        self.rings.iter().map(|r| r.neighbors.clone()).collect()
    }

    fn collect_where(&self, pred: impl Fn(&VertexRing) -> bool) -> Vec<usize> {
        self.rings
            .iter()
            .enumerate()
            .filter_map(|(v, r)| if pred(r) { Some(v) } else { None })
            .collect()
    }
}

/// Build the ring of vertex `v` from its incident triangles.
///
/// The walk keeps a chain and a worklist of edges opposite `v`. Each
/// iteration removes exactly one edge from the worklist, so the loop ends
/// after at most `incident.len()` iterations whatever the input.
pub fn build_ring(mesh: &TriMesh, v: usize, incident: &[usize]) -> VertexRing {
    let mut pairs: Vec<(usize, usize)> = incident
        .iter()
        .map(|&t| opposite_pair(&mesh.triangle(t), v))
        .collect();

    if pairs.is_empty() {
        return VertexRing::empty();
    }

    let (a, b) = pairs.remove(0);
    let mut chain: VecDeque<usize> = VecDeque::with_capacity(pairs.len() + 2);
    chain.push_back(a);
    chain.push_back(b);

    let mut is_manifold = true;
    while !pairs.is_empty() {
        match pairs.iter().position(|&p| attach(&mut chain, p)) {
            Some(k) => {
                pairs.remove(k);
            }
            None => {
                // Star is not a single fan: push the next edge unordered
                let (a, b) = pairs.remove(0);
                push_unique(&mut chain, a);
                push_unique(&mut chain, b);
                is_manifold = false;
            }
        }
    }

    let closed = chain.len() > 1 && chain.front() == chain.back();
    if closed {
        chain.pop_back();
    }

    VertexRing {
        neighbors: chain.into_iter().collect(),
        is_boundary: !closed,
        is_manifold,
    }
}

/// The two corners of `tri` other than `v`, in winding order after `v`.
fn opposite_pair(tri: &[usize; 3], v: usize) -> (usize, usize) {
    let i = tri.iter().position(|&x| x == v).unwrap_or(0);
    (tri[(i + 1) % 3], tri[(i + 2) % 3])
}

/// Extend the chain with `pair` if it shares an endpoint with either end.
fn attach(chain: &mut VecDeque<usize>, (first, second): (usize, usize)) -> bool {
    let (Some(&front), Some(&back)) = (chain.front(), chain.back()) else {
        return false;
    };
    if back == first {
        chain.push_back(second);
    } else if back == second {
        chain.push_back(first);
    } else if front == second {
        chain.push_front(first);
    } else if front == first {
        chain.push_front(second);
    } else {
        return false;
    }
    true
}

fn push_unique(chain: &mut VecDeque<usize>, v: usize) {
    if !chain.contains(&v) {
        chain.push_back(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn tetrahedron() -> TriMesh {
        TriMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, 0.5, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
        )
        .unwrap()
    }

    fn hexagon_fan() -> TriMesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        for k in 0..6 {
            let a = k as f64 * std::f64::consts::PI / 3.0;
            vertices.push(Point3::new(a.cos(), a.sin(), 0.0));
        }
        // Deliberately shuffled triangle order
        let faces = vec![[0, 4, 5], [0, 1, 2], [0, 6, 1], [0, 3, 4], [0, 2, 3], [0, 5, 6]];
        TriMesh::new(vertices, faces).unwrap()
    }

    /// Consecutive ring entries must span a triangle together with `v`.
    fn assert_fan_order(mesh: &TriMesh, v: usize, ring: &VertexRing) {
        let n = ring.len();
        let steps = if ring.is_boundary() { n - 1 } else { n };
        for k in 0..steps {
            let a = ring.neighbors()[k];
            let b = ring.neighbors()[(k + 1) % n];
            let found = mesh
                .triangles()
                .iter()
                .any(|t| t.contains(&v) && t.contains(&a) && t.contains(&b));
            assert!(found, "ring of {} steps {} -> {} outside any triangle", v, a, b);
        }
    }

    #[test]
    fn test_closed_mesh_rings() {
        let mesh = tetrahedron();
        let rings = RingSet::from_mesh(&mesh);

        assert_eq!(rings.len(), 4);
        assert!(rings.is_closed());
        assert!(rings.is_manifold());
        for v in 0..4 {
            let ring = rings.get(v);
            assert_eq!(ring.len(), 3);
            assert!(!ring.neighbors().contains(&v));
            assert_fan_order(&mesh, v, ring);
        }
    }

    #[test]
    fn test_shuffled_fan_recovers_cycle() {
        let mesh = hexagon_fan();
        let rings = RingSet::from_mesh(&mesh);

        let center = rings.get(0);
        assert_eq!(center.len(), 6);
        assert!(!center.is_boundary());
        assert!(center.is_manifold());
        assert_fan_order(&mesh, 0, center);

        // Border vertices see two triangles: an open path of three
        for v in 1..7 {
            let ring = rings.get(v);
            assert!(ring.is_boundary());
            assert_eq!(ring.len(), 3);
            assert_eq!(ring.neighbors()[1], 0);
            assert_fan_order(&mesh, v, ring);
        }
        assert_eq!(rings.boundary_vertices(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_single_triangle_rings() {
        let mesh = TriMesh::new(vec![Point3::origin(); 3], vec![[0, 1, 2]]).unwrap();
        let rings = RingSet::from_mesh(&mesh);

        assert_eq!(rings.get(0).neighbors(), &[1, 2]);
        assert_eq!(rings.get(1).neighbors(), &[2, 0]);
        assert_eq!(rings.get(2).neighbors(), &[0, 1]);
        assert!(rings.iter().all(|r| r.is_boundary() && r.is_manifold()));
    }

    #[test]
    fn test_bowtie_is_flagged() {
        // Two triangles touching only at vertex 0
        let mesh = TriMesh::new(vec![Point3::origin(); 5], vec![[0, 1, 2], [0, 3, 4]]).unwrap();
        let rings = RingSet::from_mesh(&mesh);

        let ring = rings.get(0);
        assert!(!ring.is_manifold());
        assert_eq!(ring.len(), 4);
        let mut sorted = ring.neighbors().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4]);
        assert_eq!(rings.non_manifold_vertices(), vec![0]);
        assert!(!rings.is_manifold());
    }

    #[test]
    fn test_three_triangles_on_one_edge() {
        let mesh = TriMesh::new(
            vec![Point3::origin(); 5],
            vec![[0, 1, 2], [0, 1, 3], [0, 1, 4]],
        )
        .unwrap();
        let rings = RingSet::from_mesh(&mesh);

        assert_eq!(rings.get(0).neighbors(), &[3, 1, 2, 4]);
        assert!(!rings.get(0).is_manifold());
        assert!(!rings.get(1).is_manifold());
        assert!(rings.get(2).is_manifold());
    }

    #[test]
    fn test_disconnected_vertex_has_empty_ring() {
        let mesh = TriMesh::new(vec![Point3::origin(); 4], vec![[0, 1, 2]]).unwrap();
        let rings = RingSet::from_mesh(&mesh);

        assert!(rings.get(3).is_empty());
        assert!(!rings.get(3).is_boundary());
        assert!(rings.get(3).is_manifold());
    }

    #[test]
    fn test_degenerate_triangle_terminates() {
        let mesh = TriMesh::new(vec![Point3::origin(); 3], vec![[0, 0, 1], [1, 2, 0]]).unwrap();
        let rings = RingSet::from_mesh(&mesh);
        assert_eq!(rings.len(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = hexagon_fan();
        let faces = VertexFaceMap::build(&mesh);
        let par = RingSet::build(&mesh, &faces, &RingOptions::default());
        let seq = RingSet::build(&mesh, &faces, &RingOptions::default().sequential());
        assert_eq!(par.neighbor_lists(), seq.neighbor_lists());
    }
}

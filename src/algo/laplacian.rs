//! Cotangent Laplacian assembly.
//!
//! The discrete Laplace-Beltrami operator weights each edge `(i, j)` by half
//! the sum of the cotangents of the two angles facing it. Two assembly
//! strategies are provided, chosen from whatever topology is at hand:
//!
//! - [`Assembly::RingBased`] walks each vertex's ordered first ring and emits
//!   the whole row `i` at once
//! - [`Assembly::TriangleBased`] visits each triangle once and scatters the
//!   three half-edge contributions into both endpoint rows
//!
//! On a closed manifold mesh both produce the same operator, whose rows sum
//! to zero. Negative weights from obtuse triangles are kept.
//!
//! # Example
//!
//! ```
//! use harmonic::algo::laplacian::{Assembly, LaplacianOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let triangles = [[0, 1, 2]];
//!
//! let assembly = Assembly::from_topology(&[], &triangles).unwrap();
//! let lap = assembly.assemble(&vertices, &LaplacianOptions::default()).unwrap();
//!
//! // The right angle at vertex 0 contributes nothing to edge (1, 2)
//! assert!(lap.get(1, 2).abs() < 1e-6);
//! assert!((lap.get(0, 1) - 0.5).abs() < 1e-6);
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{HarmonicError, Result};
use crate::mesh::validate_triangles;

use super::sparse::TripletMatrix;

/// Added to `|a x b|` so degenerate angles yield a large finite cotangent.
pub const COTAN_EPSILON: f64 = 1e-6;

/// Added to cell areas before dividing by them.
pub const AREA_EPSILON: f64 = 1e-10;

/// Row scaling applied to the assembled weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalization {
    /// Plain cotangent weights (the harmonic system `L x = 0`).
    #[default]
    None,
    /// Divide row `i` by the mixed Voronoi area of vertex `i` (`M^-1 L`).
    MixedVoronoi,
}

/// Options for Laplacian assembly.
#[derive(Debug, Clone)]
pub struct LaplacianOptions {
    /// Row scaling (default: none).
    pub normalization: Normalization,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for LaplacianOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::None,
            parallel: true,
        }
    }
}

impl LaplacianOptions {
    /// Set the row normalization.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

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

/// Laplacian assembly strategy, carrying the topology it works from.
#[derive(Debug, Clone, Copy)]
pub enum Assembly<'a> {
    /// Assemble row by row from ordered first rings.
    RingBased(&'a [Vec<usize>]),
    /// Assemble edge by edge from the triangle list.
    TriangleBased(&'a [[usize; 3]]),
}

impl<'a> Assembly<'a> {
    /// Pick the strategy from the available topology.
    ///
    /// Rings win when present; triangles are the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::MissingTopology`] if both are empty.
    pub fn from_topology(rings: &'a [Vec<usize>], triangles: &'a [[usize; 3]]) -> Result<Self> {
        if !rings.is_empty() {
            Ok(Assembly::RingBased(rings))
        } else if !triangles.is_empty() {
            Ok(Assembly::TriangleBased(triangles))
        } else {
            Err(HarmonicError::MissingTopology)
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Assembly::RingBased(_) => "ring-based",
            Assembly::TriangleBased(_) => "triangle-based",
        }
    }

    /// Check the topology against a vertex count.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::DimensionMismatch`] if there is not one ring per vertex
    /// - [`HarmonicError::MalformedRing`] for an out-of-range ring entry
    /// - [`HarmonicError::MalformedMesh`] for an out-of-range triangle index
    pub fn validate(&self, num_vertices: usize) -> Result<()> {
        match self {
            Assembly::RingBased(rings) => {
                if rings.len() != num_vertices {
                    return Err(HarmonicError::DimensionMismatch {
                        expected: num_vertices,
                        actual: rings.len(),
                    });
                }
                for (vertex, ring) in rings.iter().enumerate() {
                    if let Some(&neighbor) = ring.iter().find(|&&j| j >= num_vertices) {
                        return Err(HarmonicError::MalformedRing { vertex, neighbor });
                    }
                }
                Ok(())
            }
            Assembly::TriangleBased(triangles) => validate_triangles(triangles, num_vertices),
        }
    }

    /// Assemble the cotangent Laplacian over `vertices`.
    ///
    /// The result does not depend on `options.parallel`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Assembly::validate`].
    pub fn assemble(
        &self,
        vertices: &[Point3<f64>],
        options: &LaplacianOptions,
    ) -> Result<TripletMatrix> {
        self.validate(vertices.len())?;

        let matrix = match self {
            Assembly::RingBased(rings) => assemble_from_rings(vertices, rings, options),
            Assembly::TriangleBased(triangles) => {
                assemble_from_triangles(vertices, triangles, options)
            }
        };

        debug!(
            strategy = self.name(),
            vertices = vertices.len(),
            nnz = matrix.nnz(),
            normalization = ?options.normalization,
            "assembled cotangent Laplacian"
        );
        Ok(matrix)
    }

    /// Mixed Voronoi area of every vertex, as used by
    /// [`Normalization::MixedVoronoi`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Assembly::validate`].
    pub fn cell_areas(&self, vertices: &[Point3<f64>]) -> Result<Vec<f64>> {
        self.validate(vertices.len())?;
        Ok(match self {
            Assembly::RingBased(rings) => rings
                .iter()
                .enumerate()
                .map(|(i, ring)| ring_cell_area(vertices, i, ring))
                .collect(),
            Assembly::TriangleBased(triangles) => triangle_cell_areas(vertices, triangles),
        })
    }
}

/// Cotangent of the angle between `a` and `b`, guarded against `|a x b| = 0`.
#[inline]
pub fn cotan(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b) / (COTAN_EPSILON + a.cross(b).norm())
}

fn assemble_from_rings(
    vertices: &[Point3<f64>],
    rings: &[Vec<usize>],
    options: &LaplacianOptions,
) -> TripletMatrix {
    let n = vertices.len();
    let row_of = |i: usize| ring_row(vertices, i, &rings[i], options.normalization);

    let rows: Vec<Vec<(usize, f64)>> = if options.parallel {
        (0..n).into_par_iter().map(row_of).collect()
    } else {
        (0..n).map(row_of).collect()
    };

    let mut matrix = TripletMatrix::new(n);
    for (i, row) in rows.into_iter().enumerate() {
        for (j, w) in row {
            matrix.add(i, j, w);
        }
    }
    matrix
}

/// Off-diagonal entries of row `i`, followed by the diagonal.
///
/// The ring is treated as cyclic even when it is an open boundary path.
fn ring_row(
    vertices: &[Point3<f64>],
    i: usize,
    ring: &[usize],
    normalization: Normalization,
) -> Vec<(usize, f64)> {
    let m = ring.len();
    if m == 0 {
        return Vec::new();
    }

    let scale = match normalization {
        Normalization::None => 1.0,
        Normalization::MixedVoronoi => 1.0 / (AREA_EPSILON + ring_cell_area(vertices, i, ring)),
    };

    let pi = vertices[i];
    let mut row = Vec::with_capacity(m + 1);
    let mut sum = 0.0;
    for e in 0..m {
        let pe = vertices[ring[e]];
        let p_prev = vertices[ring[(e + m - 1) % m]];
        let p_next = vertices[ring[(e + 1) % m]];

        let v1 = pi - p_prev;
        let v2 = pe - p_prev;
        let v3 = pi - p_next;
        let v4 = pe - p_next;

        let w = 0.5 * (cotan(&v1, &v2) + cotan(&v3, &v4)) * scale;
        sum += w;
        row.push((ring[e], w));
    }
    row.push((i, -sum));
    row
}

fn assemble_from_triangles(
    vertices: &[Point3<f64>],
    triangles: &[[usize; 3]],
    options: &LaplacianOptions,
) -> TripletMatrix {
    let n = vertices.len();

    let inv_area: Option<Vec<f64>> = match options.normalization {
        Normalization::None => None,
        Normalization::MixedVoronoi => Some(
            triangle_cell_areas(vertices, triangles)
                .into_iter()
                .map(|a| 1.0 / (AREA_EPSILON + a))
                .collect(),
        ),
    };

    let contributions: Vec<[(usize, usize, f64); 3]> = if options.parallel {
        triangles
            .par_iter()
            .map(|tri| triangle_edge_weights(vertices, tri))
            .collect()
    } else {
        triangles
            .iter()
            .map(|tri| triangle_edge_weights(vertices, tri))
            .collect()
    };

    // Accumulate in triangle order so the sums do not depend on scheduling
    let mut matrix = TripletMatrix::new(n);
    for edges in contributions {
        for (i, j, w) in edges {
            let (wi, wj) = match &inv_area {
                Some(s) => (w * s[i], w * s[j]),
                None => (w, w),
            };
            matrix.add(i, j, wi);
            matrix.add(j, i, wj);
            matrix.add(i, i, -wi);
            matrix.add(j, j, -wj);
        }
    }
    matrix
}

/// Weights of the three edges of a triangle, each from the angle opposite it.
fn triangle_edge_weights(vertices: &[Point3<f64>], tri: &[usize; 3]) -> [(usize, usize, f64); 3] {
    let [a, b, c] = *tri;
    let weight = |i: usize, j: usize, org: usize| {
        let p_org = vertices[org];
        let w = 0.5 * cotan(&(p_org - vertices[i]), &(p_org - vertices[j]));
        (i, j, w)
    };
    [weight(a, b, c), weight(b, c, a), weight(c, a, b)]
}

fn ring_cell_area(vertices: &[Point3<f64>], i: usize, ring: &[usize]) -> f64 {
    let m = ring.len();
    (0..m)
        .map(|e| {
            mixed_voronoi_area(
                &vertices[i],
                &vertices[ring[e]],
                &vertices[ring[(e + 1) % m]],
            )
        })
        .sum()
}

fn triangle_cell_areas(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> Vec<f64> {
    let mut areas = vec![0.0; vertices.len()];
    for &[a, b, c] in triangles {
        for (i, j0, j1) in [(a, b, c), (b, c, a), (c, a, b)] {
            areas[i] += mixed_voronoi_area(&vertices[i], &vertices[j0], &vertices[j1]);
        }
    }
    areas
}

/// Share of triangle `(pi, pj0, pj1)` belonging to the cell of `pi`.
///
/// Voronoi region for non-obtuse triangles (Meyer et al. 2003); otherwise half
/// the area when the angle at `pi` is obtuse and a quarter when it is not.
fn mixed_voronoi_area(pi: &Point3<f64>, pj0: &Point3<f64>, pj1: &Point3<f64>) -> f64 {
    let e0 = pj0 - pi;
    let e1 = pj1 - pi;
    let e2 = pj1 - pj0;

    let acute_at_i = e0.dot(&e1) >= 0.0;
    let acute_at_j0 = (-e0).dot(&e2) >= 0.0;
    let acute_at_j1 = (-e1).dot(&(-e2)) >= 0.0;

    if acute_at_i && acute_at_j0 && acute_at_j1 {
        0.125 * (e0.norm_squared() * cotan(&(-e1), &(-e2)) + e1.norm_squared() * cotan(&(-e0), &e2))
    } else {
        let area = 0.5 * e0.cross(&e1).norm();
        if acute_at_i {
            area / 4.0
        } else {
            area / 2.0
        }
    }
}

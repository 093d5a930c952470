//! Dirichlet boundary conditions.
//!
//! A pinned vertex `v` with value `c` replaces row `v` of the operator by the
//! identity row and sets `rhs[v] = c`. Entries of other rows in column `v`
//! are left alone, so the system is generally no longer symmetric.

use std::collections::HashSet;

use nalgebra::DVector;
use tracing::debug;

use crate::error::{HarmonicError, Result};

use super::sparse::TripletMatrix;

/// A vertex pinned to a fixed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCondition {
    /// The pinned vertex.
    pub vertex: usize,
    /// The value the solution must take there.
    pub value: f64,
}

impl BoundaryCondition {
    /// Pin `vertex` to `value`.
    pub fn new(vertex: usize, value: f64) -> Self {
        Self { vertex, value }
    }
}

impl From<(usize, f64)> for BoundaryCondition {
    fn from((vertex, value): (usize, f64)) -> Self {
        Self { vertex, value }
    }
}

/// Check a boundary list against a vertex count.
///
/// An empty list passes; it only fails later, at factorization.
///
/// # Errors
///
/// - [`HarmonicError::BoundaryOutOfRange`] if a vertex index is `>= num_vertices`
/// - [`HarmonicError::DuplicateBoundary`] if a vertex is pinned twice
pub fn validate_boundaries(boundaries: &[BoundaryCondition], num_vertices: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(boundaries.len());
    for bc in boundaries {
        if bc.vertex >= num_vertices {
            return Err(HarmonicError::BoundaryOutOfRange {
                vertex: bc.vertex,
                vertex_count: num_vertices,
            });
        }
        if !seen.insert(bc.vertex) {
            return Err(HarmonicError::DuplicateBoundary { vertex: bc.vertex });
        }
    }
    Ok(())
}

/// Impose `boundaries` on `matrix` and return the right-hand side.
///
/// Boundaries are applied in order. Callers are expected to have run
/// [`validate_boundaries`] first.
///
/// # Example
///
/// ```
/// use harmonic::algo::constraint::{apply_constraints, BoundaryCondition};
/// use harmonic::algo::sparse::TripletMatrix;
///
/// let mut m = TripletMatrix::from_triplets(2, vec![(0, 0, -1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, -1.0)]);
/// let rhs = apply_constraints(&mut m, &[BoundaryCondition::new(1, 3.0)]);
///
/// assert_eq!(rhs[1], 3.0);
/// assert_eq!(m.get(1, 1), 1.0);
/// assert_eq!(m.get(1, 0), 0.0);
/// assert_eq!(m.get(0, 1), 1.0);
/// ```
pub fn apply_constraints(
    matrix: &mut TripletMatrix,
    boundaries: &[BoundaryCondition],
) -> DVector<f64> {
    let mut rhs = DVector::zeros(matrix.dim());
    for bc in boundaries {
        rhs[bc.vertex] = bc.value;
        matrix.clear_row(bc.vertex);
        matrix.add(bc.vertex, bc.vertex, 1.0);
    }
    rhs
}

/// Pin every empty row to zero, returning the rows that were pinned.
///
/// A vertex touching no triangle has no Laplacian row; without an identity
/// row the system would be singular.
pub fn pin_disconnected(matrix: &mut TripletMatrix, rhs: &mut DVector<f64>) -> Vec<usize> {
    let empty: Vec<usize> = (0..matrix.dim()).filter(|&i| matrix.is_row_empty(i)).collect();
    for &i in &empty {
        matrix.add(i, i, 1.0);
        rhs[i] = 0.0;
    }
    if !empty.is_empty() {
        debug!(count = empty.len(), "pinned disconnected vertices to zero");
    }
    empty
}

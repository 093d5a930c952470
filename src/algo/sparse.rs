//! Accumulating sparse operator.
//!
//! [`TripletMatrix`] is the assembly-side representation of the Laplacian:
//! one ordered map per row, with insertion adding onto any existing entry.
//! Rows can be cleared and rewritten cheaply, which is what boundary
//! constraints need. Once assembly is finished the matrix is converted to a
//! compressed format from `nalgebra-sparse` for solving.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};

/// Square sparse matrix stored as per-row `(column -> value)` maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripletMatrix {
    rows: Vec<BTreeMap<usize, f64>>,
}

impl TripletMatrix {
    /// Create an empty `n x n` matrix.
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); n],
        }
    }

    /// Create a matrix from `(row, col, value)` triplets, summing duplicates.
    ///
    /// # Panics
    ///
    /// Panics if an index is `>= n`.
    pub fn from_triplets(n: usize, triplets: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let mut m = Self::new(n);
        for (i, j, v) in triplets {
            m.add(i, j, v);
        }
        m
    }

    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    /// Add `value` to entry `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.rows.len(), "column {} out of range", col);
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// Entry `(row, col)`, zero if absent.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(&col).copied().unwrap_or(0.0)
    }

    /// Remove every entry of `row`.
    #[inline]
    pub fn clear_row(&mut self, row: usize) {
        self.rows[row].clear();
    }

    /// Whether `row` holds no stored entries.
    #[inline]
    pub fn is_row_empty(&self, row: usize) -> bool {
        self.rows[row].is_empty()
    }

    /// Sum of the stored entries of `row`.
    pub fn row_sum(&self, row: usize) -> f64 {
        self.rows[row].values().sum()
    }

    /// Stored entries of `row` in ascending column order.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rows[row].iter().map(|(&j, &v)| (j, v))
    }

    /// All stored entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |(&j, &v)| (i, j, v)))
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Multiply by a vector: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != self.dim()`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.dim(), "Vector dimension mismatch");
        DVector::from_iterator(
            self.dim(),
            self.rows
                .iter()
                .map(|row| row.iter().map(|(&j, &v)| v * x[j]).sum::<f64>()),
        )
    }

    /// Convert to coordinate format.
    pub fn to_coo(&self) -> CooMatrix<f64> {
        let n = self.dim();
        let mut coo = CooMatrix::new(n, n);
        for (i, j, v) in self.iter() {
            coo.push(i, j, v);
        }
        coo
    }

    /// Convert to compressed sparse row format.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.to_coo())
    }

    /// Convert to compressed sparse column format.
    pub fn to_csc(&self) -> CscMatrix<f64> {
        CscMatrix::from(&self.to_coo())
    }

    /// Convert to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.dim();
        let mut dense = DMatrix::zeros(n, n);
        for (i, j, v) in self.iter() {
            dense[(i, j)] += v;
        }
        dense
    }
}

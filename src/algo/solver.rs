//! Direct solvers for the constrained Laplacian system.
//!
//! After boundary rows are replaced by identity rows the operator is square,
//! sparse and in general unsymmetric, so a symmetric method (Cholesky,
//! conjugate gradient) does not apply. This module provides:
//!
//! - [`SparseLu`]: left-looking sparse LU (Gilbert-Peierls) with threshold
//!   partial pivoting, over a fill-reducing column ordering
//! - [`DenseLu`]: nalgebra's dense LU, for small systems and cross-checks
//!
//! Both implement [`SparseSolver`]: factorize once, then solve any number of
//! right-hand sides against the [`Factorization`].
//!
//! # Example
//!
//! ```
//! use harmonic::algo::solver::{Factorization, SparseLu, SparseSolver};
//! use harmonic::algo::sparse::TripletMatrix;
//! use nalgebra::DVector;
//!
//! let a = TripletMatrix::from_triplets(2, vec![(0, 1, 1.0), (1, 0, 2.0), (1, 1, 1.0)]);
//! let lu = SparseLu::default().factorize(&a.to_csc()).unwrap();
//! let x = lu.solve(&DVector::from_vec(vec![3.0, 5.0])).unwrap();
//!
//! assert!((x[0] - 1.0).abs() < 1e-12);
//! assert!((x[1] - 3.0).abs() < 1e-12);
//! ```

use nalgebra::{DMatrix, DVector, Dyn, LU};
use nalgebra_sparse::CscMatrix;
use tracing::debug;

use crate::error::{HarmonicError, Result};

use super::ordering::Ordering;

/// A factorization method for square sparse matrices.
pub trait SparseSolver {
    /// Factors produced by [`SparseSolver::factorize`].
    type Factorization: Factorization;

    /// Factorize `matrix`.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::DimensionMismatch`] if the matrix is not square
    /// - [`HarmonicError::SingularMatrix`] if no usable pivot exists
    fn factorize(&self, matrix: &CscMatrix<f64>) -> Result<Self::Factorization>;

    /// Factorize `matrix` and solve a single right-hand side.
    fn solve(&self, matrix: &CscMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        self.factorize(matrix)?.solve(rhs)
    }
}

/// A factorized matrix that can be solved against right-hand sides.
pub trait Factorization {
    /// Dimension of the factorized matrix.
    fn dim(&self) -> usize;

    /// Solve `A x = rhs`.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::DimensionMismatch`] if `rhs` has the wrong length
    /// - [`HarmonicError::SolverFailure`] if the solution is not finite
    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>>;
}

/// Which solver a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverKind {
    /// Sparse LU with the given settings.
    SparseLu(SparseLu),
    /// Dense LU with the given settings.
    DenseLu(DenseLu),
}

impl Default for SolverKind {
    fn default() -> Self {
        SolverKind::SparseLu(SparseLu::default())
    }
}

impl SolverKind {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SolverKind::SparseLu(_) => "sparse-lu",
            SolverKind::DenseLu(_) => "dense-lu",
        }
    }

    /// Factorize `matrix` with the selected solver and solve for `rhs`.
    pub fn solve(&self, matrix: &CscMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        match self {
            SolverKind::SparseLu(s) => SparseSolver::solve(s, matrix, rhs),
            SolverKind::DenseLu(s) => SparseSolver::solve(s, matrix, rhs),
        }
    }
}

/// Left-looking sparse LU with threshold partial pivoting.
///
/// Computes `P A Q = L U` where `Q` comes from [`SparseLu::ordering`] and `P`
/// from pivoting. At each step the diagonal entry is kept as pivot when its
/// magnitude is at least `pivot_threshold` times the largest candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseLu {
    /// Relative threshold for keeping the diagonal pivot, in `[0, 1]`
    /// (default: 0.1). `1.0` is plain partial pivoting.
    pub pivot_threshold: f64,

    /// A pivot not larger than this times `||A||_1` counts as zero
    /// (default: 1e-12).
    pub singular_tolerance: f64,

    /// Column ordering (default: reverse Cuthill-McKee).
    pub ordering: Ordering,
}

impl Default for SparseLu {
    fn default() -> Self {
        Self {
            pivot_threshold: 0.1,
            singular_tolerance: 1e-12,
            ordering: Ordering::ReverseCuthillMckee,
        }
    }
}

impl SparseLu {
    /// Set the diagonal pivot threshold.
    pub fn with_pivot_threshold(mut self, threshold: f64) -> Self {
        self.pivot_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the relative singularity tolerance.
    pub fn with_singular_tolerance(mut self, tolerance: f64) -> Self {
        self.singular_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the column ordering.
    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }
}

/// Factors of a [`SparseLu`] factorization.
///
/// `L` is unit lower triangular with its diagonal stored first in each
/// column; `U` is upper triangular with its diagonal stored last. Both use
/// pivot-step indices for rows.
#[derive(Debug, Clone)]
pub struct SparseLuFactors {
    n: usize,
    /// Column permutation: step `k` eliminated original column `q[k]`.
    q: Vec<usize>,
    /// Row permutation: original row `i` became pivot row `pinv[i]`.
    pinv: Vec<usize>,
    l: CompressedColumns,
    u: CompressedColumns,
}

impl SparseLuFactors {
    /// Stored entries in `L`.
    pub fn nnz_l(&self) -> usize {
        self.l.values.len()
    }

    /// Stored entries in `U`.
    pub fn nnz_u(&self) -> usize {
        self.u.values.len()
    }

    /// The column permutation used.
    pub fn column_permutation(&self) -> &[usize] {
        &self.q
    }
}

#[derive(Debug, Clone, Default)]
struct CompressedColumns {
    offsets: Vec<usize>,
    rows: Vec<usize>,
    values: Vec<f64>,
}

impl CompressedColumns {
    fn with_capacity(n: usize, nnz: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(n + 1),
            rows: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    fn start_column(&mut self) {
        self.offsets.push(self.rows.len());
    }

    fn push(&mut self, row: usize, value: f64) {
        self.rows.push(row);
        self.values.push(value);
    }

    fn column(&self, j: usize) -> std::ops::Range<usize> {
        self.offsets[j]..self.offsets[j + 1]
    }
}

impl SparseSolver for SparseLu {
    type Factorization = SparseLuFactors;

    fn factorize(&self, matrix: &CscMatrix<f64>) -> Result<SparseLuFactors> {
        let n = check_square(matrix)?;
        let a_offsets = matrix.col_offsets();
        let a_rows = matrix.row_indices();
        let a_values = matrix.values();

        let norm = one_norm(matrix);
        let q = self.ordering.permutation(matrix);

        let mut pinv: Vec<Option<usize>> = vec![None; n];
        let mut l = CompressedColumns::with_capacity(n, 4 * matrix.nnz() + n);
        let mut u = CompressedColumns::with_capacity(n, 4 * matrix.nnz() + n);

        let mut x = vec![0.0; n];
        let mut reach = Reach::new(n);

        for (k, &col) in q.iter().enumerate() {
            l.start_column();
            u.start_column();

            let entries = a_offsets[col]..a_offsets[col + 1];
            let pattern = reach.compute(&a_rows[entries.clone()], &l, &pinv);

            // x = L \ A(:, col) restricted to the reach
            for &i in pattern {
                x[i] = 0.0;
            }
            for p in entries {
                x[a_rows[p]] += a_values[p];
            }
            for &j in pattern {
                let Some(jj) = pinv[j] else { continue };
                let xj = x[j];
                let col_j = l.column(jj);
                // Skip the unit diagonal stored first
                for p in col_j.start + 1..col_j.end {
                    x[l.rows[p]] -= l.values[p] * xj;
                }
            }

            // Pivot search over rows not yet pivotal; the rest belongs to U
            let mut best: Option<(usize, f64)> = None;
            for &i in pattern {
                match pinv[i] {
                    Some(step) => u.push(step, x[i]),
                    None => {
                        let t = x[i].abs();
                        if best.map_or(true, |(_, a)| t > a) {
                            best = Some((i, t));
                        }
                    }
                }
            }

            let (mut ipiv, a) = match best {
                Some((i, a)) if a > self.singular_tolerance * norm => (i, a),
                _ => return Err(HarmonicError::SingularMatrix { column: k }),
            };
            if pinv[col].is_none() && x[col] != 0.0 && x[col].abs() >= a * self.pivot_threshold {
                ipiv = col;
            }

            let pivot = x[ipiv];
            u.push(k, pivot);
            pinv[ipiv] = Some(k);

            l.push(ipiv, 1.0);
            for &i in pattern {
                if pinv[i].is_none() {
                    l.push(i, x[i] / pivot);
                }
                x[i] = 0.0;
            }
        }
        l.start_column();
        u.start_column();

        let pinv: Vec<usize> = pinv
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| HarmonicError::SolverFailure("row permutation is incomplete".into()))?;
        for row in &mut l.rows {
            *row = pinv[*row];
        }

        debug!(
            n,
            nnz_a = matrix.nnz(),
            nnz_l = l.values.len(),
            nnz_u = u.values.len(),
            ordering = ?self.ordering,
            "sparse LU factorized"
        );

        Ok(SparseLuFactors { n, q, pinv, l, u })
    }
}

impl Factorization for SparseLuFactors {
    fn dim(&self) -> usize {
        self.n
    }

    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        check_rhs(self.n, rhs)?;
        let n = self.n;

        let mut x = vec![0.0; n];
        for (i, &b) in rhs.iter().enumerate() {
            x[self.pinv[i]] = b;
        }

        // Forward substitution with unit L
        for j in 0..n {
            let xj = x[j];
            let col = self.l.column(j);
            for p in col.start + 1..col.end {
                x[self.l.rows[p]] -= self.l.values[p] * xj;
            }
        }

        // Back substitution, U diagonal stored last
        for j in (0..n).rev() {
            let col = self.u.column(j);
            let diag = col.end - 1;
            x[j] /= self.u.values[diag];
            let xj = x[j];
            for p in col.start..diag {
                x[self.u.rows[p]] -= self.u.values[p] * xj;
            }
        }

        let mut out = DVector::zeros(n);
        for (k, &col) in self.q.iter().enumerate() {
            out[col] = x[k];
        }
        check_finite(out)
    }
}

/// Nonzero pattern of a sparse triangular solve, in topological order.
///
/// Depth-first search through the graph of the partial `L`: row `i` leads
/// to the rows of column `pinv[i]` once `i` has been pivoted.
struct Reach {
    marked: Vec<bool>,
    order: Vec<usize>,
    stack: Vec<(usize, usize)>,
}

impl Reach {
    fn new(n: usize) -> Self {
        Self {
            marked: vec![false; n],
            order: Vec::with_capacity(n),
            stack: Vec::new(),
        }
    }

    fn compute(
        &mut self,
        seeds: &[usize],
        l: &CompressedColumns,
        pinv: &[Option<usize>],
    ) -> &[usize] {
        for &i in &self.order {
            self.marked[i] = false;
        }
        self.order.clear();

        for &seed in seeds {
            if self.marked[seed] {
                continue;
            }
            self.marked[seed] = true;
            self.stack.push((seed, 0));

            while let Some(&(node, next)) = self.stack.last() {
                let children = match pinv[node] {
                    Some(j) => &l.rows[l.column(j)],
                    None => &[][..],
                };
                let marked = &self.marked;
                let child = children[next..]
                    .iter()
                    .position(|&c| !marked[c])
                    .map(|offset| next + offset);

                match child {
                    Some(c) => {
                        let top = self.stack.len() - 1;
                        self.stack[top].1 = c + 1;
                        let row = children[c];
                        self.marked[row] = true;
                        self.stack.push((row, 0));
                    }
                    None => {
                        self.stack.pop();
                        self.order.push(node);
                    }
                }
            }
        }

        // Postorder reversed is a topological order
        self.order.reverse();
        &self.order
    }
}

/// Dense LU through nalgebra.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseLu {
    /// A pivot not larger than this times `||A||_1` counts as zero
    /// (default: 1e-12).
    pub singular_tolerance: f64,
}

impl Default for DenseLu {
    fn default() -> Self {
        Self {
            singular_tolerance: 1e-12,
        }
    }
}

impl DenseLu {
    /// Set the relative singularity tolerance.
    pub fn with_singular_tolerance(mut self, tolerance: f64) -> Self {
        self.singular_tolerance = tolerance.max(0.0);
        self
    }
}

/// Factors of a [`DenseLu`] factorization.
#[derive(Debug, Clone)]
pub struct DenseLuFactors {
    n: usize,
    lu: LU<f64, Dyn, Dyn>,
}

impl SparseSolver for DenseLu {
    type Factorization = DenseLuFactors;

    fn factorize(&self, matrix: &CscMatrix<f64>) -> Result<DenseLuFactors> {
        let n = check_square(matrix)?;
        let norm = one_norm(matrix);
        let lu = LU::new(DMatrix::from(matrix));

        let u = lu.u();
        for k in 0..n {
            if u[(k, k)].abs() <= self.singular_tolerance * norm {
                return Err(HarmonicError::SingularMatrix { column: k });
            }
        }

        debug!(n, "dense LU factorized");
        Ok(DenseLuFactors { n, lu })
    }
}

impl Factorization for DenseLuFactors {
    fn dim(&self) -> usize {
        self.n
    }

    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        check_rhs(self.dim(), rhs)?;
        let x = self
            .lu
            .solve(rhs)
            .ok_or_else(|| HarmonicError::SolverFailure("dense LU is not invertible".into()))?;
        check_finite(x)
    }
}

fn check_square(matrix: &CscMatrix<f64>) -> Result<usize> {
    if matrix.nrows() != matrix.ncols() {
        return Err(HarmonicError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    Ok(matrix.nrows())
}

fn check_rhs(n: usize, rhs: &DVector<f64>) -> Result<()> {
    if rhs.len() != n {
        return Err(HarmonicError::DimensionMismatch {
            expected: n,
            actual: rhs.len(),
        });
    }
    Ok(())
}

fn check_finite(x: DVector<f64>) -> Result<DVector<f64>> {
    match x.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(HarmonicError::SolverFailure(format!(
            "non-finite value in solution at index {}",
            i
        ))),
        None => Ok(x),
    }
}

/// Largest absolute column sum.
fn one_norm(matrix: &CscMatrix<f64>) -> f64 {
    let offsets = matrix.col_offsets();
    let values = matrix.values();
    (0..matrix.ncols())
        .map(|j| values[offsets[j]..offsets[j + 1]].iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

//! Fill-reducing column orderings for the sparse LU.
//!
//! Reverse Cuthill-McKee renumbers the graph of `A + A^T` breadth-first from
//! a pseudo-peripheral vertex, which keeps the profile of a mesh Laplacian
//! narrow and the LU factors small. Every connected component is ordered in
//! turn, so isolated vertices and multi-part meshes are handled.

use nalgebra_sparse::CscMatrix;

/// Column ordering applied before factorization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ordering {
    /// Keep the columns in their original order.
    Natural,
    /// Reverse Cuthill-McKee on the symmetrized pattern.
    #[default]
    ReverseCuthillMckee,
}

impl Ordering {
    /// Column permutation for `matrix`: entry `k` is the original column
    /// eliminated at step `k`.
    pub fn permutation(&self, matrix: &CscMatrix<f64>) -> Vec<usize> {
        match self {
            Ordering::Natural => (0..matrix.ncols()).collect(),
            Ordering::ReverseCuthillMckee => reverse_cuthill_mckee(&symmetric_adjacency(matrix)),
        }
    }
}

/// Adjacency lists of the pattern of `A + A^T`, without self loops.
///
/// Lists are sorted and free of duplicates.
pub fn symmetric_adjacency(matrix: &CscMatrix<f64>) -> Vec<Vec<usize>> {
    let n = matrix.ncols().max(matrix.nrows());
    let mut adj = vec![Vec::new(); n];
    let offsets = matrix.col_offsets();
    let rows = matrix.row_indices();

    for j in 0..matrix.ncols() {
        for &i in &rows[offsets[j]..offsets[j + 1]] {
            if i != j {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }
    for list in &mut adj {
        list.sort_unstable();
        list.dedup();
    }
    adj
}

/// Reverse Cuthill-McKee permutation of an undirected graph.
///
/// Returns a permutation of `0..adj.len()`: entry `k` is the vertex placed
/// at position `k`.
pub fn reverse_cuthill_mckee(adj: &[Vec<usize>]) -> Vec<usize> {
    let n = adj.len();
    let degree: Vec<usize> = adj.iter().map(Vec::len).collect();

    // Start components at low-degree vertices
    let mut candidates: Vec<usize> = (0..n).collect();
    candidates.sort_by_key(|&v| (degree[v], v));

    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    let mut marks = Marks::new(n);

    for &start in &candidates {
        if placed[start] {
            continue;
        }
        let root = pseudo_peripheral_root(adj, &degree, start, &mut marks);

        let head = order.len();
        placed[root] = true;
        order.push(root);
        let mut cursor = head;
        while cursor < order.len() {
            let u = order[cursor];
            cursor += 1;

            let first = order.len();
            for &v in &adj[u] {
                if !placed[v] {
                    placed[v] = true;
                    order.push(v);
                }
            }
            order[first..].sort_by_key(|&v| (degree[v], v));
        }
    }

    order.reverse();
    order
}

/// Visit stamps reused across breadth-first searches.
struct Marks {
    stamp: Vec<usize>,
    generation: usize,
}

impl Marks {
    fn new(n: usize) -> Self {
        Self {
            stamp: vec![0; n],
            generation: 0,
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
    }

    /// Mark `v`, returning `true` if it was not marked yet.
    fn visit(&mut self, v: usize) -> bool {
        if self.stamp[v] == self.generation {
            false
        } else {
            self.stamp[v] = self.generation;
            true
        }
    }
}

/// Level structure rooted at `root`.
fn level_structure(adj: &[Vec<usize>], root: usize, marks: &mut Marks) -> Vec<Vec<usize>> {
    marks.reset();
    marks.visit(root);
    let mut levels = vec![vec![root]];
    loop {
        let mut next = Vec::new();
        if let Some(last) = levels.last() {
            for &u in last {
                for &v in &adj[u] {
                    if marks.visit(v) {
                        next.push(v);
                    }
                }
            }
        }
        if next.is_empty() {
            break;
        }
        levels.push(next);
    }
    levels
}

/// Walk to the far end of the level structure until its depth stops growing.
fn pseudo_peripheral_root(
    adj: &[Vec<usize>],
    degree: &[usize],
    start: usize,
    marks: &mut Marks,
) -> usize {
    let mut root = start;
    let mut depth = 0;
    loop {
        let levels = level_structure(adj, root, marks);
        if levels.len() <= depth {
            return root;
        }
        depth = levels.len();
        let candidate = levels
            .last()
            .and_then(|last| last.iter().copied().min_by_key(|&v| (degree[v], v)));
        match candidate {
            Some(v) if v != root => root = v,
            _ => return root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn line_graph(n: usize) -> Vec<Vec<usize>> {
        (0..n)
            .map(|i| {
                let mut nbrs = Vec::new();
                if i > 0 {
                    nbrs.push(i - 1);
                }
                if i + 1 < n {
                    nbrs.push(i + 1);
                }
                nbrs
            })
            .collect()
    }

    fn assert_permutation(order: &[usize], n: usize) {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_rcm_line_graph() {
        let order = reverse_cuthill_mckee(&line_graph(6));
        assert_permutation(&order, 6);
        // A path is ordered end to end
        for w in order.windows(2) {
            assert_eq!(w[0].abs_diff(w[1]), 1);
        }
    }

    #[test]
    fn test_rcm_empty_graph() {
        assert!(reverse_cuthill_mckee(&[]).is_empty());
    }

    #[test]
    fn test_rcm_disconnected_components() {
        // Two paths and an isolated vertex
        let adj = vec![vec![1], vec![0], vec![], vec![4], vec![3, 5], vec![4]];
        let order = reverse_cuthill_mckee(&adj);
        assert_permutation(&order, 6);
    }

    #[test]
    fn test_rcm_star_graph() {
        let mut adj = vec![Vec::new(); 5];
        for i in 1..5 {
            adj[0].push(i);
            adj[i].push(0);
        }
        let order = reverse_cuthill_mckee(&adj);
        assert_permutation(&order, 5);
    }

    #[test]
    fn test_symmetric_adjacency_of_unsymmetric_pattern() {
        let mut coo = CooMatrix::new(3, 3);
        coo.push(0, 0, 1.0);
        coo.push(2, 0, 1.0);
        coo.push(1, 1, 1.0);
        coo.push(2, 2, 1.0);
        let csc = CscMatrix::from(&coo);

        let adj = symmetric_adjacency(&csc);
        assert_eq!(adj, vec![vec![2], vec![], vec![0]]);
    }

    #[test]
    fn test_natural_ordering() {
        let mut coo = CooMatrix::new(4, 4);
        for i in 0..4 {
            coo.push(i, i, 1.0);
        }
        let csc = CscMatrix::from(&coo);
        assert_eq!(Ordering::Natural.permutation(&csc), vec![0, 1, 2, 3]);
        assert_permutation(&Ordering::ReverseCuthillMckee.permutation(&csc), 4);
    }
}

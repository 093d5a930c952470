//! Vertex-to-triangle incidence.

use super::TriMesh;

/// Triangles incident to each vertex.
///
/// Built once from a [`TriMesh`] and never mutated afterwards. The triangle
/// list of a vertex is in ascending triangle order but carries no geometric
/// ordering; [`RingSet`](super::RingSet) recovers the fan order.
#[derive(Debug, Clone, Default)]
pub struct VertexFaceMap {
    faces: Vec<Vec<usize>>,
    connected: Vec<bool>,
}

impl VertexFaceMap {
    /// Record every triangle against each of its distinct vertices.
    ///
    /// # Example
    ///
    /// ```
    /// use harmonic::mesh::{TriMesh, VertexFaceMap};
    /// use nalgebra::Point3;
    ///
    /// let mesh = TriMesh::new(vec![Point3::origin(); 5], vec![[0, 1, 2], [0, 2, 3]]).unwrap();
    /// let map = VertexFaceMap::build(&mesh);
    /// assert_eq!(map.faces(0), &[0, 1]);
    /// assert!(!map.is_connected(4));
    /// ```
    pub fn build(mesh: &TriMesh) -> Self {
        let n = mesh.num_vertices();
        let mut faces: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut connected = vec![false; n];

        for (t, tri) in mesh.triangles().iter().enumerate() {
            for (k, &v) in tri.iter().enumerate() {
                // A repeated index would otherwise list the triangle twice
                if tri[..k].contains(&v) {
                    continue;
                }
                faces[v].push(t);
                connected[v] = true;
            }
        }

        Self { faces, connected }
    }

    /// Number of vertices covered by the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Check if the map covers no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Triangles incident to vertex `v`.
    #[inline]
    pub fn faces(&self, v: usize) -> &[usize] {
        &self.faces[v]
    }

    /// Whether vertex `v` belongs to at least one triangle.
    #[inline]
    pub fn is_connected(&self, v: usize) -> bool {
        self.connected[v]
    }

    /// Indices of vertices that belong to no triangle.
    pub fn disconnected_vertices(&self) -> Vec<usize> {
        self.connected
            .iter()
            .enumerate()
            .filter_map(|(v, &c)| if c { None } else { Some(v) })
            .collect()
    }
}

//! Indexed triangle mesh.
//!
//! A [`TriMesh`] is a plain triangle soup: an array of positions and an array
//! of index triples. Nothing about manifoldness or orientation is assumed;
//! the only invariant is that every index refers to an existing vertex.

use nalgebra::{Point3, Vector3};

use crate::error::{HarmonicError, Result};

/// A triangle mesh stored as vertex positions and index triples.
///
/// Vertex insertion order defines the vertex index space used by every
/// downstream stage (topology, rings, Laplacian rows, weight maps).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl TriMesh {
    /// Create a mesh, checking that every triangle index is in range.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::MalformedMesh`] naming the first triangle
    /// that references a missing vertex.
    ///
    /// # Example
    ///
    /// ```
    /// use harmonic::mesh::TriMesh;
    /// use nalgebra::Point3;
    ///
    /// let mesh = TriMesh::new(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2]],
    /// )
    /// .unwrap();
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert!(TriMesh::new(vec![Point3::origin()], vec![[0, 1, 2]]).is_err());
    /// ```
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        validate_triangles(&triangles, vertices.len())?;
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertex positions, indexed by vertex.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// All triangles, indexed by triangle.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Position of vertex `v`.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<f64> {
        &self.vertices[v]
    }

    /// Vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [usize; 3] {
        self.triangles[t]
    }

    /// Corner positions of triangle `t`.
    pub fn triangle_positions(&self, t: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[t];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Unit normal of triangle `t` (zero for degenerate triangles).
    pub fn triangle_normal(&self, t: usize) -> Vector3<f64> {
        let [p0, p1, p2] = self.triangle_positions(t);
        let n = (p1 - p0).cross(&(p2 - p0));
        let len = n.norm();
        if len > 1e-12 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Area of triangle `t`.
    pub fn triangle_area(&self, t: usize) -> f64 {
        let [p0, p1, p2] = self.triangle_positions(t);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len()).map(|t| self.triangle_area(t)).sum()
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.vertices {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }

    /// Replace all vertex positions, keeping connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::DimensionMismatch`] if the number of positions
    /// differs from the vertex count.
    pub fn with_positions(&self, positions: Vec<Point3<f64>>) -> Result<Self> {
        if positions.len() != self.vertices.len() {
            return Err(HarmonicError::DimensionMismatch {
                expected: self.vertices.len(),
                actual: positions.len(),
            });
        }
        Ok(Self {
            vertices: positions,
            triangles: self.triangles.clone(),
        })
    }

    /// Consume the mesh, returning its vertex and triangle arrays.
    pub fn into_parts(self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        (self.vertices, self.triangles)
    }
}

/// Check that every triangle index is below `num_vertices`.
pub(crate) fn validate_triangles(triangles: &[[usize; 3]], num_vertices: usize) -> Result<()> {
    for (ti, tri) in triangles.iter().enumerate() {
        if let Some(&vertex) = tri.iter().find(|&&v| v >= num_vertices) {
            return Err(HarmonicError::MalformedMesh {
                triangle: ti,
                vertex,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> TriMesh {
        TriMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_and_area() {
        let mesh = unit_square();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        assert!((mesh.triangle_normal(0).z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_triangle_is_rejected() {
        let result = TriMesh::new(vec![Point3::origin(); 3], vec![[0, 1, 2], [2, 1, 7]]);
        match result {
            Err(HarmonicError::MalformedMesh { triangle, vertex }) => {
                assert_eq!(triangle, 1);
                assert_eq!(vertex, 7);
            }
            other => panic!("expected MalformedMesh, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_triangle_is_kept() {
        // Repeated indices are tolerated; only out-of-range indices are fatal.
        let mesh = TriMesh::new(vec![Point3::origin(); 3], vec![[0, 0, 1]]).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.triangle_area(0), 0.0);
        assert_eq!(mesh.triangle_normal(0), Vector3::zeros());
    }

    #[test]
    fn test_bounding_box() {
        let mesh = unit_square();
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
        assert!(TriMesh::default().bounding_box().is_none());
    }

    #[test]
    fn test_with_positions() {
        let mesh = unit_square();
        let moved: Vec<_> = mesh.vertices().iter().map(|p| p + Vector3::z()).collect();
        let lifted = mesh.with_positions(moved).unwrap();
        assert_eq!(lifted.triangles(), mesh.triangles());
        assert_eq!(lifted.position(2).z, 1.0);
        assert!(mesh.with_positions(vec![]).is_err());
    }
}

//! Turning a weight map into something to look at.
//!
//! - [`heat_color`] maps `[0, 1]` onto a blue-cyan-green-yellow-red ramp
//! - [`level_curves`] darkens thin bands between regularly spaced iso-values
//! - [`deform_along_z`] lifts every vertex by its weight, for a height-field view
//!
//! Colors are RGB triples with components in `[0, 1]`.

use nalgebra::{Point3, Vector3};

use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

use super::weights::WeightMap;

/// Color for `w` on the heat ramp. Values outside `[0, 1]` are clamped.
///
/// # Example
///
/// ```
/// use harmonic::algo::colormap::heat_color;
///
/// assert_eq!(heat_color(0.0), [0.0, 0.0, 1.0]);
/// assert_eq!(heat_color(0.5), [0.0, 1.0, 0.0]);
/// assert_eq!(heat_color(1.0), [1.0, 0.0, 0.0]);
/// ```
pub fn heat_color(w: f64) -> [f64; 3] {
    let w = if w.is_nan() { 0.0 } else { w.clamp(0.0, 1.0) };
    if w < 0.25 {
        [0.0, w * 4.0, 1.0]
    } else if w < 0.5 {
        [0.0, 1.0, 1.0 - (w - 0.25) * 4.0]
    } else if w < 0.75 {
        [(w - 0.5) * 4.0, 1.0, 0.0]
    } else {
        [1.0, 1.0 - (w - 0.75) * 4.0, 0.0]
    }
}

/// Greyscale factor in `[0, 1]`: one at multiples of `1 / scale`, dipping
/// sharply to zero halfway between them.
pub fn level_curves(w: f64, scale: f64) -> f64 {
    let c = (w * std::f64::consts::PI * scale).cos();
    let mut opacity = 1.0 - c * c;
    opacity *= opacity;
    opacity *= opacity;
    1.0 - opacity
}

/// Heat colors for every vertex, optionally modulated by level curves.
pub fn weight_colors(weights: &WeightMap, level_scale: Option<f64>) -> Vec<[f64; 3]> {
    weights
        .iter()
        .map(|w| {
            let [r, g, b] = heat_color(w);
            let k = level_scale.map_or(1.0, |s| level_curves(w, s));
            [r * k, g * k, b * k]
        })
        .collect()
}

/// Colors encoding unit normals, `(n + 1) / 2` per component.
pub fn normal_colors(normals: &[Vector3<f64>]) -> Vec<[f64; 3]> {
    normals
        .iter()
        .map(|n| [(n.x + 1.0) * 0.5, (n.y + 1.0) * 0.5, (n.z + 1.0) * 0.5])
        .collect()
}

/// Quantize a color to 8-bit channels.
pub fn to_rgb8(color: [f64; 3]) -> [u8; 3] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Area-weighted vertex normals. Vertices in no triangle get a zero normal.
pub fn vertex_normals(mesh: &TriMesh) -> Vec<Vector3<f64>> {
    let mut normals = vec![Vector3::zeros(); mesh.num_vertices()];
    for t in 0..mesh.num_triangles() {
        let [p0, p1, p2] = mesh.triangle_positions(t);
        // Cross product length is twice the area
        let n = (p1 - p0).cross(&(p2 - p0));
        for v in mesh.triangle(t) {
            normals[v] += n;
        }
    }
    for n in &mut normals {
        let len = n.norm();
        if len > 1e-12 {
            *n /= len;
        } else {
            *n = Vector3::zeros();
        }
    }
    normals
}

/// Copy of `mesh` with every vertex moved by `scale * weight` along +z.
///
/// # Errors
///
/// Returns [`HarmonicError::DimensionMismatch`] if the map does not hold one
/// value per vertex.
pub fn deform_along_z(mesh: &TriMesh, weights: &WeightMap, scale: f64) -> Result<TriMesh> {
    if weights.len() != mesh.num_vertices() {
        return Err(HarmonicError::DimensionMismatch {
            expected: mesh.num_vertices(),
            actual: weights.len(),
        });
    }
    let positions: Vec<Point3<f64>> = mesh
        .vertices()
        .iter()
        .zip(weights.iter())
        .map(|(p, w)| Point3::new(p.x, p.y, p.z + w * scale))
        .collect();
    mesh.with_positions(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_heat_ramp_quarters() {
        assert_eq!(heat_color(0.25), [0.0, 1.0, 1.0]);
        assert_eq!(heat_color(0.75), [1.0, 1.0, 0.0]);
        assert_eq!(heat_color(-3.0), heat_color(0.0));
        assert_eq!(heat_color(7.0), heat_color(1.0));
        let [r, g, b] = heat_color(0.125);
        assert_eq!((r, b), (0.0, 1.0));
        assert_relative_eq!(g, 0.5);
    }

    #[test]
    fn test_level_curves() {
        assert_relative_eq!(level_curves(0.0, 10.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(level_curves(0.3, 10.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(level_curves(0.05, 10.0), 0.0, epsilon = 1e-12);
        assert!(level_curves(0.02, 10.0) > 0.9);
    }

    #[test]
    fn test_rgb8() {
        assert_eq!(to_rgb8([0.0, 0.5, 1.0]), [0, 128, 255]);
        assert_eq!(to_rgb8([-1.0, 2.0, 1.0]), [0, 255, 255]);
    }

    #[test]
    fn test_normals_and_deform() {
        let mesh = TriMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();

        let normals = vertex_normals(&mesh);
        assert_eq!(normals[0], Vector3::z());
        assert_eq!(normals[3], Vector3::zeros());
        assert_eq!(normal_colors(&normals)[0], [0.5, 0.5, 1.0]);

        let weights = WeightMap::new(vec![0.0, 1.0, 0.5, 2.0]);
        let lifted = deform_along_z(&mesh, &weights, 2.0).unwrap();
        assert_eq!(lifted.position(1).z, 2.0);
        assert_eq!(lifted.position(3).z, 13.0);
        assert_eq!(lifted.triangles(), mesh.triangles());

        assert!(deform_along_z(&mesh, &WeightMap::new(vec![0.0]), 1.0).is_err());
    }

    #[test]
    fn test_weight_colors_with_levels() {
        let weights = WeightMap::new(vec![0.05, 1.0]);
        let plain = weight_colors(&weights, None);
        assert_eq!(plain[1], [1.0, 0.0, 0.0]);

        let banded = weight_colors(&weights, Some(10.0));
        assert!(banded[0].iter().all(|c| c.abs() < 1e-12));
        assert_relative_eq!(banded[1][0], 1.0, epsilon = 1e-12);
    }
}

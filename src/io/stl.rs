//! STL (stereolithography) format support.
//!
//! STL stores every triangle with its own three corners. `stl_io` welds
//! corners with identical coordinates into shared vertices on load, which
//! is what ring construction needs: without welding every vertex would be
//! a boundary vertex of its own triangle.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles that collapse to
/// a repeated vertex after welding are dropped.
///
/// # Example
///
/// ```no_run
/// use harmonic::io::stl;
///
/// let mesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| HarmonicError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|f| f.vertices)
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    if faces.is_empty() {
        return Err(HarmonicError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    debug!(
        vertices = vertices.len(),
        triangles = faces.len(),
        dropped = stl.faces.len() - faces.len(),
        "welded STL corners"
    );
    TriMesh::new(vertices, faces)
}

/// Save a mesh to a binary STL file.
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let triangles: Vec<stl_io::Triangle> = (0..mesh.num_triangles())
        .map(|t| {
            let n = mesh.triangle_normal(t);
            let [p0, p1, p2] = mesh.triangle_positions(t);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| HarmonicError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

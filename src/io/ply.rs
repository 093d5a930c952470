//! PLY (Stanford polygon) format support.
//!
//! Loading goes through `ply-rs` and accepts ASCII and binary files. Saving
//! writes ASCII, with optional per-vertex `red green blue` properties so a
//! colored weight map can be opened in any mesh viewer.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

/// Load a mesh from a PLY file.
///
/// Polygons are fan-triangulated.
///
/// # Example
///
/// ```no_run
/// use harmonic::io::ply;
///
/// let mesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let load_error = |message: &str| HarmonicError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x").ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y").ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z").ok_or_else(|| load_error("vertex missing z coordinate"))?;
        vertices.push(Point3::new(x, y, z));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;

        for i in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    TriMesh::new(vertices, faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    write_file(mesh, None, path.as_ref())
}

/// Save a mesh with per-vertex colors to a PLY file (ASCII format).
///
/// # Errors
///
/// Returns [`HarmonicError::DimensionMismatch`] if there is not one color per vertex.
///
/// # Example
///
/// ```no_run
/// use harmonic::io::ply;
/// use harmonic::mesh::TriMesh;
///
/// let mesh = ply::load("model.ply").unwrap();
/// let red = vec![[255, 0, 0]; mesh.num_vertices()];
/// ply::save_with_colors(&mesh, &red, "red.ply").unwrap();
/// ```
pub fn save_with_colors<P: AsRef<Path>>(mesh: &TriMesh, colors: &[[u8; 3]], path: P) -> Result<()> {
    if colors.len() != mesh.num_vertices() {
        return Err(HarmonicError::DimensionMismatch {
            expected: mesh.num_vertices(),
            actual: colors.len(),
        });
    }
    write_file(mesh, Some(colors), path.as_ref())
}

fn write_file(mesh: &TriMesh, colors: Option<&[[u8; 3]]>, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by harmonic")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "element face {}", mesh.num_triangles())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, v) in mesh.vertices().iter().enumerate() {
        match colors {
            Some(c) => {
                let [r, g, b] = c[i];
                writeln!(writer, "{} {} {} {} {} {}", v.x, v.y, v.z, r, g, b)?;
            }
            None => writeln!(writer, "{} {} {}", v.x, v.y, v.z)?,
        }
    }

    for f in mesh.triangles() {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}

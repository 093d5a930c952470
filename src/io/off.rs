//! OFF (Object File Format) support.
//!
//! Reads plain `OFF` and colored `COFF` files. Faces with more than three
//! corners are fan-triangulated; `#` starts a comment that runs to the end
//! of the line. Writing produces `OFF`, or `COFF` when vertex colors are
//! given.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

/// Load a mesh from an OFF file.
///
/// # Example
///
/// ```no_run
/// use harmonic::io::off;
///
/// let mesh = off::load("model.off").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let mut text = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut text)?;

    let (vertices, faces) = parse(&text).map_err(|message| HarmonicError::LoadError {
        path: path.to_path_buf(),
        message,
    })?;
    TriMesh::new(vertices, faces)
}

/// Parse OFF text into vertex positions and triangles.
pub fn parse(text: &str) -> std::result::Result<(Vec<Point3<f64>>, Vec<[usize; 3]>), String> {
    let all: Vec<&str> = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace)
        .collect();
    let mut tokens = all.iter().copied();

    let header = tokens.next().ok_or("file is empty")?;
    let colored = match header {
        "OFF" => false,
        "COFF" => true,
        other => return Err(format!("expected OFF header, found '{}'", other)),
    };

    let num_vertices: usize = next_value(&mut tokens, "vertex count")?;
    let num_faces: usize = next_value(&mut tokens, "face count")?;
    let _num_edges: usize = next_value(&mut tokens, "edge count")?;

    // Counts come from the file: check them against what is left before allocating
    let per_vertex = if colored { 7 } else { 3 };
    let vertex_tokens = num_vertices.checked_mul(per_vertex);
    if vertex_tokens.map_or(true, |needed| needed > tokens.len()) {
        return Err(format!("vertex count {} exceeds file contents", num_vertices));
    }

    let mut vertices = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        let x = next_value(&mut tokens, "vertex x")?;
        let y = next_value(&mut tokens, "vertex y")?;
        let z = next_value(&mut tokens, "vertex z")?;
        if colored {
            for _ in 0..4 {
                let _: f64 = next_value(&mut tokens, "vertex color")?;
            }
        }
        vertices.push(Point3::new(x, y, z));
    }

    if num_faces > tokens.len() {
        return Err(format!("face count {} exceeds file contents", num_faces));
    }

    let mut faces = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        let corners: usize = next_value(&mut tokens, "face size")?;
        if corners > tokens.len() {
            return Err(format!("face size {} exceeds file contents", corners));
        }
        let mut indices = Vec::with_capacity(corners);
        for _ in 0..corners {
            indices.push(next_value::<usize>(&mut tokens, "face index")?);
        }
        for i in 1..corners.saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    Ok((vertices, faces))
}

fn next_value<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> std::result::Result<T, String> {
    let token = tokens
        .next()
        .ok_or_else(|| format!("unexpected end of file reading {}", what))?;
    token
        .parse()
        .map_err(|_| format!("invalid {}: '{}'", what, token))
}

/// Save a mesh to an OFF file.
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    write_file(mesh, None, path.as_ref())
}

/// Save a mesh with per-vertex colors to a COFF file.
///
/// # Errors
///
/// Returns [`HarmonicError::DimensionMismatch`] if there is not one color per vertex.
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
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{}", if colors.is_some() { "COFF" } else { "OFF" })?;
    writeln!(writer, "{} {} 0", mesh.num_vertices(), mesh.num_triangles())?;

    for (i, p) in mesh.vertices().iter().enumerate() {
        match colors {
            Some(c) => {
                let [r, g, b] = c[i];
                writeln!(writer, "{} {} {} {} {} {} 255", p.x, p.y, p.z, r, g, b)?;
            }
            None => writeln!(writer, "{} {} {}", p.x, p.y, p.z)?,
        }
    }
    for t in mesh.triangles() {
        writeln!(writer, "3 {} {} {}", t[0], t[1], t[2])?;
    }

    writer.flush()?;
    Ok(())
}

//! Mesh and weight file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Colors |
//! |--------|-----------|------|------|--------|
//! | OFF | `.off` | ✓ | ✓ | ✓ (COFF) |
//! | PLY | `.ply` | ✓ | ✓ | ✓ |
//! | STL | `.stl` | ✓ | ✓ | ✗ |
//!
//! Weight maps are written as plain text, one value per line, to `.txt` or
//! `.csv` files.
//!
//! # Usage
//!
//! ```no_run
//! use harmonic::io::{load, save};
//!
//! // Load with automatic format detection
//! let mesh = load("model.off").unwrap();
//!
//! // Save with automatic format detection
//! save(&mesh, "output.ply").unwrap();
//! ```

pub mod off;
pub mod ply;
pub mod stl;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::algo::weights::WeightMap;
use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Object File Format.
    Off,
    /// PLY (Stanford polygon) format.
    Ply,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "off" => Some(Format::Off),
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Whether the format can store per-vertex colors.
    pub fn supports_colors(self) -> bool {
        matches!(self, Format::Off | Format::Ply)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| HarmonicError::UnsupportedFormat {
        extension: extension_of(path),
    })
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("(none)")
        .to_string()
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Off => off::load(path),
        Format::Ply => ply::load(path),
        Format::Stl => stl::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Off => off::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
        Format::Stl => stl::save(mesh, path),
    }
}

/// Save a mesh with per-vertex colors, detecting the format from the extension.
///
/// # Errors
///
/// Returns [`HarmonicError::SaveError`] for formats without color support.
pub fn save_with_colors<P: AsRef<Path>>(mesh: &TriMesh, colors: &[[u8; 3]], path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Off => off::save_with_colors(mesh, colors, path),
        Format::Ply => ply::save_with_colors(mesh, colors, path),
        Format::Stl => Err(HarmonicError::SaveError {
            path: path.to_path_buf(),
            message: "STL cannot store vertex colors".to_string(),
        }),
    }
}

/// Write a weight map as text, one value per line in vertex order.
pub fn save_weights<P: AsRef<Path>>(weights: &WeightMap, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for w in weights.iter() {
        writeln!(writer, "{}", w)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a weight map written by [`save_weights`]. Blank lines are skipped.
pub fn load_weights<P: AsRef<Path>>(path: P) -> Result<WeightMap> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed.parse::<f64>().map_err(|_| HarmonicError::LoadError {
            path: path.to_path_buf(),
            message: format!("line {}: invalid weight '{}'", number + 1, trimmed),
        })?;
        values.push(value);
    }
    Ok(WeightMap::new(values))
}

//! Boundary condition presets.
//!
//! Presets pick pinned vertices from their positions, assuming the model
//! roughly fills `[-1, 1]` in x and y. Heights are measured as the
//! normalized coordinate `d = (y + 1) / 2`.
//!
//! # Example
//!
//! ```
//! use harmonic::algo::selector::{select_boundaries, BoundaryPreset};
//! use harmonic::mesh::TriMesh;
//! use nalgebra::Point3;
//!
//! let mesh = TriMesh::new(
//!     vec![
//!         Point3::new(0.0, -1.0, 0.0),
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! )
//! .unwrap();
//!
//! let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();
//! assert_eq!(pins.len(), 2);
//! assert_eq!((pins[0].vertex, pins[0].value), (0, 0.0));
//! assert_eq!((pins[1].vertex, pins[1].value), (2, 1.0));
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{HarmonicError, Result};
use crate::mesh::TriMesh;

use super::constraint::BoundaryCondition;

/// Default band width of [`BoundaryPreset::Strip`].
pub const DEFAULT_STRIP_LENGTH: f64 = 0.1;

/// Default band width and disc radius squared of [`BoundaryPreset::Cone`].
pub const DEFAULT_CONE_LENGTH: f64 = 0.01;

/// How pinned vertices are chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryPreset {
    /// Bottom and top bands: vertices with `d < length` or `d > 1 - length`
    /// are pinned to `d`, giving a ramp from bottom to top.
    Strip {
        /// Band width in normalized height.
        length: f64,
    },
    /// All four side bands pinned to 0 and a central disc
    /// `x^2 + y^2 < length` pinned to 1, giving a cone-shaped bump.
    Cone {
        /// Band width, also the disc radius squared.
        length: f64,
    },
    /// A caller-supplied list.
    Explicit(Vec<BoundaryCondition>),
}

impl BoundaryPreset {
    /// Strip preset with the default width.
    pub fn strip() -> Self {
        BoundaryPreset::Strip {
            length: DEFAULT_STRIP_LENGTH,
        }
    }

    /// Cone preset with the default width.
    pub fn cone() -> Self {
        BoundaryPreset::Cone {
            length: DEFAULT_CONE_LENGTH,
        }
    }
}

impl Default for BoundaryPreset {
    fn default() -> Self {
        Self::strip()
    }
}

/// Select boundary conditions on `mesh` according to `preset`.
///
/// A vertex matched by several rules keeps the first condition; the list is
/// therefore free of duplicates and ready for the solver.
///
/// # Errors
///
/// - [`HarmonicError::InvalidParameter`] if a preset length is not in `(0, 1]`
/// - [`HarmonicError::BoundaryOutOfRange`] if an explicit condition names a
///   vertex the mesh does not have
pub fn select_boundaries(mesh: &TriMesh, preset: &BoundaryPreset) -> Result<Vec<BoundaryCondition>> {
    let candidates = match preset {
        BoundaryPreset::Strip { length } => {
            check_length(*length)?;
            strip(mesh, *length)
        }
        BoundaryPreset::Cone { length } => {
            check_length(*length)?;
            cone(mesh, *length)
        }
        BoundaryPreset::Explicit(list) => {
            if let Some(bc) = list.iter().find(|bc| bc.vertex >= mesh.num_vertices()) {
                return Err(HarmonicError::BoundaryOutOfRange {
                    vertex: bc.vertex,
                    vertex_count: mesh.num_vertices(),
                });
            }
            list.clone()
        }
    };

    let total = candidates.len();
    let mut seen = HashSet::with_capacity(total);
    let selected: Vec<BoundaryCondition> = candidates
        .into_iter()
        .filter(|bc| seen.insert(bc.vertex))
        .collect();

    if selected.is_empty() {
        warn!(?preset, "no vertex selected as boundary; the solve will fail");
    }
    debug!(
        selected = selected.len(),
        dropped = total - selected.len(),
        "selected boundary conditions"
    );
    Ok(selected)
}

fn check_length(length: f64) -> Result<()> {
    if length.is_finite() && length > 0.0 && length <= 1.0 {
        Ok(())
    } else {
        Err(HarmonicError::invalid_param("length", length, "must be in (0, 1]"))
    }
}

fn strip(mesh: &TriMesh, length: f64) -> Vec<BoundaryCondition> {
    let mut out = Vec::new();
    for (i, p) in mesh.vertices().iter().enumerate() {
        let d = (p.y + 1.0) * 0.5;
        if d < length {
            out.push(BoundaryCondition::new(i, d));
        }
        if d > 1.0 - length {
            out.push(BoundaryCondition::new(i, d));
        }
    }
    out
}

fn cone(mesh: &TriMesh, length: f64) -> Vec<BoundaryCondition> {
    let mut out = Vec::new();
    for (i, p) in mesh.vertices().iter().enumerate() {
        let dy = (p.y + 1.0) * 0.5;
        let dx = (p.x + 1.0) * 0.5;
        let on_side = dy < length || dy > 1.0 - length || dx < length || dx > 1.0 - length;
        if on_side {
            out.push(BoundaryCondition::new(i, 0.0));
        }
        if p.x * p.x + p.y * p.y < length {
            out.push(BoundaryCondition::new(i, 1.0));
        }
    }
    out
}

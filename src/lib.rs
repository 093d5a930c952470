//! # Harmonic
//!
//! Harmonic weight maps on triangle meshes.
//!
//! Given a triangle mesh and a handful of vertices pinned to fixed values,
//! harmonic computes for every other vertex the value that makes the whole
//! field satisfy the discrete Laplace equation with cotangent weights. The
//! result interpolates smoothly between the pins and is useful for skinning
//! weights, scalar field design and parameterization seeds.
//!
//! ## Features
//!
//! - **Soup-tolerant topology**: first rings are recovered from an unordered
//!   triangle list, with boundary and non-manifold vertices flagged rather
//!   than rejected
//! - **Two assembly strategies**: row-wise from ordered rings, or edge-wise
//!   straight from triangles
//! - **Direct solve**: sparse LU with threshold pivoting over a reverse
//!   Cuthill-McKee ordering, or dense LU for small systems
//! - **File formats**: OFF, PLY, STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use harmonic::prelude::*;
//!
//! let mesh = harmonic::io::load("model.off").unwrap();
//! let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();
//!
//! let result = harmonic_map(&mesh, &pins, &HarmonicOptions::default()).unwrap();
//! harmonic::io::save_weights(&result.weights, "weights.txt").unwrap();
//! ```
//!
//! ## Solving Over Raw Arrays
//!
//! ```
//! use harmonic::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let triangles = [[0, 1, 2]];
//! let pins = [BoundaryCondition::new(0, 0.0), BoundaryCondition::new(1, 1.0)];
//!
//! // No rings given: assembled from triangles
//! let weights =
//!     solve_harmonic(&vertices, &[], &triangles, &pins, &HarmonicOptions::default()).unwrap();
//! assert!((weights.get(2) - 0.25).abs() < 1e-5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

pub use error::{HarmonicError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use harmonic::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::constraint::BoundaryCondition;
    pub use crate::algo::harmonic::{
        harmonic_map, harmonic_map_with_progress, solve_harmonic, AssemblyPreference,
        HarmonicMap, HarmonicOptions,
    };
    pub use crate::algo::laplacian::{Assembly, LaplacianOptions, Normalization};
    pub use crate::algo::selector::{select_boundaries, BoundaryPreset};
    pub use crate::algo::solver::{DenseLu, SolverKind, SparseLu};
    pub use crate::algo::weights::WeightMap;
    pub use crate::error::{HarmonicError, Result};
    pub use crate::mesh::{RingSet, TriMesh, VertexFaceMap};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

//! Error types for harmonic.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! identifies the pipeline stage that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`HarmonicError`].
pub type Result<T> = std::result::Result<T, HarmonicError>;

/// Errors that can occur while building or solving a harmonic system.
#[derive(Error, Debug)]
pub enum HarmonicError {
    /// A triangle references a vertex index outside the vertex array.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    MalformedMesh {
        /// The triangle index.
        triangle: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A first-ring neighbor list references an invalid vertex index.
    #[error("ring of vertex {vertex} references invalid vertex index {neighbor}")]
    MalformedRing {
        /// The vertex owning the ring.
        vertex: usize,
        /// The invalid neighbor index.
        neighbor: usize,
    },

    /// Neither first-ring neighbors nor triangles were supplied.
    #[error("no topology given: both rings and triangles are empty")]
    MissingTopology,

    /// A boundary condition references a vertex that does not exist.
    #[error("boundary vertex {vertex} is out of range (mesh has {vertex_count} vertices)")]
    BoundaryOutOfRange {
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The same vertex is pinned more than once.
    #[error("vertex {vertex} appears more than once in the boundary list")]
    DuplicateBoundary {
        /// The duplicated vertex index.
        vertex: usize,
    },

    /// Two inputs that must agree in size do not.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Factorization found no usable pivot (singular or under-constrained system).
    #[error("matrix is singular: no usable pivot in column {column}")]
    SingularMatrix {
        /// The elimination step at which factorization broke down.
        column: usize,
    },

    /// The solver reported a numerical failure.
    #[error("solver failure: {0}")]
    SolverFailure(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl HarmonicError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        HarmonicError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error came out of the factorization / solve stage.
    pub fn is_solver_error(&self) -> bool {
        matches!(
            self,
            HarmonicError::SingularMatrix { .. } | HarmonicError::SolverFailure(_)
        )
    }
}

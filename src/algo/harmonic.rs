//! Harmonic weight maps.
//!
//! A harmonic map assigns every vertex the weighted average of its
//! neighbors, except at pinned vertices, by solving `L x = 0` with
//! Dirichlet rows for the pins. The result varies smoothly between pinned
//! regions and never leaves the range of the pinned values.
//!
//! # Algorithm
//!
//! 1. Build vertex-to-triangle incidence
//! 2. Order each vertex's first ring
//! 3. Assemble the cotangent Laplacian
//! 4. Replace pinned rows by identity rows
//! 5. Factorize and solve
//!
//! # Example
//!
//! ```
//! use harmonic::algo::harmonic::{harmonic_map, HarmonicOptions};
//! use harmonic::algo::constraint::BoundaryCondition;
//! use harmonic::mesh::TriMesh;
//! use nalgebra::Point3;
//!
//! // Unit square split into two triangles, pins on opposite corners
//! let mesh = TriMesh::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! )
//! .unwrap();
//! let pins = [BoundaryCondition::new(0, 0.0), BoundaryCondition::new(2, 1.0)];
//!
//! let result = harmonic_map(&mesh, &pins, &HarmonicOptions::default()).unwrap();
//! assert_eq!(result.weights.get(0), 0.0);
//! assert_eq!(result.weights.get(2), 1.0);
//! assert!((result.weights.get(1) - 0.5).abs() < 1e-6);
//! ```

use nalgebra::Point3;
use tracing::{debug, info};

use crate::error::Result;
use crate::mesh::{RingOptions, RingSet, TriMesh, VertexFaceMap};

use super::constraint::{apply_constraints, pin_disconnected, validate_boundaries, BoundaryCondition};
use super::laplacian::{Assembly, LaplacianOptions, Normalization};
use super::progress::{Progress, Stage};
use super::solver::SolverKind;
use super::weights::WeightMap;

/// Which topology [`harmonic_map`] assembles from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssemblyPreference {
    /// Build ordered rings and assemble row by row.
    #[default]
    Rings,
    /// Skip ring construction and assemble from triangles.
    Triangles,
}

/// Options for harmonic weight computation.
#[derive(Debug, Clone)]
pub struct HarmonicOptions {
    /// Topology used for assembly (default: rings).
    pub assembly: AssemblyPreference,

    /// Laplacian assembly options.
    pub laplacian: LaplacianOptions,

    /// Linear solver (default: sparse LU).
    pub solver: SolverKind,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for HarmonicOptions {
    fn default() -> Self {
        Self {
            assembly: AssemblyPreference::Rings,
            laplacian: LaplacianOptions::default(),
            solver: SolverKind::default(),
            parallel: true,
        }
    }
}

impl HarmonicOptions {
    /// Set the assembly topology.
    pub fn with_assembly(mut self, assembly: AssemblyPreference) -> Self {
        self.assembly = assembly;
        self
    }

    /// Set the Laplacian row normalization.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.laplacian.normalization = normalization;
        self
    }

    /// Set the linear solver.
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self.laplacian.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    fn laplacian_options(&self) -> LaplacianOptions {
        self.laplacian.clone().with_parallel(self.parallel && self.laplacian.parallel)
    }
}

/// Result of [`harmonic_map`]: the weights plus what was learned about the
/// mesh on the way.
#[derive(Debug, Clone)]
pub struct HarmonicMap {
    /// Solved per-vertex values.
    pub weights: WeightMap,

    /// Vertices whose star is not a single fan (empty when rings were not built).
    pub non_manifold_vertices: Vec<usize>,

    /// Vertices on a mesh border (empty when rings were not built).
    pub boundary_vertices: Vec<usize>,

    /// Vertices in no triangle; these are pinned to zero unless pinned explicitly.
    pub disconnected_vertices: Vec<usize>,
}

/// Solve for harmonic weights over raw topology.
///
/// `rings` is used when non-empty (one ordered neighbor list per vertex);
/// otherwise the Laplacian is assembled from `triangles`.
///
/// # Errors
///
/// - [`MissingTopology`](crate::HarmonicError::MissingTopology) if `rings`
///   and `triangles` are both empty
/// - [`DimensionMismatch`](crate::HarmonicError::DimensionMismatch) if
///   `rings` does not hold one list per vertex
/// - [`MalformedMesh`](crate::HarmonicError::MalformedMesh),
///   [`MalformedRing`](crate::HarmonicError::MalformedRing) for bad indices
/// - [`BoundaryOutOfRange`](crate::HarmonicError::BoundaryOutOfRange),
///   [`DuplicateBoundary`](crate::HarmonicError::DuplicateBoundary) for a bad
///   boundary list
/// - [`SingularMatrix`](crate::HarmonicError::SingularMatrix) if the system
///   is under-constrained (for instance with no boundary at all)
pub fn solve_harmonic(
    vertices: &[Point3<f64>],
    rings: &[Vec<usize>],
    triangles: &[[usize; 3]],
    boundaries: &[BoundaryCondition],
    options: &HarmonicOptions,
) -> Result<WeightMap> {
    let assembly = Assembly::from_topology(rings, triangles)?;
    validate_boundaries(boundaries, vertices.len())?;
    solve_system(assembly, vertices, boundaries, options, &Progress::none())
}

/// Compute harmonic weights on a mesh.
///
/// See [`harmonic_map_with_progress`].
pub fn harmonic_map(
    mesh: &TriMesh,
    boundaries: &[BoundaryCondition],
    options: &HarmonicOptions,
) -> Result<HarmonicMap> {
    harmonic_map_with_progress(mesh, boundaries, options, &Progress::none())
}

/// Compute harmonic weights on a mesh, reporting each pipeline stage.
///
/// # Errors
///
/// Same as [`solve_harmonic`].
pub fn harmonic_map_with_progress(
    mesh: &TriMesh,
    boundaries: &[BoundaryCondition],
    options: &HarmonicOptions,
    progress: &Progress,
) -> Result<HarmonicMap> {
    validate_boundaries(boundaries, mesh.num_vertices())?;

    progress.stage(Stage::Topology);
    let faces = VertexFaceMap::build(mesh);

    progress.stage(Stage::Rings);
    let rings = match options.assembly {
        AssemblyPreference::Rings => Some(RingSet::build(
            mesh,
            &faces,
            &RingOptions::default().with_parallel(options.parallel),
        )),
        AssemblyPreference::Triangles => None,
    };
    let neighbor_lists = rings.as_ref().map(RingSet::neighbor_lists).unwrap_or_default();

    let assembly = Assembly::from_topology(&neighbor_lists, mesh.triangles())?;
    let weights = solve_system(assembly, mesh.vertices(), boundaries, options, progress)?;

    let (non_manifold_vertices, boundary_vertices) = match &rings {
        Some(r) => (r.non_manifold_vertices(), r.boundary_vertices()),
        None => (Vec::new(), Vec::new()),
    };

    Ok(HarmonicMap {
        weights,
        non_manifold_vertices,
        boundary_vertices,
        disconnected_vertices: faces.disconnected_vertices(),
    })
}

fn solve_system(
    assembly: Assembly<'_>,
    vertices: &[Point3<f64>],
    boundaries: &[BoundaryCondition],
    options: &HarmonicOptions,
    progress: &Progress,
) -> Result<WeightMap> {
    progress.stage(Stage::Assembly);
    let mut matrix = assembly.assemble(vertices, &options.laplacian_options())?;

    progress.stage(Stage::Constraints);
    let mut rhs = apply_constraints(&mut matrix, boundaries);
    let unpinned = pin_disconnected(&mut matrix, &mut rhs);
    debug!(
        pinned = boundaries.len(),
        disconnected = unpinned.len(),
        "applied boundary conditions"
    );

    progress.stage(Stage::Solve);
    let x = options.solver.solve(&matrix.to_csc(), &rhs)?;
    let weights = WeightMap::from(x);

    if let Some((lo, hi)) = weights.range() {
        info!(
            vertices = vertices.len(),
            strategy = assembly.name(),
            solver = options.solver.name(),
            min = lo,
            max = hi,
            "solved harmonic weights"
        );
    }
    Ok(weights)
}

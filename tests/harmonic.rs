//! End-to-end tests for harmonic weight maps.
//!
//! Run with: cargo test --test harmonic

use approx::assert_abs_diff_eq;
use harmonic::algo::constraint::apply_constraints;
use harmonic::mesh::RingOptions;
use harmonic::prelude::*;
use nalgebra::Point3;
use proptest::prelude::*;

// =============================================================================
// Fixtures
// =============================================================================

/// Regular grid over `[-1, 1]^2` with `n` cells per side, split along the
/// diagonal so every angle is 45 or 90 degrees.
fn grid(n: usize) -> TriMesh {
    let step = 2.0 / n as f64;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(-1.0 + i as f64 * step, -1.0 + j as f64 * step, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + n + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    TriMesh::new(vertices, faces).unwrap()
}

fn icosahedron() -> TriMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let vertices = vec![
        Point3::new(-1.0, t, 0.0),
        Point3::new(1.0, t, 0.0),
        Point3::new(-1.0, -t, 0.0),
        Point3::new(1.0, -t, 0.0),
        Point3::new(0.0, -1.0, t),
        Point3::new(0.0, 1.0, t),
        Point3::new(0.0, -1.0, -t),
        Point3::new(0.0, 1.0, -t),
        Point3::new(t, 0.0, -1.0),
        Point3::new(t, 0.0, 1.0),
        Point3::new(-t, 0.0, -1.0),
        Point3::new(-t, 0.0, 1.0),
    ];
    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    TriMesh::new(vertices, faces).unwrap()
}

fn is_border(mesh: &TriMesh, v: usize) -> bool {
    let p = mesh.position(v);
    let eps = 1e-9;
    p.x.abs() > 1.0 - eps || p.y.abs() > 1.0 - eps
}

// =============================================================================
// Laplacian structure
// =============================================================================

#[test]
fn test_icosahedron_rows_sum_to_zero() {
    let mesh = icosahedron();
    let rings = RingSet::from_mesh(&mesh);
    assert!(rings.is_closed());
    assert!(rings.iter().all(|r| r.len() == 5));

    let neighbor_lists = rings.neighbor_lists();
    let options = LaplacianOptions::default();
    let from_rings = Assembly::RingBased(&neighbor_lists)
        .assemble(mesh.vertices(), &options)
        .unwrap();
    let from_triangles = Assembly::TriangleBased(mesh.triangles())
        .assemble(mesh.vertices(), &options)
        .unwrap();

    for v in 0..mesh.num_vertices() {
        assert_abs_diff_eq!(from_rings.row_sum(v), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(from_triangles.row_sum(v), 0.0, epsilon = 1e-9);
        for u in 0..mesh.num_vertices() {
            assert_abs_diff_eq!(from_rings.get(v, u), from_triangles.get(v, u), epsilon = 1e-5);
        }
    }
}

#[test]
fn test_tetrahedron_rows_sum_to_zero() {
    let mesh = TriMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
    )
    .unwrap();
    let rings = RingSet::from_mesh(&mesh).neighbor_lists();

    for assembly in [Assembly::RingBased(&rings), Assembly::TriangleBased(mesh.triangles())] {
        let lap = assembly.assemble(mesh.vertices(), &LaplacianOptions::default()).unwrap();
        for v in 0..4 {
            assert_abs_diff_eq!(lap.row_sum(v), 0.0, epsilon = 1e-9);
            // Every pair is an edge on a tetrahedron
            assert!(lap.row_entries(v).count() == 4, "{} row {}", assembly.name(), v);
        }
    }
}

#[test]
fn test_grid_weights_are_non_negative() {
    // Right isosceles triangles: every off-diagonal weight is 0 or positive
    let mesh = grid(6);
    let matrix = Assembly::TriangleBased(mesh.triangles())
        .assemble(mesh.vertices(), &LaplacianOptions::default())
        .unwrap();

    for (row, col, value) in matrix.iter() {
        if row != col {
            assert!(value >= -1e-12, "weight ({}, {}) = {}", row, col, value);
        }
    }
}

// =============================================================================
// Solutions
// =============================================================================

#[test]
fn test_strip_preset_reproduces_linear_ramp() {
    let mesh = grid(20);
    assert_eq!(mesh.num_vertices(), 21 * 21);
    let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();
    // Whole rows at the bottom and top
    assert!(pins.len() >= 4 * 21 && pins.len() % 21 == 0, "{} pins", pins.len());

    for assembly in [AssemblyPreference::Rings, AssemblyPreference::Triangles] {
        let options = HarmonicOptions::default().with_assembly(assembly);
        let result = harmonic_map(&mesh, &pins, &options).unwrap();

        let deviation: f64 = mesh
            .vertices()
            .iter()
            .zip(result.weights.iter())
            .map(|(p, w)| (w - (p.y + 1.0) / 2.0).abs())
            .sum::<f64>()
            / mesh.num_vertices() as f64;
        assert!(deviation < 0.05, "{:?}: mean deviation {}", assembly, deviation);

        for bc in &pins {
            assert_abs_diff_eq!(result.weights.get(bc.vertex), bc.value, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_maximum_principle_with_border_pins() {
    let mesh = grid(12);
    let pins: Vec<BoundaryCondition> = (0..mesh.num_vertices())
        .filter(|&v| is_border(&mesh, v))
        .map(|v| {
            let p = mesh.position(v);
            // Bumpy but bounded border data in [0, 1]
            BoundaryCondition::new(v, 0.5 + 0.5 * (3.0 * p.x).sin() * (2.0 * p.y).cos())
        })
        .collect();

    let lo = pins.iter().map(|bc| bc.value).fold(f64::INFINITY, f64::min);
    let hi = pins.iter().map(|bc| bc.value).fold(f64::NEG_INFINITY, f64::max);

    for assembly in [AssemblyPreference::Rings, AssemblyPreference::Triangles] {
        let options = HarmonicOptions::default().with_assembly(assembly);
        let result = harmonic_map(&mesh, &pins, &options).unwrap();
        for v in (0..mesh.num_vertices()).filter(|&v| !is_border(&mesh, v)) {
            let w = result.weights.get(v);
            assert!(
                w >= lo - 1e-9 && w <= hi + 1e-9,
                "{:?}: vertex {} = {} outside [{}, {}]",
                assembly,
                v,
                w,
                lo,
                hi
            );
        }
    }
}

#[test]
fn test_cone_preset_peaks_in_the_middle() {
    let mesh = grid(20);
    let pins = select_boundaries(&mesh, &BoundaryPreset::Cone { length: 0.05 }).unwrap();
    let result = harmonic_map(&mesh, &pins, &HarmonicOptions::default()).unwrap();

    let (lo, hi) = result.weights.range().unwrap();
    assert!(lo >= -1e-9 && hi <= 1.0 + 1e-9);

    // Center vertex sits in the disc
    let center = 10 * 21 + 10;
    assert_abs_diff_eq!(result.weights.get(center), 1.0, epsilon = 1e-12);

    // Values fall off toward the border along the middle row
    let row: Vec<f64> = (10..=20).map(|i| result.weights.get(10 * 21 + i)).collect();
    for pair in row.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9, "not decreasing: {:?}", row);
    }
}

#[test]
fn test_sparse_and_dense_agree_on_grid() {
    let mesh = grid(8);
    let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();

    let sparse = harmonic_map(&mesh, &pins, &HarmonicOptions::default()).unwrap();
    let dense = harmonic_map(
        &mesh,
        &pins,
        &HarmonicOptions::default().with_solver(SolverKind::DenseLu(DenseLu::default())),
    )
    .unwrap();

    for (a, b) in sparse.weights.iter().zip(dense.weights.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }
}

#[test]
fn test_solution_satisfies_system() {
    let mesh = grid(10);
    let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();
    let weights = solve_harmonic(
        mesh.vertices(),
        &[],
        mesh.triangles(),
        &pins,
        &HarmonicOptions::default(),
    )
    .unwrap();

    let mut matrix = Assembly::TriangleBased(mesh.triangles())
        .assemble(mesh.vertices(), &LaplacianOptions::default())
        .unwrap();
    let rhs = apply_constraints(&mut matrix, &pins);
    let x = nalgebra::DVector::from_column_slice(weights.as_slice());
    let residual = matrix.mul_vec(&x) - rhs;
    assert!(residual.amax() < 1e-9, "residual {}", residual.amax());
}

// =============================================================================
// File round trip
// =============================================================================

#[test]
fn test_off_file_to_weights_file() {
    let mesh = grid(6);
    let dir = tempfile::tempdir().unwrap();
    let mesh_path = dir.path().join("grid.off");
    let weight_path = dir.path().join("grid.txt");

    harmonic::io::save(&mesh, &mesh_path).unwrap();
    let loaded = harmonic::io::load(&mesh_path).unwrap();
    assert_eq!(loaded.num_vertices(), mesh.num_vertices());
    assert_eq!(loaded.num_triangles(), mesh.num_triangles());

    let pins = select_boundaries(&loaded, &BoundaryPreset::strip()).unwrap();
    let result = harmonic_map(&loaded, &pins, &HarmonicOptions::default()).unwrap();
    assert_eq!(result.boundary_vertices.len(), 4 * 6);
    assert!(result.non_manifold_vertices.is_empty());

    harmonic::io::save_weights(&result.weights, &weight_path).unwrap();
    let reread = harmonic::io::load_weights(&weight_path).unwrap();
    assert_eq!(reread.len(), result.weights.len());
    for (a, b) in reread.iter().zip(result.weights.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

// =============================================================================
// Random soups
// =============================================================================

/// Random positions with random, possibly degenerate, index triples.
fn arb_soup(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = TriMesh> {
    (3..=max_vertices).prop_flat_map(move |n| {
        let vertices = prop::collection::vec(prop::array::uniform3(-10.0..10.0f64), n);
        let faces = prop::collection::vec(prop::array::uniform3(0..n), 1..=max_faces);
        (vertices, faces).prop_map(|(vertices, faces)| {
            let vertices = vertices
                .into_iter()
                .map(|[x, y, z]| Point3::new(x, y, z))
                .collect();
            TriMesh::new(vertices, faces).unwrap()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_rings_stay_in_range(mesh in arb_soup(12, 24)) {
        let faces = VertexFaceMap::build(&mesh);
        let rings = RingSet::build(&mesh, &faces, &RingOptions::default().sequential());
        prop_assert_eq!(rings.len(), mesh.num_vertices());

        for (v, ring) in rings.iter().enumerate() {
            prop_assert!(ring.neighbors().iter().all(|&u| u < mesh.num_vertices()));
            if !faces.is_connected(v) {
                prop_assert!(ring.is_empty());
            }
        }
    }

    #[test]
    fn proptest_solve_terminates_deterministically(mesh in arb_soup(12, 24)) {
        let pins = [BoundaryCondition::new(0, 0.0), BoundaryCondition::new(1, 1.0)];

        for assembly in [AssemblyPreference::Rings, AssemblyPreference::Triangles] {
            let options = HarmonicOptions::default().with_assembly(assembly);
            let parallel = harmonic_map(&mesh, &pins, &options);
            let sequential = harmonic_map(&mesh, &pins, &options.clone().sequential());

            match (parallel, sequential) {
                (Ok(a), Ok(b)) => {
                    prop_assert_eq!(a.weights.as_slice(), b.weights.as_slice());
                    prop_assert!(a.weights.iter().all(f64::is_finite));
                    prop_assert_eq!(a.disconnected_vertices, b.disconnected_vertices);
                }
                (Err(a), Err(b)) => {
                    prop_assert!(a.is_solver_error(), "unexpected error {:?}", a);
                    prop_assert!(b.is_solver_error());
                }
                (a, b) => prop_assert!(false, "parallel {:?} vs sequential {:?}", a.is_ok(), b.is_ok()),
            }
        }
    }
}

//! Benchmarks for the harmonic pipeline stages.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use harmonic::algo::constraint::apply_constraints;
use harmonic::algo::solver::{Factorization, SparseSolver};
use harmonic::mesh::RingOptions;
use harmonic::prelude::*;
use nalgebra::Point3;

fn create_grid_mesh(n: usize) -> TriMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    // Grid over [-1, 1]^2 so the presets apply
    let step = 2.0 / n as f64;
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(-1.0 + i as f64 * step, -1.0 + j as f64 * step, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    TriMesh::new(vertices, faces).unwrap()
}

fn bench_rings(c: &mut Criterion) {
    let mesh = create_grid_mesh(100);
    let faces = VertexFaceMap::build(&mesh);

    c.bench_function("rings_grid_100_parallel", |b| {
        b.iter(|| RingSet::build(&mesh, &faces, &RingOptions::default()));
    });
    c.bench_function("rings_grid_100_sequential", |b| {
        b.iter(|| RingSet::build(&mesh, &faces, &RingOptions::default().sequential()));
    });
}

fn bench_assembly(c: &mut Criterion) {
    let mesh = create_grid_mesh(100);
    let rings = RingSet::from_mesh(&mesh).neighbor_lists();
    let options = LaplacianOptions::default();

    c.bench_function("assemble_rings_grid_100", |b| {
        let assembly = Assembly::RingBased(&rings);
        b.iter(|| assembly.assemble(mesh.vertices(), &options).unwrap());
    });
    c.bench_function("assemble_triangles_grid_100", |b| {
        let assembly = Assembly::TriangleBased(mesh.triangles());
        b.iter(|| assembly.assemble(mesh.vertices(), &options).unwrap());
    });
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_lu");
    for n in [20, 50, 100] {
        let mesh = create_grid_mesh(n);
        let pins = select_boundaries(&mesh, &BoundaryPreset::strip()).unwrap();
        let mut matrix = Assembly::TriangleBased(mesh.triangles())
            .assemble(mesh.vertices(), &LaplacianOptions::default())
            .unwrap();
        let rhs = apply_constraints(&mut matrix, &pins);
        let csc = matrix.to_csc();

        group.bench_with_input(BenchmarkId::new("factorize", n), &csc, |b, csc| {
            b.iter(|| SparseLu::default().factorize(csc).unwrap());
        });

        let factors = SparseLu::default().factorize(&csc).unwrap();
        group.bench_with_input(BenchmarkId::new("solve", n), &rhs, |b, rhs| {
            b.iter(|| factors.solve(rhs).unwrap());
        });
    }
    group.finish();
}

fn bench_harmonic_map(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);
    let pins = select_boundaries(&mesh, &BoundaryPreset::cone()).unwrap();

    c.bench_function("harmonic_map_grid_50", |b| {
        b.iter(|| harmonic_map(&mesh, &pins, &HarmonicOptions::default()).unwrap());
    });
    c.bench_function("harmonic_map_grid_50_triangles", |b| {
        let options = HarmonicOptions::default().with_assembly(AssemblyPreference::Triangles);
        b.iter(|| harmonic_map(&mesh, &pins, &options).unwrap());
    });
}

criterion_group!(benches, bench_rings, bench_assembly, bench_solve, bench_harmonic_map);
criterion_main!(benches);

//! Benchmarks for mesh construction and topology queries.

use criterion::{criterion_group, criterion_main, Criterion};

use cage::prelude::*;
use nalgebra::Point3;

fn grid_ids(mesh: &mut ControlMesh, n: usize) -> Vec<VertexId> {
    let mut ids = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            ids.push(mesh.add_vertex(Point3::new(i as f32, j as f32, 0.0)));
        }
    }
    ids
}

fn create_quad_grid(n: usize) -> ControlMesh {
    let mut mesh = ControlMesh::with_capacity((n + 1) * (n + 1), n * n);
    let ids = grid_ids(&mut mesh, n);

    for j in 0..n {
        for i in 0..n {
            let v00 = ids[j * (n + 1) + i];
            let v10 = ids[j * (n + 1) + i + 1];
            let v11 = ids[(j + 1) * (n + 1) + i + 1];
            let v01 = ids[(j + 1) * (n + 1) + i];
            mesh.add_face(&[v00, v10, v11, v01]).unwrap();
        }
    }
    mesh
}

fn bench_construction(c: &mut Criterion) {
    c.bench_function("add_face_grid_32x32", |b| {
        b.iter(|| create_quad_grid(32));
    });
}

fn bench_cache_build(c: &mut Criterion) {
    let mesh = create_quad_grid(64);

    c.bench_function("build_cache_grid_64x64", |b| {
        b.iter(|| {
            let mut fresh = mesh.clone();
            fresh.build_cache();
            fresh
        });
    });
}

fn bench_queries(c: &mut Criterion) {
    let mut mesh = create_quad_grid(64);
    mesh.build_cache();

    c.bench_function("one_ring_sweep_grid_64x64", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for v in 0..mesh.num_vertices() {
                count += mesh.cache().vertex_one_ring(VertexId::new(v)).len();
            }
            count
        });
    });

    c.bench_function("valence_sweep_grid_64x64", |b| {
        b.iter(|| {
            let mut total = 0u32;
            for v in 0..mesh.num_vertices() {
                total += mesh.cache().valence(VertexId::new(v)) as u32;
            }
            total
        });
    });
}

fn bench_render_indices(c: &mut Criterion) {
    let mesh = create_quad_grid(64);

    c.bench_function("render_indices_grid_64x64", |b| {
        b.iter(|| {
            let mut fresh = mesh.clone();
            RenderIndices::build(&mut fresh)
        });
    });
}

criterion_group!(
    benches,
    bench_construction,
    bench_cache_build,
    bench_queries,
    bench_render_indices
);
criterion_main!(benches);

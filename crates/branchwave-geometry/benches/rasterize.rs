/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Rasterization Benchmarks
//!
//! Measures rasterization and connectivity building as the geometry scale
//! grows, i.e. as the cell count grows quadratically.

use branchwave_geometry::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn double_angle(scale: usize) -> BranchGeometry {
    BranchGeometry::DoubleAngle(AngleBranchParams {
        l1: 60,
        w1: 5,
        h: 20,
        w2: 5,
        theta: 150.0,
        scale,
    })
}

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    for scale in [1usize, 2, 4, 8] {
        let geometry = double_angle(scale);
        let cells = geometry
            .rasterize()
            .map(|r| r.mesh.occupied_count())
            .unwrap_or(0);

        group.throughput(Throughput::Elements(cells as u64));
        group.bench_with_input(BenchmarkId::new("double_angle", scale), &geometry, |b, g| {
            b.iter(|| {
                let _ = black_box(g).rasterize();
            });
        });
    }

    group.finish();
}

fn bench_build_connectivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_connectivity");

    for scale in [1usize, 2, 4, 8] {
        let mesh = match double_angle(scale).rasterize() {
            Ok(raster) => raster.mesh,
            Err(_) => continue,
        };

        group.throughput(Throughput::Elements(mesh.occupied_count() as u64));
        group.bench_with_input(BenchmarkId::new("double_angle", scale), &mesh, |b, m| {
            b.iter(|| {
                let _ = build_connectivity(black_box(m), DEFAULT_CONDUCTANCE);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rasterize, bench_build_connectivity);
criterion_main!(benches);

//! Parser throughput benchmarks
//!
//! Measures how long it takes to turn one artifact file into a
//! `UnifiedSample`, for the three artifact kinds and growing file sizes.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # All parser benchmarks
//! cargo bench --bench parser_performance
//!
//! # Only tables
//! cargo bench --bench parser_performance table
//! ```
//!
//! # Expected Results
//!
//! Time should grow linearly with the number of records. A jump between two
//! sizes usually means reallocation in the value buffers.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ofpost_rs::context::RenderPolicy;
use ofpost_rs::parsers::parse_artifact;
use ofpost_rs::scan::{ArtifactKind, ArtifactRef};
use std::fmt::Write;
use std::fs;
use std::hint::black_box;
use tempfile::TempDir;

// =================================================================================================
// Fixtures
// =================================================================================================

/// Write `content` under a fresh temporary case and reference it
fn artifact(dir: &TempDir, relative: &str, kind: ArtifactKind, content: &str) -> ArtifactRef {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    ArtifactRef::from_path(dir.path(), &path, kind)
}

/// Residual table with `rows` iterations of five fields
fn residual_table(rows: usize) -> String {
    let mut content = String::from("# Solver information\n# Time p Ux Uy Uz k\n");
    for i in 1..=rows {
        let r = 1.0 / i as f64;
        writeln!(content, "{} {:e} {:e} {:e} {:e} {:e}", i, r, r * 0.1, r * 0.2, r * 0.3, r * 0.4).unwrap();
    }
    content
}

/// Strip of `n` quads (2n triangles) with one scalar and one vector cell array
fn legacy_strip(n: usize) -> String {
    let points = 2 * (n + 1);
    let cells = 2 * n;
    let mut content = format!(
        "# vtk DataFile Version 2.0\nstrip\nASCII\nDATASET POLYDATA\nPOINTS {} float\n",
        points
    );
    for i in 0..=n {
        writeln!(content, "{} 0 0 {} 1 0", i, i).unwrap();
    }
    writeln!(content, "POLYGONS {} {}", cells, 4 * cells).unwrap();
    for i in 0..n {
        let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
        writeln!(content, "3 {} {} {}\n3 {} {} {}", a, b, c, a, c, d).unwrap();
    }
    writeln!(content, "CELL_DATA {}\nSCALARS p float 1\nLOOKUP_TABLE default", cells).unwrap();
    for i in 0..cells {
        writeln!(content, "{}", i as f64 * 0.5).unwrap();
    }
    content.push_str("VECTORS U float\n");
    for i in 0..cells {
        writeln!(content, "{} 0 0", i as f64).unwrap();
    }
    content
}

/// Sampled line with distance, one scalar and one vector
fn sampled_line(rows: usize) -> String {
    let mut content = String::new();
    for i in 0..rows {
        let s = i as f64 / rows as f64;
        writeln!(content, "{} {} {} {} {}", s, 1.0 - s, s, 0.0, 0.0).unwrap();
    }
    content
}

// =================================================================================================
// Benchmark Functions
// =================================================================================================

fn benchmark_table_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");
    let policy = RenderPolicy::default();

    for rows in [100, 1_000, 10_000] {
        let dir = TempDir::new().unwrap();
        let table = artifact(
            &dir,
            "postProcessing/residuals/0/residuals.dat",
            ArtifactKind::Table,
            &residual_table(rows),
        );

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| parse_artifact(black_box(table), black_box(&policy)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_legacy_mesh_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("legacy_mesh");
    let policy = RenderPolicy::default();

    for quads in [100, 1_000, 10_000] {
        let dir = TempDir::new().unwrap();
        let mesh = artifact(
            &dir,
            "postProcessing/surfaces/1/strip.vtk",
            ArtifactKind::Mesh,
            &legacy_strip(quads),
        );

        group.throughput(Throughput::Elements(2 * quads as u64));
        group.bench_with_input(BenchmarkId::from_parameter(quads), &mesh, |b, mesh| {
            b.iter(|| parse_artifact(black_box(mesh), black_box(&policy)).unwrap())
        });
    }

    group.finish();
}

fn benchmark_sampled_line_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampled_line");
    let policy = RenderPolicy::default();

    for rows in [100, 1_000, 10_000] {
        let dir = TempDir::new().unwrap();
        let line = artifact(
            &dir,
            "postProcessing/sets/100/centreline_p_U.xy",
            ArtifactKind::SampledLine,
            &sampled_line(rows),
        );

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &line, |b, line| {
            b.iter(|| parse_artifact(black_box(line), black_box(&policy)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_table_parser,
    benchmark_legacy_mesh_parser,
    benchmark_sampled_line_parser
);
criterion_main!(benches);

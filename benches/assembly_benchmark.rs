//! Performance benchmarks for component assembly and rendering.
//!
//! Run with: cargo bench --bench assembly_benchmark
//!
//! Forests are synthetic npm trees in which every package depends on a few
//! packages drawn from a shared pool, so most encounters are duplicates.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use depbom::{
    Bom, BomOptions, ComponentAssembler, Ecosystem, PackageRecord, PackageSet, ParserKind,
    parse_content,
};
use std::fmt::Write;
use std::hint::black_box;

fn npm(i: usize) -> PackageRecord {
    PackageRecord::new(Ecosystem::Npm, format!("pkg-{i}"))
        .with_version(format!("1.{}.{}", i % 10, i % 100))
}

/// Build `roots` trees of the given depth and fan-out over a pool of
/// `pool` distinct packages.
fn generate_forest(roots: usize, depth: usize, fanout: usize, pool: usize) -> PackageSet {
    fn build(seed: usize, depth: usize, fanout: usize, pool: usize) -> PackageRecord {
        let mut record = npm(seed % pool);
        if depth > 0 {
            for k in 0..fanout {
                let child_seed = seed.wrapping_mul(31).wrapping_add(k * 7 + 1);
                record.add_dependency(build(child_seed, depth - 1, fanout, pool));
            }
        }
        record
    }

    PackageSet::from_packages((0..roots).map(|i| build(i, depth, fanout, pool)).collect())
}

fn generate_yarn_lock(count: usize) -> String {
    let mut out = String::from("# yarn lockfile v1\n\n");
    for i in 0..count {
        let _ = write!(
            out,
            "\"pkg-{i}@^1.0.0\":\n  version \"1.0.{i}\"\n  resolved \"https://registry.yarnpkg.com/pkg-{i}/-/pkg-{i}-1.0.{i}.tgz\"\n  dependencies:\n    pkg-{next} \"^1.0.0\"\n\n",
            next = (i + 1) % count
        );
    }
    out
}

fn bench_assembly_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly_scaling");

    for depth in [3, 4, 5] {
        let set = generate_forest(20, depth, 4, 500);
        group.bench_with_input(
            BenchmarkId::new("records", set.record_count()),
            &set,
            |b, set| {
                b.iter(|| {
                    let mut assembler = ComponentAssembler::new();
                    assembler.add_set(black_box(set));
                    black_box(assembler.finish())
                })
            },
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let mut assembler = ComponentAssembler::new();
    assembler.add_set(&generate_forest(50, 3, 4, 2000));
    let bom = Bom::new(
        assembler.finish(),
        None,
        &BomOptions::default().deterministic(true),
    );

    group.bench_function("json", |b| b.iter(|| black_box(bom.to_json())));
    group.bench_function("xml", |b| b.iter(|| black_box(bom.to_xml())));

    group.finish();
}

fn bench_parse_yarn(c: &mut Criterion) {
    let content = generate_yarn_lock(2000);

    c.bench_function("parse_yarn_lock_2000", |b| {
        b.iter(|| black_box(parse_content(ParserKind::YarnLock, black_box(&content), None)))
    });
}

criterion_group!(benches, bench_assembly_scaling, bench_render, bench_parse_yarn);
criterion_main!(benches);

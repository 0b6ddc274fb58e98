//! GPU Identification and Comparison Benchmarks
//!
//! Identification runs once per loaded table, so it only needs to stay cheap
//! relative to CSV parsing. These benchmarks guard against regressions when
//! the catalog grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use attn_compare::compare::{Alignment, Comparison};
use attn_compare::gpu::{GpuCatalog, GpuProfile};
use attn_compare::results::{BenchmarkRow, ResultTable};

const NAMES: &[&str] = &[
    "NVIDIA H100 80GB HBM3",
    "NVIDIA A100-SXM4-80GB",
    "NVIDIA GeForce RTX 2060",
    "UnknownGPU9000",
];

/// Catalog of `n` synthetic profiles followed by the built-in ones
fn large_catalog(n: usize) -> GpuCatalog {
    let mut profiles: Vec<GpuProfile> = (0..n)
        .map(|i| GpuProfile::new(&format!("synthetic-{i:05}x"), &format!("Synthetic {i}"), 100.0))
        .collect();
    profiles.extend(GpuCatalog::builtin().profiles().iter().cloned());
    GpuCatalog::new(profiles).expect("valid catalog")
}

// =============================================================================
// Benchmark: Identification
// =============================================================================

fn bench_identify(c: &mut Criterion) {
    let mut group = c.benchmark_group("identify");

    let builtin = GpuCatalog::builtin();
    for name in NAMES {
        group.bench_with_input(BenchmarkId::new("builtin", name), name, |b, name| {
            b.iter(|| black_box(builtin.identify(black_box(name))));
        });
    }

    for size in [16usize, 256] {
        let catalog = large_catalog(size);
        group.bench_with_input(BenchmarkId::new("unknown", size), &catalog, |b, catalog| {
            b.iter(|| black_box(catalog.identify(black_box("UnknownGPU9000"))));
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark: Comparison build
// =============================================================================

fn bench_build(c: &mut Criterion) {
    let catalog = GpuCatalog::builtin();
    let tables: Vec<ResultTable> = NAMES
        .iter()
        .map(|gpu| {
            let rows = (8..=16)
                .flat_map(|p| {
                    ["MHA", "MQA", "GQA"].into_iter().map(move |label| BenchmarkRow {
                        gpu: Some((*gpu).to_string()),
                        label: label.to_string(),
                        seq_len: 1u64 << p,
                        ms_tok: 0.01 * f64::from(p),
                        bw_gbs: 100.0 * f64::from(p),
                        kv_mb: None,
                        peak_mb: None,
                    })
                })
                .collect();
            ResultTable::from_rows(format!("{gpu}.csv"), rows).expect("rows")
        })
        .collect();

    let mut group = c.benchmark_group("comparison_build");
    for alignment in [Alignment::PerGpu, Alignment::Intersection] {
        group.bench_function(alignment.to_string(), |b| {
            b.iter(|| {
                black_box(Comparison::build(black_box(&tables), &catalog, "MHA", alignment))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_identify, bench_build);
criterion_main!(benches);

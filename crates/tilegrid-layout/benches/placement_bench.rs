//! Placement engine benchmarks.
//!
//! Run with: cargo bench -p tilegrid-layout --bench placement_bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tilegrid_layout::{Cell, GridConfig, GridItem, GridModel, PlacementEngine};

const COLUMNS: usize = 12;

fn config(sparse: bool) -> GridConfig {
    GridConfig::default()
        .with_columns(COLUMNS)
        .with_rows(1, 1000)
        .with_sparse(sparse)
}

/// A dashboard of `n` mixed-size tiles, auto-placed.
fn dashboard(n: usize, sparse: bool) -> PlacementEngine {
    let mut e = PlacementEngine::from_config(&config(sparse));
    for i in 0..n {
        let id = e.insert(GridItem::new(1 + i % 3, 1 + i % 2));
        let _ = e.auto_place(id);
    }
    e
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("tilegrid/items_in");
    for &n in &[16usize, 64, 256] {
        for sparse in [false, true] {
            let e = dashboard(n, sparse);
            let model: &GridModel = e.model();
            let label = if sparse { "sparse" } else { "dense" };
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| black_box(model.items_in(black_box(4), black_box(3), 4, 3, &[])))
            });
        }
    }
    group.finish();
}

fn bench_auto_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("tilegrid/auto_fill");
    for &n in &[16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(dashboard(n, false)))
        });
    }
    group.finish();
}

fn bench_drop_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("tilegrid/drop_cascade");
    for &n in &[16usize, 64] {
        let base = dashboard(n, false);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut e = base.clone();
                let id = e.insert(GridItem::new(COLUMNS, 2));
                let _ = e.place_with(id, Some(Cell::new(0, 0)), &[], true);
                black_box(e.height())
            })
        });
    }
    group.finish();
}

fn bench_float(c: &mut Criterion) {
    let mut group = c.benchmark_group("tilegrid/float_all_up");
    for &n in &[16usize, 64] {
        // Spread tiles far apart so every one of them floats.
        let mut base = PlacementEngine::from_config(&config(false));
        for i in 0..n {
            let id = base.insert(GridItem::new(2, 1));
            let _ = base.place(id, Some(Cell::new(i * 4 + 3, (i * 2) % COLUMNS)));
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut e = base.clone();
                let _ = e.float_all_up();
                black_box(e.model().len())
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_queries, bench_auto_fill, bench_drop_cascade, bench_float
}
criterion_main!(benches);

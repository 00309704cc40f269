//! Benchmark suite for the ledger.
//!
//! Covers the per-invocation work on realistic catalog sizes:
//! - Statistics over a catalog
//! - Next-task selection
//! - Report rendering
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- --save-baseline main
//! cargo bench -- --baseline main
//! ```

use chrono::{Local, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ralph_ledger::report::{render_markdown, ReportData};
use ralph_ledger::selector::next_task;
use ralph_ledger::{HistoryEntry, LedgerConfig, RunState, TaskCatalog, TaskRecord, TaskStats};

/// Catalog where the first ~80% of tasks are passed and every 7th is deferred.
fn catalog_of(size: usize) -> TaskCatalog {
    let tasks = (0..size)
        .map(|i| {
            let action = if i % 7 == 0 {
                format!("Deferred: item {i}")
            } else {
                format!("Implement item {i}")
            };
            let mut task = TaskRecord::new(
                format!("{}.{}", i / 10, i % 10),
                format!("Phase {}", i / 10),
                format!("Task {i}"),
                action,
            );
            task.passes = i < size * 4 / 5;
            task
        })
        .collect();
    TaskCatalog::new(tasks)
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [50, 200, 1000] {
        let catalog = catalog_of(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &catalog, |b, catalog| {
            b.iter(|| black_box(TaskStats::compute(black_box(&catalog.tasks), "Deferred")));
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for size in [50, 200, 1000] {
        let catalog = catalog_of(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("next_task", size), &catalog, |b, catalog| {
            b.iter(|| black_box(next_task(black_box(&catalog.tasks), "Deferred")));
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    let config = LedgerConfig::default();

    let mut state = RunState::default();
    for i in 0..500 {
        state.record(HistoryEntry::new(
            Utc::now(),
            Some(format!("{}.{}", i / 10, i % 10)),
            "completed",
            "PASS",
        ));
    }

    for size in [50, 200, 1000] {
        let catalog = catalog_of(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("render", size), &catalog, |b, catalog| {
            b.iter(|| {
                let data = ReportData::collect(&config, &state, catalog, Local::now());
                black_box(render_markdown(&data))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_statistics, bench_selection, bench_report);
criterion_main!(benches);

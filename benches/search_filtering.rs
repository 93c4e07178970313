//! Benchmarks for window filtering
//!
//! Measures uncached matching across desktop sizes and the memoized path, which the
//! interactive search relies on to stay under its one-second target.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deskscout::{MatchMode, SearchField, SearchQuery, Window, WindowFilter};
use tokio::runtime::Runtime;

fn create_runtime() -> Runtime {
    Runtime::new().expect("Failed to create Tokio runtime")
}

fn create_windows(count: usize) -> Vec<Window> {
    (0..count)
        .map(|i| {
            Window::new(
                format!("0x{:x}", i + 1),
                format!("Document {} - {}", i, ["Editor", "Browser", "Terminal"][i % 3]),
                0,
                0,
                800,
                600,
                i % 4 != 0,
                (i + 1) as u32,
                ["code", "firefox", "bash"][i % 3],
            )
            .on_workspace(format!("ws{}", i % 4), "", i % 4 == 0)
        })
        .collect()
}

fn benchmark_uncached_filter(c: &mut Criterion) {
    let rt = create_runtime();
    let mut group = c.benchmark_group("uncached_filter");

    for count in [100usize, 1_000, 10_000] {
        let windows = create_windows(count);
        let filter = WindowFilter::new(0).with_caching(false);
        let query = SearchQuery::new("terminal");

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| rt.block_on(filter.filter(black_box(&windows), black_box(&query))))
        });
    }
    group.finish();
}

fn benchmark_match_modes(c: &mut Criterion) {
    let rt = create_runtime();
    let windows = create_windows(5_000);
    let filter = WindowFilter::new(0).with_caching(false);
    let mut group = c.benchmark_group("match_modes");

    let queries = [
        ("contains", SearchQuery::new("browser")),
        ("owner_field", SearchQuery::new("bash").with_field(SearchField::Owner)),
        ("starts_with", SearchQuery::new("document 4").with_match_mode(MatchMode::StartsWith)),
        ("regex", SearchQuery::new(r"Document \d+5 - ").regex(true)),
        ("workspace", SearchQuery::new("editor").in_workspace("ws2")),
    ];

    for (name, query) in queries {
        group.bench_function(name, |b| {
            b.iter(|| rt.block_on(filter.filter(black_box(&windows), black_box(&query))))
        });
    }
    group.finish();
}

fn benchmark_cached_filter(c: &mut Criterion) {
    let rt = create_runtime();
    let windows = create_windows(5_000);
    let filter = WindowFilter::default();
    let query = SearchQuery::new("editor");
    rt.block_on(filter.filter(&windows, &query));

    c.bench_function("cached_filter_5000", |b| {
        b.iter(|| rt.block_on(filter.filter(black_box(&windows), black_box(&query))))
    });
}

criterion_group!(
    benches,
    benchmark_uncached_filter,
    benchmark_match_modes,
    benchmark_cached_filter
);
criterion_main!(benches);

//! Benchmarks for bundle lookup, listing, and read operations.
//!
//! Measures the hot paths a serving layer hits on every request: resolving
//! a path to a handle, enumerating a directory, and streaming file content.
//!
//! # Run Benchmarks
//!
//! ```bash
//! cargo bench --bench bundle_ops
//! ```
//!
//! # View Results
//!
//! ```bash
//! open target/criterion/report/index.html
//! ```

use std::hint::black_box;

use bundle_manifest::AssetSpec;
use bundle_vfs::Bundle;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// Builds a table with `file_count` files spread under one directory.
fn asset_bundle(file_count: usize) -> Bundle {
    let mut builder = Bundle::builder();
    for i in 0..file_count {
        builder = builder.add_asset(AssetSpec::file(
            format!("assets/file{i}.css"),
            format!(".rule{i} {{ color: #{i:06x}; }}").into_bytes(),
        ));
    }
    builder.build().unwrap()
}

/// Open-and-stat cost across table sizes.
fn bench_open_stat(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_stat");

    for file_count in [10usize, 100, 1000] {
        let bundle = asset_bundle(file_count);
        let key = format!("assets/file{}.css", file_count / 2);

        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &file_count,
            |b, _| {
                b.iter(|| {
                    let handle = bundle.open(black_box(&key)).unwrap();
                    black_box(handle.stat().unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Unbounded directory listing across child counts.
///
/// Child synthesis scans the whole table per open, so this is the
/// operation most sensitive to table size.
fn bench_list_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_directory");

    for file_count in [10usize, 100, 1000] {
        let bundle = asset_bundle(file_count);

        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &file_count,
            |b, &count| {
                b.iter(|| {
                    let mut dir = bundle.open("assets").unwrap();
                    let listing = dir.list(0).unwrap();
                    assert_eq!(listing.len(), count);
                    black_box(listing);
                });
            },
        );
    }

    group.finish();
}

/// Paginated listing, eight entries per page.
fn bench_paginated_listing(c: &mut Criterion) {
    let bundle = asset_bundle(100);

    c.bench_function("list_paginated_by_8", |b| {
        b.iter(|| {
            let mut dir = bundle.open("assets").unwrap();
            loop {
                let page = dir.list(8).unwrap();
                let exhausted = page.is_exhausted();
                black_box(page);
                if exhausted {
                    break;
                }
            }
        });
    });
}

/// Chunked read of a 64 KiB asset.
fn bench_read_throughput(c: &mut Criterion) {
    let content = vec![0xA5u8; 64 * 1024];
    let bundle = Bundle::builder()
        .add_asset(AssetSpec::file("blob.bin", content))
        .build()
        .unwrap();

    c.bench_function("read_64k_in_4k_chunks", |b| {
        let mut buf = [0u8; 4096];
        b.iter(|| {
            let mut handle = bundle.open("blob.bin").unwrap();
            let mut total = 0usize;
            loop {
                let n = handle.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                total += n;
            }
            assert_eq!(total, 64 * 1024);
        });
    });
}

criterion_group!(
    benches,
    bench_open_stat,
    bench_list_directory,
    bench_paginated_listing,
    bench_read_throughput
);
criterion_main!(benches);

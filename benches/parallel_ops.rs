//! Parallel vs sequential reduction benchmarks.
//!
//! Compares `parallel_reduce` on the global arena against a plain
//! sequential fold for varying range lengths and grain sizes.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rangefork::{parallel_for, parallel_reduce};

fn bench_sum_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_reduction");

    for &len in &[10_000i64, 100_000, 1_000_000] {
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("sequential", len), &len, |b, &len| {
            b.iter(|| black_box((0..len).fold(0i64, |acc, i| acc + i)));
        });

        group.bench_with_input(BenchmarkId::new("parallel", len), &len, |b, &len| {
            b.iter(|| {
                parallel_reduce(
                    0,
                    len,
                    2_048,
                    0i64,
                    |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i),
                    |a, b| a + b,
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_grain_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("grain_size");
    let len = 1_000_000i64;
    group.throughput(Throughput::Elements(len as u64));

    for &grain in &[256i64, 2_048, 16_384, 131_072] {
        group.bench_with_input(BenchmarkId::from_parameter(grain), &grain, |b, &grain| {
            b.iter(|| {
                parallel_reduce(
                    0,
                    len,
                    grain,
                    0i64,
                    |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i),
                    |a, b| a + b,
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_parallel_for_touch(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_for_touch");
    let len = 1_000_000i64;
    group.throughput(Throughput::Elements(len as u64));

    group.bench_function("black_box_indices", |b| {
        b.iter(|| {
            parallel_for(0, len, 8_192, |lo, hi| {
                for i in lo..hi {
                    black_box(i);
                }
            })
            .unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sum_reduction,
    bench_grain_sizes,
    bench_parallel_for_touch
);
criterion_main!(benches);

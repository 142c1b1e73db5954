//! Identifier array conversion benchmarks
//!
//! Measures copying native id sequences into int64 arrays under both
//! narrowing policies, and adapting array lists into callables.
//!
//! Run with: cargo bench -p graphbridge_core --bench id_array_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graphbridge_core::{copy_to_id_array, to_callable, try_copy_to_id_array, NDArray};
use std::time::Duration;

fn bench_copy_to_id_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_to_id_array");
    group.measurement_time(Duration::from_secs(3));

    for len in [16usize, 1_024, 65_536, 1 << 20] {
        let ids: Vec<u32> = (0..len as u32).collect();
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("unchecked", len), &ids, |b, ids| {
            b.iter(|| {
                let array = copy_to_id_array(black_box(ids)).expect("copy failed");
                black_box(array);
            });
        });

        let wide: Vec<u64> = ids.iter().map(|&v| v as u64).collect();
        group.bench_with_input(BenchmarkId::new("checked_u64", len), &wide, |b, ids| {
            b.iter(|| {
                let array = try_copy_to_id_array(black_box(ids)).expect("copy failed");
                black_box(array);
            });
        });
    }

    group.finish();
}

fn bench_to_callable(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_callable");

    for count in [1usize, 8, 64] {
        let arrays: Vec<NDArray> = (0..count)
            .map(|i| copy_to_id_array(&[i as i64; 32]).expect("copy failed"))
            .collect();

        group.bench_with_input(BenchmarkId::new("adapt_unpack", count), &arrays, |b, arrays| {
            b.iter(|| {
                let value = to_callable(arrays.clone());
                black_box(value.into_arrays().expect("unpack failed"));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_copy_to_id_array, bench_to_callable);
criterion_main!(benches);

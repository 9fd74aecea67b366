//! Benchmarks for eventcar-math operations.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use eventcar_math::{PERCENT, compound_index, ordinary_least_squares};
use ndarray::{Array1, Array2};
use rand::Rng;

fn random_array(n: usize) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    Array1::from_iter((0..n).map(|_| rng.r#gen::<f64>() * 4.0 - 2.0))
}

fn random_matrix(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>() * 2.0 - 1.0)
}

fn bench_ols(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordinary_least_squares");

    for window in [63, 126, 252, 504] {
        group.throughput(Throughput::Elements(window as u64));
        group.bench_with_input(BenchmarkId::new("window", window), &window, |b, &window| {
            let y = random_array(window);
            let x = random_matrix(window, 6);
            b.iter(|| ordinary_least_squares(black_box(&y), black_box(&x)).unwrap());
        });
    }

    group.finish();
}

fn bench_compound_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("compound_index");

    for size in [66, 252, 5000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let path: Vec<Option<f64>> = random_array(size).into_iter().map(Some).collect();
            b.iter(|| compound_index(black_box(&path), PERCENT));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ols, bench_compound_index);
criterion_main!(benches);

//! Reduction benchmarks using Criterion.
//!
//! Benchmarks cover:
//! - Scalability across the three strategy tiers (16 to 10M elements)
//! - Built-in operators and transforms
//! - Multi-range transform-reduce (dot products)
//! - Tree tile shapes
//!
//! For CPU backend and serial execution, use `FASTHETREDUCE_BACKEND=serial cargo bench`.
//! For CPU backend and parallel execution, use `FASTHETREDUCE_BACKEND=parallel cargo bench`.
//! For GPU backend, use `FASTHETREDUCE_BACKEND=gpu cargo bench --features gpu`.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fastHetreduce::prelude::*;
use hetreduce::internals::primitives::backend::Backend;
use rand::prelude::*;
use rand_distr::{Normal, Uniform};
use std::env;
use std::hint::black_box;

// ============================================================================
// Helper Functions
// ============================================================================

fn get_config() -> (bool, Backend, &'static str) {
    match env::var("FASTHETREDUCE_BACKEND").ok().as_deref() {
        Some("cpu_serial") | Some("serial") => (false, Backend::CPU, "serial"),
        Some("gpu") => (true, Backend::GPU, "gpu"),
        Some("cpu") | Some("parallel") | _ => (true, Backend::CPU, "parallel"),
    }
}

fn reducer() -> ParallelReducer {
    let (use_parallel, backend, _) = get_config();
    FastReducer::new()
        .parallel(use_parallel)
        .backend(backend)
        .build()
        .unwrap()
}

// ============================================================================
// Data Generation with Reproducible RNG
// ============================================================================

/// Generate Gaussian samples.
fn generate_normal_data(size: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(0.0, 1.0).unwrap();
    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

/// Generate uniformly distributed signed integers.
fn generate_int_data(size: usize, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1_000_000, 1_000_000).unwrap();
    (0..size).map(|_| dist.sample(&mut rng)).collect()
}

// ============================================================================
// Benchmark Functions
// ============================================================================

fn bench_scalability(c: &mut Criterion) {
    let (_, _, mode_name) = get_config();
    let mut group = c.benchmark_group(format!("scalability_{}", mode_name));
    group.sample_size(50);

    let reducer = reducer();

    // Sequential, single-group brackets, tree
    for size in [16, 1_000, 8_192, 65_536, 1_000_000, 10_000_000] {
        group.throughput(Throughput::Elements(size as u64));

        let data = DeviceBuffer::from(generate_normal_data(size, 42));

        group.bench_with_input(
            BenchmarkId::new(reducer.strategy_for::<f32>(size).name(), size),
            &size,
            |b, _| b.iter(|| reducer.sum(black_box(&data), Init::None).unwrap().wait().unwrap()),
        );
    }
    group.finish();
}

fn bench_builtins(c: &mut Criterion) {
    let (_, _, mode_name) = get_config();
    let mut group = c.benchmark_group(format!("builtins_{}", mode_name));
    group.sample_size(100);

    let reducer = reducer();
    let size = 1_000_000;
    let data = DeviceBuffer::from(generate_int_data(size, 42));
    group.throughput(Throughput::Elements(size as u64));

    for (op, transform) in [(Sum, BuiltinTransform::Identity), (Min, BuiltinTransform::Identity), (Max, Abs), (Sum, Square)] {
        let id = format!("{}_{}", op.name(), transform.name());
        group.bench_function(id, |b| {
            b.iter(|| {
                reducer
                    .reduce_builtin(black_box(&data), Init::None, op, transform)
                    .unwrap()
                    .wait()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_dot_product(c: &mut Criterion) {
    let (use_parallel, _, mode_name) = get_config();
    let mut group = c.benchmark_group(format!("dot_product_{}", mode_name));
    group.sample_size(50);

    // Closures run on CPU devices only.
    let reducer = FastReducer::new().parallel(use_parallel).build().unwrap();

    for size in [10_000, 1_000_000] {
        group.throughput(Throughput::Elements(size as u64));

        let x: DeviceBuffer<f64> = generate_normal_data(size, 1).into_iter().map(f64::from).collect();
        let y: DeviceBuffer<f64> = generate_normal_data(size, 2).into_iter().map(f64::from).collect();

        group.bench_with_input(BenchmarkId::new("f64", size), &size, |b, _| {
            b.iter(|| {
                reducer
                    .transform_reduce(
                        (black_box(x.clone()), black_box(y.clone())),
                        Init::Value(0.0),
                        Plus,
                        |(a, b): (f64, f64)| a * b,
                    )
                    .unwrap()
                    .wait()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_tree_tiles(c: &mut Criterion) {
    let (use_parallel, _, mode_name) = get_config();
    let mut group = c.benchmark_group(format!("tree_tiles_{}", mode_name));
    group.sample_size(50);

    let size = 4_000_000;
    let data: DeviceBuffer<u64> = (0..size as u64).collect();
    group.throughput(Throughput::Elements(size as u64));

    for (wg, iters) in [(64, 8), (256, 4), (256, 32), (1024, 16)] {
        let reducer = FastReducer::new()
            .parallel(use_parallel)
            .tree_tile(Tile::new(wg, iters))
            .build()
            .unwrap();

        group.bench_function(format!("{wg}x{iters}"), |b| {
            b.iter(|| {
                reducer
                    .transform_reduce(black_box(data.clone()), Init::None, Plus, |v: u64| v)
                    .unwrap()
                    .wait()
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_scalability,
    bench_builtins,
    bench_dot_product,
    bench_tree_tiles,
);

criterion_main!(benches);

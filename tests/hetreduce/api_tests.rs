#![cfg(feature = "dev")]
//! Tests for the high-level reduction API.
//!
//! These tests exercise the `Reducer` builder and the `transform_reduce` /
//! `reduce` entry points as a user would call them.
//!
//! ## Test Organization
//!
//! 1. **Builder** - Defaults, overrides, duplicate and invalid parameters
//! 2. **Entry Points** - Validation, operators, tuple ranges, init values
//! 3. **Asynchronous Handle** - Waiting, awaiting, fault delivery

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hetreduce::internals::api::*;
use hetreduce::internals::engine::policy::{ReduceConfig, Strategy, Tile, TileBracket};
use hetreduce::internals::ops::transform::Identity;
use std::future::IntoFuture;

// ============================================================================
// Builder Tests
// ============================================================================

/// Test that an empty builder yields the default configuration.
#[test]
fn test_builder_defaults() {
    let reducer = Reducer::builder().build().unwrap();

    assert_eq!(reducer.config(), &ReduceConfig::default());
    assert_eq!(reducer, Reducer::new());
}

/// Test that builder overrides reach the configuration.
#[test]
fn test_builder_overrides() {
    let reducer = Reducer::builder()
        .sequential_threshold(32)
        .single_group_limit(10_000)
        .min_single_group_size(256)
        .local_memory_factor(4)
        .tile_table(vec![TileBracket::new(512, 128, 4)])
        .fallback_tile(Tile::new(128, 64))
        .tree_tile(Tile::new(128, 16))
        .kernel_name("api_sum")
        .build()
        .unwrap();

    let config = reducer.config();
    assert_eq!(config.sequential_threshold, 32);
    assert_eq!(config.single_group_limit, 10_000);
    assert_eq!(config.min_single_group_size, 256);
    assert_eq!(config.local_memory_factor, 4);
    assert_eq!(config.tile_table, vec![TileBracket::new(512, 128, 4)]);
    assert_eq!(config.fallback_tile, Tile::new(128, 64));
    assert_eq!(config.tree_tile, Tile::new(128, 16));
    assert_eq!(config.kernel_name, Some("api_sum"));

    let device = HostDevice::new();
    assert_eq!(reducer.strategy_for::<f32, _>(&device, 32), Strategy::Sequential);
    assert_eq!(
        reducer.strategy_for::<f32, _>(&device, 500),
        Strategy::SingleGroup(Tile::new(128, 4))
    );
    assert_eq!(
        reducer.strategy_for::<f32, _>(&device, 10_001),
        Strategy::Tree(Tile::new(128, 16))
    );
}

/// Test that setting a parameter twice is rejected.
#[test]
fn test_builder_duplicate_parameter() {
    let res = Reducer::builder()
        .tree_tile(Tile::new(256, 32))
        .tree_tile(Tile::new(128, 32))
        .build();

    assert_eq!(
        res,
        Err(ReduceError::DuplicateParameter {
            parameter: "tree_tile"
        })
    );

    let res = Reducer::builder().kernel_name("a").kernel_name("b").build();
    assert!(matches!(
        res,
        Err(ReduceError::DuplicateParameter {
            parameter: "kernel_name"
        })
    ));
}

/// Test that invalid tiles are rejected at build time.
#[test]
fn test_builder_invalid_tile() {
    let res = Reducer::builder().fallback_tile(Tile::new(200, 4)).build();

    assert_eq!(
        res,
        Err(ReduceError::InvalidTile {
            work_group_size: 200,
            iters_per_work_item: 4
        })
    );
}

// ============================================================================
// Entry Point Tests
// ============================================================================

/// Test the free functions across the strategy tiers.
#[test]
fn test_reduce_tiers() {
    let device = HostDevice::new();

    for n in [1usize, 64, 65, 4097, 65537] {
        let data: DeviceBuffer<i64> = (1..=n as i64).collect();
        let expected = (n as i64) * (n as i64 + 1) / 2;

        let sum = reduce(&device, data, Init::None, Plus).unwrap().wait().unwrap();
        assert_eq!(sum, expected, "n = {n}");
    }
}

/// Test that empty and mismatched input fail before dispatch.
#[test]
fn test_transform_reduce_validation() {
    let device = HostDevice::new();

    let empty: DeviceBuffer<u32> = Vec::new().into();
    let res = reduce(&device, empty, Init::Value(1), Plus);
    assert_eq!(res.unwrap_err(), ReduceError::EmptyInput);

    let a: DeviceBuffer<u32> = (0..100).collect();
    let b: DeviceBuffer<u32> = (0..99).collect();
    let res = transform_reduce(&device, (a, b), Init::None, Plus, |(x, y): (u32, u32)| x + y);
    assert_eq!(
        res.unwrap_err(),
        ReduceError::MismatchedInputs {
            expected: 100,
            got: 99
        }
    );
}

/// Test a dot product over two ranges.
#[test]
fn test_transform_reduce_dot() {
    let device = HostDevice::new();
    let n = 20_000;
    let x: DeviceBuffer<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
    let y: DeviceBuffer<f64> = (0..n).map(|i| 1.0 / (1.0 + i as f64)).collect();

    let expected: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let dot = transform_reduce(&device, (x, y), Init::None, Plus, |(a, b): (f64, f64)| a * b)
        .unwrap()
        .wait()
        .unwrap();

    assert_abs_diff_eq!(dot, expected, epsilon = 1e-6);
}

/// Test a three-range transform that changes the accumulator type.
#[test]
fn test_transform_reduce_three_ranges() {
    let device = HostDevice::new();
    let a: DeviceBuffer<u8> = (0..300).map(|i| (i % 256) as u8).collect();
    let b: DeviceBuffer<u16> = (0..300).map(|i| i as u16).collect();
    let c: DeviceBuffer<bool> = (0..300).map(|i| i % 3 == 0).collect();

    let count = transform_reduce(
        &device,
        (a, b, c),
        Init::None,
        Plus,
        |(x, y, keep): (u8, u16, bool)| u64::from(keep && u16::from(x) == y),
    )
    .unwrap()
    .wait()
    .unwrap();

    // Elements 0, 3, ..., 255 have x == y and keep set.
    assert_eq!(count, 86);
}

/// Test min and max with init values on every tier.
#[test]
fn test_min_max_with_init() {
    let device = HostDevice::new();
    let mut rng = StdRng::seed_from_u64(7);

    for n in [50, 3000, 80_000] {
        let values: Vec<i32> = (0..n).map(|_| rng.random_range(-1000..1000)).collect();
        let lo = *values.iter().min().unwrap();
        let hi = *values.iter().max().unwrap();
        let data = DeviceBuffer::from(values);

        let min = reduce(&device, data.clone(), Init::Value(-5000), Minimum)
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(min, -5000, "n = {n}");

        let min = reduce(&device, data.clone(), Init::Value(5000), Minimum)
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(min, lo, "n = {n}");

        let max = reduce(&device, data, Init::None, Maximum).unwrap().wait().unwrap();
        assert_eq!(max, hi, "n = {n}");
    }
}

/// Test a user closure as the reduce operator.
#[test]
fn test_closure_operator() {
    let device = HostDevice::new();
    let data: DeviceBuffer<u32> = (0..10_000).map(|i| i % 64).collect();

    let bits = reduce(&device, data, Init::Value(1 << 20), |a: u32, b: u32| a | b)
        .unwrap()
        .wait()
        .unwrap();
    assert_eq!(bits, (1 << 20) | 63);
}

/// Test that a reducer gives the same result on repeated calls.
#[test]
fn test_repeated_calls() {
    let device = HostDevice::new();
    let reducer = Reducer::builder().kernel_name("repeat").build().unwrap();
    let data: DeviceBuffer<u64> = (0..100_000).collect();

    let first = reducer
        .transform_reduce(&device, data.clone(), Init::None, Plus, Identity)
        .unwrap()
        .wait();
    let second = reducer
        .transform_reduce(&device, data, Init::None, Plus, Identity)
        .unwrap()
        .wait();
    assert_eq!(first, second);
}

// ============================================================================
// Asynchronous Handle Tests
// ============================================================================

/// Test awaiting a handle.
#[test]
fn test_handle_await() {
    let device = HostDevice::new();
    let data: DeviceBuffer<u16> = (0..1000).map(|i| (i % 7) as u16).collect();

    let handle = reduce(&device, data, Init::None, Maximum).unwrap();
    let max = pollster::block_on(async { handle.await });
    assert_eq!(max, Ok(6));
}

/// Test a pre-resolved handle.
#[test]
fn test_handle_ready() {
    assert_eq!(ReduceFuture::ready(Ok(3)).wait(), Ok(3));
    assert_eq!(
        ReduceFuture::<i32>::ready(Err(ReduceError::Disconnected)).wait(),
        Err(ReduceError::Disconnected)
    );
}

/// Test that a fault inside the kernel reaches the handle, not the call.
#[test]
fn test_fault_through_handle() {
    let reducer = Reducer::builder()
        .tile_table(vec![TileBracket::new(4096, 2048, 1)])
        .build()
        .unwrap();
    let device = HostDevice::new();
    let data: DeviceBuffer<f32> = vec![1.0; 1000].into();

    let handle = reducer.reduce(&device, data, Init::None, Plus).unwrap();
    assert!(matches!(
        handle.wait(),
        Err(ReduceError::Unsupported { device: "host", .. })
    ));
}

/// Test that the awaitable handle can move to another thread.
#[test]
fn test_handle_future_is_send() {
    let device = HostDevice::new();
    let data: DeviceBuffer<u64> = (1..=1000).collect();
    let handle = reduce(&device, data, Init::None, Plus).unwrap();

    let fut = handle.into_future();
    let sum = std::thread::spawn(move || pollster::block_on(fut)).join().unwrap();
    assert_eq!(sum, Ok(500_500));
}

/// Test that a one-item device with a one-element tree tile still converges.
#[test]
fn test_tree_converges_on_single_item_device() {
    let reducer = Reducer::builder().tree_tile(Tile::new(2, 1)).build().unwrap();
    let device = HostDevice::new().with_max_work_group_size(1);
    assert_eq!(
        reducer.strategy_for::<u64, _>(&device, 100),
        Strategy::Tree(Tile::new(1, 2))
    );

    for n in [65, 100, 1000] {
        let data: DeviceBuffer<u64> = (1..=n as u64).collect();
        let sum = reducer.reduce(&device, data, Init::Value(7), Plus).unwrap().wait();
        assert_eq!(sum, Ok(7 + (n as u64) * (n as u64 + 1) / 2), "n = {n}");
    }
}

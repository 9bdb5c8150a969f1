#![cfg(feature = "dev")]
//! Tests for the three reduction strategies and the executor.
//!
//! These tests run every strategy directly on the host device and check
//! results, result-cell writes and tree pass counts, then run the executor
//! across the size tiers.
//!
//! ## Test Organization
//!
//! 1. **Sequential** - Left-to-right fold
//! 2. **Single Group** - One group, widened tiles
//! 3. **Tree** - Pass counts, convergence, single write
//! 4. **Executor** - Size sweep, init handling, fault capture

use approx::assert_relative_eq;

use hetreduce::internals::device::host::HostDevice;
use hetreduce::internals::engine::executor::{execute, parallel_transform_reduce};
use hetreduce::internals::engine::policy::{ReduceConfig, Strategy, Tile};
use hetreduce::internals::engine::task::ReduceTask;
use hetreduce::internals::engine::{sequential, single_group, tree};
use hetreduce::internals::ops::init::Init;
use hetreduce::internals::ops::reduce::{Minimum, Plus};
use hetreduce::internals::ops::transform::Identity;
use hetreduce::internals::primitives::buffer::ResultCell;
use hetreduce::internals::primitives::errors::ReduceError;
use hetreduce::internals::primitives::range::DeviceBuffer;

// ============================================================================
// Helper Functions
// ============================================================================

fn iota(n: usize) -> DeviceBuffer<u64> {
    (0..n as u64).collect()
}

fn triangular(n: usize) -> u64 {
    let n = n as u64;
    n * (n.saturating_sub(1)) / 2
}

fn sum_task(n: usize, init: Init<u64>) -> ReduceTask<DeviceBuffer<u64>, u64, Plus, Identity> {
    ReduceTask::new(iota(n), init, Plus, Identity)
}

/// Smallest pass count bound: ceil(log_base(n)) + 1.
fn pass_bound(n: usize, tile: Tile) -> usize {
    let base = tile.size_per_group();
    let mut passes = 1;
    let mut reach = base;
    while reach < n {
        reach = reach.saturating_mul(base);
        passes += 1;
    }
    passes + 1
}

// ============================================================================
// Sequential Tests
// ============================================================================

/// Test a sequential sum with and without init.
#[test]
fn test_sequential_sum() {
    let device = HostDevice::new();

    for n in [1, 2, 63, 64] {
        let cell = ResultCell::new();
        sequential::reduce(&device, n, &sum_task(n, Init::None), &cell).unwrap();
        assert_eq!(cell.into_inner(), Some(triangular(n)), "n = {n}");
    }

    let cell = ResultCell::new();
    sequential::reduce(&device, 10, &sum_task(10, Init::Value(5)), &cell).unwrap();
    assert_eq!(cell.writes(), 1);
    assert_eq!(cell.into_inner(), Some(50));
}

/// Test that the sequential fold is left to right.
#[test]
fn test_sequential_order() {
    let data: DeviceBuffer<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let concat = |a: String, b: String| a + &b;
    let task = ReduceTask::new(data, Init::Value(">".to_string()), concat, Identity);

    assert_eq!(sequential::fold(4, &task), Some("abcd".to_string()));

    let cell = ResultCell::new();
    sequential::reduce(&HostDevice::new(), 4, &task, &cell).unwrap();
    assert_eq!(cell.into_inner(), Some(">abcd".to_string()));
}

// ============================================================================
// Single Group Tests
// ============================================================================

/// Test single-group sums across the table brackets.
#[test]
fn test_single_group_sum() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();

    for n in [65, 128, 129, 512, 1000, 1024, 4096, 4097, 65536] {
        let cell = ResultCell::new();
        let tile = config.small_tile(n);
        single_group::reduce(&device, n, tile, &sum_task(n, Init::None), &cell).unwrap();
        assert_eq!(cell.writes(), 1, "n = {n}");
        assert_eq!(cell.into_inner(), Some(triangular(n)), "n = {n}");
    }
}

/// Test the partially filled group of 250 items over 1000 elements.
#[test]
fn test_single_group_tail() {
    let cell = ResultCell::new();
    let task = ReduceTask::new(iota(1000), Init::Value(1), Plus, |v: u64| v * 2);

    single_group::reduce(&HostDevice::new(), 1000, Tile::new(256, 4), &task, &cell).unwrap();
    assert_eq!(cell.into_inner(), Some(1 + 2 * triangular(1000)));
}

/// Test that a group wider than the device is rejected.
#[test]
fn test_single_group_unsupported_width() {
    let device = HostDevice::new().with_max_work_group_size(128);
    let cell = ResultCell::new();

    let res = single_group::reduce(&device, 100, Tile::new(256, 1), &sum_task(100, Init::None), &cell);
    assert!(matches!(res, Err(ReduceError::Unsupported { device: "host", .. })));
    assert!(!cell.is_written());
}

// ============================================================================
// Tree Tests
// ============================================================================

/// Test tree pass counts and the single result write.
#[test]
fn test_tree_passes() {
    let device = HostDevice::new();
    let cases = [
        (1000, Tile::new(256, 4), 1, 1),
        (65537, Tile::new(256, 32), 2, 9),
        (10_000, Tile::new(16, 4), 3, 157),
        (100_000, Tile::new(4, 2), 6, 12_500),
    ];

    for (n, tile, passes, first_groups) in cases {
        let cell = ResultCell::new();
        let report = tree::reduce(&device, n, tile, &sum_task(n, Init::Value(3)), &cell).unwrap();

        assert_eq!(report.passes, passes, "n = {n}");
        assert_eq!(report.first_pass_groups, first_groups, "n = {n}");
        assert!(report.passes <= pass_bound(n, tile), "n = {n}");
        assert_eq!(cell.writes(), 1, "n = {n}");
        assert_eq!(cell.into_inner(), Some(3 + triangular(n)), "n = {n}");
    }
}

/// Test that later passes do not re-apply the transform.
#[test]
fn test_tree_transform_first_pass_only() {
    let n = 50_000;
    let cell = ResultCell::new();
    let task = ReduceTask::new(iota(n), Init::None, Plus, |v: u64| v + 1);

    let report = tree::reduce(&HostDevice::new(), n, Tile::new(32, 8), &task, &cell).unwrap();
    assert_eq!(report.passes, 2);
    assert_eq!(cell.into_inner(), Some(triangular(n) + n as u64));
}

/// Test a tree minimum over a shuffled input.
#[test]
fn test_tree_minimum() {
    let n = 70_000u64;
    let data: DeviceBuffer<u64> = (0..n).map(|i| (i * 7919) % n + 10).collect();
    let task = ReduceTask::new(data, Init::None, Minimum, Identity);
    let cell = ResultCell::new();

    tree::reduce(&HostDevice::new(), n as usize, Tile::new(64, 4), &task, &cell).unwrap();
    assert_eq!(cell.into_inner(), Some(10));
}

// ============================================================================
// Executor Tests
// ============================================================================

/// Test the executor across every size tier boundary.
#[test]
fn test_executor_size_sweep() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();

    for n in [1, 64, 65, 128, 129, 512, 1024, 4096, 4097, 65536, 65537, 10_000_000] {
        let handle = parallel_transform_reduce(&device, &config, sum_task(n, Init::None));
        assert_eq!(handle.wait(), Ok(triangular(n)), "n = {n}");
    }
}

/// Test that init is folded in exactly once on every strategy.
#[test]
fn test_executor_init_once() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();

    for n in [10, 1000, 100_000] {
        let without = parallel_transform_reduce(&device, &config, sum_task(n, Init::None))
            .wait()
            .unwrap();
        let with = parallel_transform_reduce(&device, &config, sum_task(n, Init::Value(1000)))
            .wait()
            .unwrap();
        assert_eq!(with, without + 1000, "n = {n}");
    }
}

/// Test that results agree on both sides of each tier boundary.
#[test]
fn test_executor_boundary_equivalence() {
    let device = HostDevice::new();
    let task = ReduceTask::new(iota(70_000), Init::None, Plus, |v: u64| v % 97);

    for n in [64, 65, 4096, 4097, 65536, 65537] {
        let strategy = ReduceConfig::default().select_strategy::<u64, _>(n, &device);
        let expected = sequential::fold(n, &task);
        assert_eq!(execute(&device, strategy, n, &task).ok(), expected, "n = {n}");
        assert_eq!(execute(&device, Strategy::Sequential, n, &task).ok(), expected, "n = {n}");
    }
}

/// Test floating-point sums against a reference within rounding tolerance.
#[test]
fn test_executor_float_sum() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();
    let n = 200_000;
    let data: DeviceBuffer<f64> = (0..n).map(|i| (i as f64) * 0.001).collect();
    let expected: f64 = data.iter().sum();

    let task = ReduceTask::new(data, Init::Value(0.5), Plus, Identity);
    let got = parallel_transform_reduce(&device, &config, task).wait().unwrap();
    assert_relative_eq!(got, expected + 0.5, max_relative = 1e-9);
}

/// Test that a panicking transform surfaces as a device fault.
#[test]
fn test_executor_panic_is_fault() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();
    let task = ReduceTask::new(iota(5000), Init::None, Plus, |v: u64| {
        if v == 4321 {
            panic!("poisoned element");
        }
        v
    });

    let res = parallel_transform_reduce(&device, &config, task).wait();
    assert!(
        matches!(&res, Err(ReduceError::DeviceFault(msg)) if msg.contains("poisoned element")),
        "got {res:?}"
    );
}

/// Test that the same task reduces to the same value twice.
#[test]
fn test_executor_idempotent() {
    let device = HostDevice::new();
    let config = ReduceConfig::default();
    let task = sum_task(100_000, Init::Value(9));

    let first = parallel_transform_reduce(&device, &config, task.clone()).wait();
    let second = parallel_transform_reduce(&device, &config, task).wait();
    assert_eq!(first, second);
    assert_eq!(first, Ok(9 + triangular(100_000)));
}

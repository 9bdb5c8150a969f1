#![cfg(feature = "dev")]
//! Tests for the group-local reduction primitives.
//!
//! ## Test Organization
//!
//! 1. **Transform Step** - Strided element assignment and tail handling
//! 2. **Group Fold** - Pairwise folding of the staging area
//! 3. **Whole Group** - Transform plus fold for one group

use hetreduce::internals::engine::group::{reduce_over_group, run_group, transform_item};
use hetreduce::internals::engine::policy::Tile;
use hetreduce::internals::ops::reduce::{Maximum, Plus};

// ============================================================================
// Helper Functions
// ============================================================================

fn index(idx: usize) -> Option<usize> {
    Some(idx)
}

// ============================================================================
// Transform Step Tests
// ============================================================================

/// Test that an item reads indices strided by the group size.
#[test]
fn test_transform_item_strided() {
    let tile = Tile::new(4, 3);

    // Item 1 reads 1, 5, 9.
    assert_eq!(transform_item(1, 12, 0, tile, &Plus, &index), Some(15));

    // Group 1 starts at 12; item 0 reads 12, 16, 20.
    assert_eq!(transform_item(0, 24, 12, tile, &Plus, &index), Some(48));
}

/// Test that indices past `n` are skipped.
#[test]
fn test_transform_item_tail() {
    let tile = Tile::new(4, 3);

    // Item 2 reads 2 and 6; 10 is past n.
    assert_eq!(transform_item(2, 10, 0, tile, &Plus, &index), Some(8));

    // Item 3 of a group starting past n holds nothing.
    assert_eq!(transform_item(3, 10, 12, tile, &Plus, &index), None);
}

/// Test that the loader is never called at or past `n`.
#[test]
fn test_transform_item_bounds() {
    let n = 7;
    let guarded = |idx: usize| {
        assert!(idx < n, "loaded index {idx} past n = {n}");
        Some(1usize)
    };

    let tile = Tile::new(4, 2);
    let total: usize = (0..4)
        .filter_map(|l| transform_item(l, n, 0, tile, &Plus, &guarded))
        .sum();
    assert_eq!(total, n);
}

/// Test that missing values are skipped.
#[test]
fn test_transform_item_missing_values() {
    let odd_only = |idx: usize| (idx % 2 == 1).then_some(idx);
    let tile = Tile::new(2, 4);

    // Item 0 reads 0, 2, 4, 6: all even.
    assert_eq!(transform_item(0, 8, 0, tile, &Plus, &odd_only), None);

    // Item 1 reads 1, 3, 5, 7.
    assert_eq!(transform_item(1, 8, 0, tile, &Plus, &odd_only), Some(16));
}

// ============================================================================
// Group Fold Tests
// ============================================================================

/// Test a pairwise fold over a full staging area.
#[test]
fn test_reduce_over_group_full() {
    let mut local: Vec<Option<i32>> = (1..=8).map(Some).collect();

    assert_eq!(reduce_over_group(&Plus, &mut local), Some(36));
}

/// Test a fold over a partially filled, non power-of-two staging area.
#[test]
fn test_reduce_over_group_partial() {
    let mut local = vec![Some(3), Some(9), None, Some(4), Some(1)];

    assert_eq!(reduce_over_group(&Maximum, &mut local), Some(9));

    let mut local = vec![Some(1), Some(2), None, Some(4), Some(5)];
    assert_eq!(reduce_over_group(&Plus, &mut local), Some(12));
}

/// Test folding empty and single-slot areas.
#[test]
fn test_reduce_over_group_degenerate() {
    let mut empty: Vec<Option<i32>> = Vec::new();
    assert_eq!(reduce_over_group(&Plus, &mut empty), None);

    let mut single = vec![Some(5)];
    assert_eq!(reduce_over_group(&Plus, &mut single), Some(5));

    let mut unused: Vec<Option<i32>> = vec![None; 4];
    assert_eq!(reduce_over_group(&Plus, &mut unused), None);
}

// ============================================================================
// Whole Group Tests
// ============================================================================

/// Test one full group in the middle of the input.
#[test]
fn test_run_group_full() {
    let tile = Tile::new(4, 2);

    // Group 1 covers 8..16.
    assert_eq!(run_group(1, 20, tile, &Plus, &index), Some((8..16).sum::<usize>()));
}

/// Test the partially filled last group.
#[test]
fn test_run_group_tail() {
    let tile = Tile::new(256, 4);
    let n = 1000;

    assert_eq!(tile.groups_for(n), 1);
    assert_eq!(tile.items_for(n), 250);
    assert_eq!(run_group(0, n, tile, &Plus, &index), Some((0..n).sum::<usize>()));

    // Last of three groups only sees 2048..2500.
    let n = 2500;
    assert_eq!(run_group(2, n, tile, &Plus, &index), Some((2048..2500).sum::<usize>()));
}

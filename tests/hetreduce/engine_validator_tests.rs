#![cfg(feature = "dev")]
//! Tests for input and configuration validation.
//!
//! ## Test Organization
//!
//! 1. **Input Validation** - Empty and mismatched ranges
//! 2. **Configuration Validation** - Tiles, thresholds, tile table order
//! 3. **Error Messages** - Display output

use hetreduce::internals::engine::policy::{ReduceConfig, Tile, TileBracket};
use hetreduce::internals::engine::validator::Validator;
use hetreduce::internals::primitives::errors::ReduceError;
use hetreduce::internals::primitives::range::DeviceBuffer;

// ============================================================================
// Input Validation Tests
// ============================================================================

/// Test validation rejects empty input.
#[test]
fn test_validate_empty_input() {
    let empty: DeviceBuffer<f32> = Vec::new().into();

    assert_eq!(Validator::validate_ranges(&empty), Err(ReduceError::EmptyInput));
}

/// Test validation accepts a single element.
#[test]
fn test_validate_single_element() {
    let one: DeviceBuffer<f32> = vec![1.0].into();

    assert_eq!(Validator::validate_ranges(&one), Ok(1));
}

/// Test validation rejects tuple ranges of unequal lengths.
#[test]
fn test_validate_mismatched_ranges() {
    let a: DeviceBuffer<i32> = (0..10).collect();
    let b: DeviceBuffer<i32> = (0..9).collect();
    let c: DeviceBuffer<i32> = (0..10).collect();

    assert_eq!(
        Validator::validate_ranges(&(a.clone(), b.clone())),
        Err(ReduceError::MismatchedInputs {
            expected: 10,
            got: 9
        })
    );
    assert_eq!(
        Validator::validate_ranges(&(a.clone(), c.clone(), b)),
        Err(ReduceError::MismatchedInputs {
            expected: 10,
            got: 9
        })
    );
    assert_eq!(Validator::validate_ranges(&(a, c)), Ok(10));
}

/// Test that an empty first range wins over a mismatch.
#[test]
fn test_validate_empty_first_range() {
    let a: DeviceBuffer<i32> = Vec::new().into();
    let b: DeviceBuffer<i32> = (0..3).collect();

    assert_eq!(Validator::validate_ranges(&(a, b)), Err(ReduceError::EmptyInput));
}

// ============================================================================
// Configuration Validation Tests
// ============================================================================

/// Test the default configuration is valid.
#[test]
fn test_validate_default_config() {
    assert_eq!(Validator::validate_config(&ReduceConfig::default()), Ok(()));
}

/// Test tile validation.
#[test]
fn test_validate_tile() {
    assert!(Validator::validate_tile(&Tile::new(64, 1)).is_ok());
    assert_eq!(
        Validator::validate_tile(&Tile::new(48, 2)),
        Err(ReduceError::InvalidTile {
            work_group_size: 48,
            iters_per_work_item: 2
        })
    );
    assert!(Validator::validate_tile(&Tile::new(64, 0)).is_err());
}

/// Test rejection of a non-increasing tile table.
#[test]
fn test_validate_table_order() {
    let config = ReduceConfig {
        tile_table: vec![TileBracket::new(256, 64, 1), TileBracket::new(256, 64, 2)],
        ..ReduceConfig::default()
    };

    assert_eq!(
        Validator::validate_config(&config),
        Err(ReduceError::InvalidThreshold {
            name: "tile_table",
            value: 256
        })
    );
}

/// Test rejection of an invalid tile inside the table.
#[test]
fn test_validate_table_tile() {
    let config = ReduceConfig {
        tile_table: vec![TileBracket::new(100, 100, 1)],
        ..ReduceConfig::default()
    };

    assert!(matches!(
        Validator::validate_config(&config),
        Err(ReduceError::InvalidTile {
            work_group_size: 100,
            ..
        })
    ));
}

/// Test rejection of zero thresholds.
#[test]
fn test_validate_zero_thresholds() {
    let config = ReduceConfig {
        local_memory_factor: 0,
        ..ReduceConfig::default()
    };
    assert_eq!(
        Validator::validate_config(&config),
        Err(ReduceError::InvalidThreshold {
            name: "local_memory_factor",
            value: 0
        })
    );

    let config = ReduceConfig {
        min_single_group_size: 0,
        ..ReduceConfig::default()
    };
    assert!(Validator::validate_config(&config).is_err());
}

/// Test that a tree tile must shrink the problem.
#[test]
fn test_validate_tree_tile_progress() {
    let config = ReduceConfig {
        tree_tile: Tile::new(1, 1),
        ..ReduceConfig::default()
    };

    assert_eq!(
        Validator::validate_config(&config),
        Err(ReduceError::InvalidTile {
            work_group_size: 1,
            iters_per_work_item: 1
        })
    );

    let config = ReduceConfig {
        tree_tile: Tile::new(1, 2),
        ..ReduceConfig::default()
    };
    assert_eq!(Validator::validate_config(&config), Ok(()));
}

// ============================================================================
// Error Message Tests
// ============================================================================

/// Test that errors render their context.
#[test]
fn test_error_display() {
    let err = ReduceError::MismatchedInputs {
        expected: 10,
        got: 9,
    };
    let msg = err.to_string();
    assert!(msg.contains("10") && msg.contains("9"));

    let err = ReduceError::DuplicateParameter {
        parameter: "tree_tile",
    };
    assert!(err.to_string().contains("tree_tile"));

    let err = ReduceError::Unsupported {
        device: "host",
        feature: "work group of 2048 items".to_string(),
    };
    assert!(err.to_string().contains("host"));
    assert!(err.to_string().contains("2048"));

    let err: Box<dyn std::error::Error> = Box::new(ReduceError::EmptyInput);
    assert_eq!(err.to_string(), "Input ranges are empty");
}

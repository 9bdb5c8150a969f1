//! Input and configuration validation.
//!
//! ## Purpose
//!
//! This module checks what the engine assumes before a reduction is
//! dispatched: non-empty ranges of equal length and a well-formed dispatch
//! configuration.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Entry-point only**: The engine itself only debug-asserts `n > 0`;
//!   empty input is rejected here, before dispatch.
//!
//! ## Non-goals
//!
//! * This module does not inspect element values.

// Internal dependencies
use crate::engine::policy::{ReduceConfig, Tile};
use crate::primitives::errors::ReduceError;
use crate::primitives::range::InputRanges;

/// Validation utility for reduction inputs and configuration.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Input Validation
    // ========================================================================

    /// Validate input ranges: non-empty and all of one length.
    pub fn validate_ranges<R: InputRanges>(ranges: &R) -> Result<usize, ReduceError> {
        let lengths = ranges.lengths();
        let n = lengths.first().copied().unwrap_or(0);

        if n == 0 {
            return Err(ReduceError::EmptyInput);
        }

        if let Some(&got) = lengths.iter().find(|&&len| len != n) {
            return Err(ReduceError::MismatchedInputs { expected: n, got });
        }

        Ok(n)
    }

    // ========================================================================
    // Configuration Validation
    // ========================================================================

    /// Validate a tile.
    pub fn validate_tile(tile: &Tile) -> Result<(), ReduceError> {
        if !tile.is_valid() {
            return Err(ReduceError::InvalidTile {
                work_group_size: tile.work_group_size,
                iters_per_work_item: tile.iters_per_work_item,
            });
        }
        Ok(())
    }

    /// Validate a dispatch configuration.
    pub fn validate_config(config: &ReduceConfig) -> Result<(), ReduceError> {
        if config.local_memory_factor == 0 {
            return Err(ReduceError::InvalidThreshold {
                name: "local_memory_factor",
                value: 0,
            });
        }

        if config.min_single_group_size == 0 {
            return Err(ReduceError::InvalidThreshold {
                name: "min_single_group_size",
                value: 0,
            });
        }

        let mut previous = 0;
        for bracket in &config.tile_table {
            if bracket.max_n <= previous {
                return Err(ReduceError::InvalidThreshold {
                    name: "tile_table",
                    value: bracket.max_n,
                });
            }
            previous = bracket.max_n;
            Self::validate_tile(&bracket.tile)?;
        }

        Self::validate_tile(&config.fallback_tile)?;
        Self::validate_tile(&config.tree_tile)?;

        // A tree pass must shrink the problem.
        if config.tree_tile.size_per_group() < 2 {
            return Err(ReduceError::InvalidTile {
                work_group_size: config.tree_tile.work_group_size,
                iters_per_work_item: config.tree_tile.iters_per_work_item,
            });
        }

        Ok(())
    }
}

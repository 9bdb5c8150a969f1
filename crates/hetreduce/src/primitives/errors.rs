//! Error types for reduction operations.
//!
//! ## Purpose
//!
//! This module defines the error conditions that can occur while configuring,
//! validating, or executing a device reduction.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors include relevant values (e.g., actual vs. expected lengths).
//! * **Deferred**: Builder errors are stored during configuration and reported by `build()`.
//! * **Asynchronous**: Execution faults travel through the reduction handle and are
//!   only observed when the caller synchronizes on it.
//!
//! ## Key concepts
//!
//! 1. **Input validation**: Empty ranges, ranges of unequal length, non-contiguous data.
//! 2. **Configuration**: Invalid tiles, thresholds, duplicated builder parameters.
//! 3. **Resources**: Intermediate buffer or result cell allocation failure.
//! 4. **Execution**: Device faults, a second write to the result cell, a dropped handle.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.
//! * This module does not provide error recovery or retries.

// External dependencies
use std::error::Error;
use std::fmt::{Display, Formatter, Result};

// ============================================================================
// Error Type
// ============================================================================

/// Error type for reduction operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ReduceError {
    /// Input ranges are empty; a reduction requires at least 1 element.
    EmptyInput,

    /// Input data cannot be read as a contiguous range.
    InvalidInput(String),

    /// All input ranges must have the same number of elements.
    MismatchedInputs {
        /// Length of the first range.
        expected: usize,
        /// Length of the first range that differs.
        got: usize,
    },

    /// Tile must have a power-of-two group size and a non-zero item count.
    InvalidTile {
        /// Items per cooperative group.
        work_group_size: usize,
        /// Input elements handled by each item.
        iters_per_work_item: usize,
    },

    /// A dispatch threshold is out of range.
    InvalidThreshold {
        /// Name of the threshold.
        name: &'static str,
        /// Value provided.
        value: usize,
    },

    /// Parameter was set multiple times in the builder.
    DuplicateParameter {
        /// Name of the parameter that was set multiple times.
        parameter: &'static str,
    },

    /// Device memory for a scratch area could not be allocated.
    AllocationFailed {
        /// What was being allocated.
        what: &'static str,
        /// Number of elements requested.
        len: usize,
    },

    /// Kernel launch or execution failed on the device.
    DeviceFault(String),

    /// The result cell was written more than once.
    ResultAlreadyWritten,

    /// The reduction finished without delivering a value to its handle.
    Disconnected,

    /// The device cannot execute the requested operation.
    Unsupported {
        /// Name of the device.
        device: &'static str,
        /// What was requested.
        feature: String,
    },
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for ReduceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::EmptyInput => write!(f, "Input ranges are empty"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::MismatchedInputs { expected, got } => {
                write!(f, "Length mismatch: first range has {expected} elements, another has {got}")
            }
            Self::InvalidTile {
                work_group_size,
                iters_per_work_item,
            } => {
                write!(
                    f,
                    "Invalid tile: ({work_group_size}, {iters_per_work_item}) (group size must be a power of two, items per work item > 0)"
                )
            }
            Self::InvalidThreshold { name, value } => {
                write!(f, "Invalid threshold: {name} = {value}")
            }
            Self::DuplicateParameter { parameter } => {
                write!(
                    f,
                    "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
                )
            }
            Self::AllocationFailed { what, len } => {
                write!(f, "Failed to allocate {what} ({len} elements)")
            }
            Self::DeviceFault(msg) => write!(f, "Device fault: {msg}"),
            Self::ResultAlreadyWritten => write!(f, "Result cell was written more than once"),
            Self::Disconnected => write!(f, "Reduction finished without producing a result"),
            Self::Unsupported { device, feature } => {
                write!(f, "Device '{device}' does not support: {feature}")
            }
        }
    }
}

// ============================================================================
// Standard Error Trait
// ============================================================================

impl Error for ReduceError {}

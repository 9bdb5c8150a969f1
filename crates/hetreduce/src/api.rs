//! High-level API for device reductions.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry points: a fluent builder for
//! tuning the dispatch policy, the resulting [`Reducer`], and free functions
//! that reduce with the default policy.
//!
//! ## Design notes
//!
//! * **Validated**: Builder errors are collected and reported by `build()`;
//!   inputs are validated before dispatch.
//! * **Asynchronous**: Every reduction returns a [`ReduceFuture`].
//!
//! ### Configuration Flow
//!
//! 1. Create a [`ReducerBuilder`] via `Reducer::builder()`.
//! 2. Chain configuration methods (`.sequential_threshold()`, `.tree_tile()`, etc.).
//! 3. Call `.build()` and run `.transform_reduce(...)` or `.reduce(...)` on a device.

// Internal dependencies
use crate::device::Device;
use crate::engine::executor::parallel_transform_reduce;
use crate::engine::policy::{ReduceConfig, Strategy, Tile, TileBracket};
use crate::engine::task::ReduceTask;
use crate::engine::validator::Validator;
use crate::ops::transform::Identity;

// Publicly re-exported types
pub use crate::device::Capabilities;
pub use crate::device::host::HostDevice;
pub use crate::engine::future::ReduceFuture;
pub use crate::ops::init::Init;
pub use crate::ops::reduce::{Maximum, Minimum, Multiplies, Plus, ReduceOp};
pub use crate::ops::transform::TransformOp;
pub use crate::primitives::backend::Backend;
pub use crate::primitives::errors::ReduceError;
pub use crate::primitives::range::{DeviceBuffer, InputRanges};

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for a [`Reducer`].
#[derive(Debug, Clone, Default)]
pub struct ReducerBuilder {
    /// Inputs up to this size run sequentially.
    pub sequential_threshold: Option<usize>,

    /// Inputs up to this size may run within one group.
    pub single_group_limit: Option<usize>,

    /// Resolved group size required for the single-group strategy.
    pub min_single_group_size: Option<usize>,

    /// Local-memory bytes per item, in units of the accumulator size.
    pub local_memory_factor: Option<usize>,

    /// Single-group tile table.
    pub tile_table: Option<Vec<TileBracket>>,

    /// Single-group tile above the last bracket.
    pub fallback_tile: Option<Tile>,

    /// Tree tile.
    pub tree_tile: Option<Tile>,

    /// Kernel label.
    pub kernel_name: Option<&'static str>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl ReducerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest input run as a single sequential task.
    pub fn sequential_threshold(mut self, n: usize) -> Self {
        if self.sequential_threshold.is_some() {
            self.duplicate_param = Some("sequential_threshold");
        }
        self.sequential_threshold = Some(n);
        self
    }

    /// Set the largest input that may run within one group.
    pub fn single_group_limit(mut self, n: usize) -> Self {
        if self.single_group_limit.is_some() {
            self.duplicate_param = Some("single_group_limit");
        }
        self.single_group_limit = Some(n);
        self
    }

    /// Set the group size a device must reach for the single-group strategy.
    pub fn min_single_group_size(mut self, size: usize) -> Self {
        if self.min_single_group_size.is_some() {
            self.duplicate_param = Some("min_single_group_size");
        }
        self.min_single_group_size = Some(size);
        self
    }

    /// Set the local-memory reservation per item, as a multiple of the accumulator size.
    pub fn local_memory_factor(mut self, factor: usize) -> Self {
        if self.local_memory_factor.is_some() {
            self.duplicate_param = Some("local_memory_factor");
        }
        self.local_memory_factor = Some(factor);
        self
    }

    /// Replace the single-group tile table.
    pub fn tile_table(mut self, table: Vec<TileBracket>) -> Self {
        if self.tile_table.is_some() {
            self.duplicate_param = Some("tile_table");
        }
        self.tile_table = Some(table);
        self
    }

    /// Set the single-group tile used above the last bracket.
    pub fn fallback_tile(mut self, tile: Tile) -> Self {
        if self.fallback_tile.is_some() {
            self.duplicate_param = Some("fallback_tile");
        }
        self.fallback_tile = Some(tile);
        self
    }

    /// Set the tile of every tree pass.
    pub fn tree_tile(mut self, tile: Tile) -> Self {
        if self.tree_tile.is_some() {
            self.duplicate_param = Some("tree_tile");
        }
        self.tree_tile = Some(tile);
        self
    }

    /// Name the compiled unit (used by devices that cache kernels, and in logs).
    pub fn kernel_name(mut self, name: &'static str) -> Self {
        if self.kernel_name.is_some() {
            self.duplicate_param = Some("kernel_name");
        }
        self.kernel_name = Some(name);
        self
    }

    /// Assemble the configuration without validating it.
    #[doc(hidden)]
    pub fn to_config(&self) -> ReduceConfig {
        let defaults = ReduceConfig::default();
        ReduceConfig {
            sequential_threshold: self
                .sequential_threshold
                .unwrap_or(defaults.sequential_threshold),
            single_group_limit: self
                .single_group_limit
                .unwrap_or(defaults.single_group_limit),
            min_single_group_size: self
                .min_single_group_size
                .unwrap_or(defaults.min_single_group_size),
            local_memory_factor: self
                .local_memory_factor
                .unwrap_or(defaults.local_memory_factor),
            tile_table: self.tile_table.clone().unwrap_or(defaults.tile_table),
            fallback_tile: self.fallback_tile.unwrap_or(defaults.fallback_tile),
            tree_tile: self.tree_tile.unwrap_or(defaults.tree_tile),
            kernel_name: self.kernel_name.or(defaults.kernel_name),
        }
    }

    /// Validate the configuration and build the reducer.
    pub fn build(self) -> Result<Reducer, ReduceError> {
        if let Some(parameter) = self.duplicate_param {
            return Err(ReduceError::DuplicateParameter { parameter });
        }

        let config = self.to_config();
        Validator::validate_config(&config)?;
        Ok(Reducer { config })
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Configured reduction backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reducer {
    config: ReduceConfig,
}

impl Reducer {
    /// Start configuring a reducer.
    pub fn builder() -> ReducerBuilder {
        ReducerBuilder::new()
    }

    /// Reducer with the default dispatch policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch configuration in use.
    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    /// Strategy this reducer would pick for `n` elements of `T` on `device`.
    pub fn strategy_for<T, C: Capabilities + ?Sized>(&self, device: &C, n: usize) -> Strategy {
        self.config.select_strategy::<T, C>(n, device)
    }

    /// Transform every element of `ranges`, combine with `reduce_op`, fold in `init`.
    pub fn transform_reduce<D, R, T, O, F>(
        &self,
        device: &D,
        ranges: R,
        init: Init<T>,
        reduce_op: O,
        transform_op: F,
    ) -> Result<ReduceFuture<T>, ReduceError>
    where
        D: Device,
        R: InputRanges,
        T: Clone + Send + Sync + 'static,
        O: ReduceOp<T> + 'static,
        F: TransformOp<R::Item, T> + 'static,
    {
        Validator::validate_ranges(&ranges)?;
        let task = ReduceTask::new(ranges, init, reduce_op, transform_op)
            .with_kernel_name(self.config.kernel_name);
        Ok(parallel_transform_reduce(device, &self.config, task))
    }

    /// Combine every element of `range` with `reduce_op`, fold in `init`.
    pub fn reduce<D, E, O>(
        &self,
        device: &D,
        range: DeviceBuffer<E>,
        init: Init<E>,
        reduce_op: O,
    ) -> Result<ReduceFuture<E>, ReduceError>
    where
        D: Device,
        E: Clone + Send + Sync + 'static,
        O: ReduceOp<E> + 'static,
    {
        self.transform_reduce(device, range, init, reduce_op, Identity)
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Transform-reduce with the default dispatch policy.
pub fn transform_reduce<D, R, T, O, F>(
    device: &D,
    ranges: R,
    init: Init<T>,
    reduce_op: O,
    transform_op: F,
) -> Result<ReduceFuture<T>, ReduceError>
where
    D: Device,
    R: InputRanges,
    T: Clone + Send + Sync + 'static,
    O: ReduceOp<T> + 'static,
    F: TransformOp<R::Item, T> + 'static,
{
    Reducer::new().transform_reduce(device, ranges, init, reduce_op, transform_op)
}

/// Reduce with the default dispatch policy.
pub fn reduce<D, E, O>(
    device: &D,
    range: DeviceBuffer<E>,
    init: Init<E>,
    reduce_op: O,
) -> Result<ReduceFuture<E>, ReduceError>
where
    D: Device,
    E: Clone + Send + Sync + 'static,
    O: ReduceOp<E> + 'static,
{
    Reducer::new().reduce(device, range, init, reduce_op)
}

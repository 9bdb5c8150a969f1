//! High-level API for device reductions with backend selection.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry point of the acceleration
//! crate. It extends the `hetreduce` builder with a backend choice (CPU or
//! GPU) and a parallel switch, and runs reductions on the matching device.
//!
//! ## Design notes
//!
//! * **Fluent Integration**: Re-uses the base `hetreduce` builder for every
//!   dispatch-policy setting.
//! * **Parallel-First**: CPU reductions run on a rayon pool unless
//!   `.parallel(false)` selects the inline host device.
//! * **Graceful GPU fallback**: When no GPU adapter can be opened, the
//!   reducer logs a warning and falls back to the CPU backend.
//!
//! ## Key concepts
//!
//! * **Built-in reductions** (`reduce_builtin`, `sum`, `min`, `max`) run on
//!   every backend.
//! * **Closure reductions** (`transform_reduce`) run on the CPU backends only.
//!
//! ### Configuration Flow
//!
//! 1. Create a [`FastReducerBuilder`] via `FastReducer::new()` (prelude alias).
//! 2. Chain configuration methods (`.backend()`, `.parallel()`, `.tree_tile()`, etc.).
//! 3. Call `.build()` and run reductions on the returned [`ParallelReducer`].

// Feature-gated imports
#[cfg(feature = "gpu")]
use crate::engine::gpu::GpuDevice;
#[cfg(feature = "gpu")]
use log::warn;

// External dependencies
use log::debug;

// Internal dependencies
use crate::input::ReduceInput;

// Publicly re-exported types
#[cfg(feature = "cpu")]
pub use crate::engine::executor::RayonDevice;
pub use crate::engine::builtin::{BuiltinOp, BuiltinTransform, Scalar};
pub use hetreduce::internals::api::{
    Backend, DeviceBuffer, HostDevice, Init, InputRanges, Maximum, Minimum, Multiplies, Plus,
    ReduceError, ReduceFuture, ReduceOp, Reducer, ReducerBuilder, TransformOp,
};
pub use hetreduce::internals::engine::policy::{ReduceConfig, Strategy, Tile, TileBracket};

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for a [`ParallelReducer`].
#[derive(Debug, Clone, Default)]
pub struct FastReducerBuilder {
    /// Dispatch-policy settings shared with `hetreduce`.
    pub base: ReducerBuilder,

    /// Execution backend.
    pub backend: Option<Backend>,

    /// Whether CPU reductions use the rayon pool.
    pub parallel: Option<bool>,

    /// Dedicated rayon pool size (global pool when unset).
    pub threads: Option<usize>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl FastReducerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        if self.backend.is_some() {
            self.duplicate_param = Some("backend");
        }
        self.backend = Some(backend);
        self
    }

    /// Enable or disable the rayon pool for CPU reductions.
    pub fn parallel(mut self, parallel: bool) -> Self {
        if self.parallel.is_some() {
            self.duplicate_param = Some("parallel");
        }
        self.parallel = Some(parallel);
        self
    }

    /// Run CPU reductions on a dedicated pool of `threads` workers.
    pub fn threads(mut self, threads: usize) -> Self {
        if self.threads.is_some() {
            self.duplicate_param = Some("threads");
        }
        self.threads = Some(threads);
        self
    }

    /// Set the largest input run as a single sequential task.
    pub fn sequential_threshold(mut self, n: usize) -> Self {
        self.base = self.base.sequential_threshold(n);
        self
    }

    /// Set the largest input that may run within one group.
    pub fn single_group_limit(mut self, n: usize) -> Self {
        self.base = self.base.single_group_limit(n);
        self
    }

    /// Set the group size a device must reach for the single-group strategy.
    pub fn min_single_group_size(mut self, size: usize) -> Self {
        self.base = self.base.min_single_group_size(size);
        self
    }

    /// Set the local-memory reservation per item, as a multiple of the accumulator size.
    pub fn local_memory_factor(mut self, factor: usize) -> Self {
        self.base = self.base.local_memory_factor(factor);
        self
    }

    /// Replace the single-group tile table.
    pub fn tile_table(mut self, table: Vec<TileBracket>) -> Self {
        self.base = self.base.tile_table(table);
        self
    }

    /// Set the single-group tile used above the last bracket.
    pub fn fallback_tile(mut self, tile: Tile) -> Self {
        self.base = self.base.fallback_tile(tile);
        self
    }

    /// Set the tile of every tree pass.
    pub fn tree_tile(mut self, tile: Tile) -> Self {
        self.base = self.base.tree_tile(tile);
        self
    }

    /// Name the compiled unit.
    pub fn kernel_name(mut self, name: &'static str) -> Self {
        self.base = self.base.kernel_name(name);
        self
    }

    /// Validate the configuration, open the device and build the reducer.
    pub fn build(self) -> Result<ParallelReducer, ReduceError> {
        if let Some(parameter) = self.duplicate_param {
            return Err(ReduceError::DuplicateParameter { parameter });
        }

        let reducer = self.base.build()?;
        let parallel = self.parallel.unwrap_or(true);
        let executor = match self.backend.unwrap_or_default() {
            Backend::CPU => cpu_executor(parallel, self.threads)?,
            Backend::GPU => gpu_executor(parallel, self.threads)?,
        };

        debug!("fastHetreduce: using the {} device", executor.name());
        Ok(ParallelReducer { reducer, executor })
    }
}

// ============================================================================
// Executors
// ============================================================================

/// Device a [`ParallelReducer`] runs on.
#[derive(Debug, Clone)]
pub enum Executor {
    /// Inline host device.
    Host(HostDevice),

    /// Rayon pool.
    #[cfg(feature = "cpu")]
    Rayon(RayonDevice),

    /// GPU through wgpu.
    #[cfg(feature = "gpu")]
    Gpu(GpuDevice),
}

impl Executor {
    /// Backend of this executor.
    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => Backend::GPU,
            _ => Backend::CPU,
        }
    }

    /// Device name.
    pub fn name(&self) -> &'static str {
        use hetreduce::internals::device::Capabilities;
        match self {
            Self::Host(device) => device.name(),
            #[cfg(feature = "cpu")]
            Self::Rayon(device) => device.name(),
            #[cfg(feature = "gpu")]
            Self::Gpu(device) => device.name(),
        }
    }
}

#[cfg(feature = "cpu")]
fn cpu_executor(parallel: bool, threads: Option<usize>) -> Result<Executor, ReduceError> {
    if !parallel {
        return Ok(Executor::Host(HostDevice::new()));
    }

    let device = match threads {
        Some(threads) => RayonDevice::with_threads(threads)?,
        None => RayonDevice::new(),
    };
    Ok(Executor::Rayon(device))
}

#[cfg(not(feature = "cpu"))]
fn cpu_executor(_parallel: bool, _threads: Option<usize>) -> Result<Executor, ReduceError> {
    Ok(Executor::Host(HostDevice::new()))
}

#[cfg(feature = "gpu")]
fn gpu_executor(parallel: bool, threads: Option<usize>) -> Result<Executor, ReduceError> {
    match GpuDevice::new() {
        Ok(device) => Ok(Executor::Gpu(device)),
        Err(e) => {
            warn!("fastHetreduce: GPU unavailable ({e}), falling back to CPU");
            cpu_executor(parallel, threads)
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn gpu_executor(_parallel: bool, _threads: Option<usize>) -> Result<Executor, ReduceError> {
    Err(ReduceError::Unsupported {
        device: "gpu",
        feature: "crate built without the `gpu` feature".to_string(),
    })
}

// ============================================================================
// Parallel Reducer
// ============================================================================

/// Configured reducer bound to a device.
#[derive(Debug, Clone)]
pub struct ParallelReducer {
    reducer: Reducer,
    executor: Executor,
}

impl ParallelReducer {
    /// Dispatch configuration in use.
    pub fn config(&self) -> &ReduceConfig {
        self.reducer.config()
    }

    /// Device in use.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Backend actually in use (after any GPU fallback).
    pub fn backend(&self) -> Backend {
        self.executor.backend()
    }

    /// Strategy this reducer would pick for `n` elements of `T`.
    pub fn strategy_for<T>(&self, n: usize) -> Strategy {
        match &self.executor {
            Executor::Host(device) => self.reducer.strategy_for::<T, _>(device, n),
            #[cfg(feature = "cpu")]
            Executor::Rayon(device) => self.reducer.strategy_for::<T, _>(device, n),
            #[cfg(feature = "gpu")]
            Executor::Gpu(device) => self.reducer.strategy_for::<T, _>(device, n),
        }
    }

    /// Transform-reduce with arbitrary operators (CPU backends only).
    pub fn transform_reduce<R, T, O, F>(
        &self,
        ranges: R,
        init: Init<T>,
        reduce_op: O,
        transform_op: F,
    ) -> Result<ReduceFuture<T>, ReduceError>
    where
        R: InputRanges,
        T: Clone + Send + Sync + 'static,
        O: ReduceOp<T> + 'static,
        F: TransformOp<R::Item, T> + 'static,
    {
        match &self.executor {
            Executor::Host(device) => {
                self.reducer
                    .transform_reduce(device, ranges, init, reduce_op, transform_op)
            }
            #[cfg(feature = "cpu")]
            Executor::Rayon(device) => {
                self.reducer
                    .transform_reduce(device, ranges, init, reduce_op, transform_op)
            }
            #[cfg(feature = "gpu")]
            Executor::Gpu(_) => Err(ReduceError::Unsupported {
                device: "gpu",
                feature: "user-defined operators".to_string(),
            }),
        }
    }

    /// Reduce with a built-in operator and transform on any backend.
    pub fn reduce_builtin<T, I>(
        &self,
        input: &I,
        init: Init<T>,
        op: BuiltinOp,
        transform: BuiltinTransform,
    ) -> Result<ReduceFuture<T>, ReduceError>
    where
        T: Scalar,
        I: ReduceInput<T> + ?Sized,
    {
        let data = input.to_device_buffer()?;
        match &self.executor {
            #[cfg(feature = "gpu")]
            Executor::Gpu(device) => {
                device.transform_reduce(self.reducer.config(), &data, init, op, transform)
            }
            _ => self.transform_reduce(data, init, op, transform),
        }
    }

    /// Sum of all elements.
    pub fn sum<T, I>(&self, input: &I, init: Init<T>) -> Result<ReduceFuture<T>, ReduceError>
    where
        T: Scalar,
        I: ReduceInput<T> + ?Sized,
    {
        self.reduce_builtin(input, init, BuiltinOp::Sum, BuiltinTransform::Identity)
    }

    /// Smallest element.
    pub fn min<T, I>(&self, input: &I, init: Init<T>) -> Result<ReduceFuture<T>, ReduceError>
    where
        T: Scalar,
        I: ReduceInput<T> + ?Sized,
    {
        self.reduce_builtin(input, init, BuiltinOp::Min, BuiltinTransform::Identity)
    }

    /// Largest element.
    pub fn max<T, I>(&self, input: &I, init: Init<T>) -> Result<ReduceFuture<T>, ReduceError>
    where
        T: Scalar,
        I: ReduceInput<T> + ?Sized,
    {
        self.reduce_builtin(input, init, BuiltinOp::Max, BuiltinTransform::Identity)
    }

    /// Sum of squares.
    pub fn sum_of_squares<T, I>(&self, input: &I) -> Result<ReduceFuture<T>, ReduceError>
    where
        T: Scalar,
        I: ReduceInput<T> + ?Sized,
    {
        self.reduce_builtin(input, Init::None, BuiltinOp::Sum, BuiltinTransform::Square)
    }
}

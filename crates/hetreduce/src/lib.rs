//! # hetreduce — Adaptive Device Reductions for Rust
//!
//! A transform-reduce engine that picks, per call, how to reduce a range on
//! a data-parallel device: a single sequential task for tiny inputs, one
//! cooperative group for medium inputs, or a multi-pass tree across many
//! groups for large inputs.
//!
//! ## What is a transform-reduce?
//!
//! Every element (or tuple of elements, for several input ranges read in lock
//! step) is mapped through a transform, and the transformed values are
//! combined with an associative binary operator. An optional init value is
//! folded into the final result exactly once.
//!
//! ## Quick Start
//!
//! ### Typical Use
//!
//! ```rust
//! use hetreduce::prelude::*;
//!
//! let device = HostDevice::new();
//! let data: DeviceBuffer<u64> = (1..=10_000).collect();
//!
//! // Returns immediately with a handle; `wait()` synchronizes.
//! let sum = reduce(&device, data, Init::None, Plus)?.wait()?;
//! assert_eq!(sum, 50_005_000);
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ### Transform, Init and Several Ranges
//!
//! ```rust
//! use hetreduce::prelude::*;
//!
//! let device = HostDevice::new();
//! let x: DeviceBuffer<i64> = (0..1000).collect();
//! let y: DeviceBuffer<i64> = (0..1000).map(|v| v * 2).collect();
//!
//! // Dot product seeded with 1.
//! let dot = transform_reduce(
//!     &device,
//!     (x, y),
//!     Init::Value(1),
//!     Plus,
//!     |(a, b): (i64, i64)| a * b,
//! )?
//! .wait()?;
//! assert_eq!(dot, 1 + 2 * (0..1000i64).map(|v| v * v).sum::<i64>());
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ### Tuning the Dispatch Policy
//!
//! ```rust
//! use hetreduce::prelude::*;
//!
//! let reducer = Reducer::builder()
//!     .sequential_threshold(16)      // Tiny inputs up to 16 elements
//!     .tree_tile(Tile::new(128, 8))  // Each tree pass shrinks by 1024
//!     .kernel_name("my_sum")         // Compiled-unit identity
//!     .build()?;
//!
//! let device = HostDevice::new();
//! assert_eq!(reducer.strategy_for::<f32, _>(&device, 16), Strategy::Sequential);
//!
//! let max = reducer
//!     .reduce(&device, DeviceBuffer::from(vec![3.0f32, 9.5, -1.0]), Init::None, Maximum)?
//!     .wait()?;
//! assert_eq!(max, 9.5);
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ### Result and Error Handling
//!
//! Entry points return `Result<ReduceFuture<T>, ReduceError>`: configuration
//! and input errors surface immediately, execution faults surface when the
//! handle is waited on.
//!
//! ```rust
//! use hetreduce::prelude::*;
//!
//! let device = HostDevice::new();
//! let empty: DeviceBuffer<i32> = DeviceBuffer::from(Vec::new());
//!
//! match reduce(&device, empty, Init::None, Plus) {
//!     Ok(_) => unreachable!(),
//!     Err(e) => assert_eq!(e, ReduceError::EmptyInput),
//! }
//! ```
//!
//! ## Operator Requirements
//!
//! The reduce operator must be associative. Items of a group read strided
//! slices of the input, so the parallel strategies also rely on the operator
//! being commutative. Floating-point sums are associative only up to
//! rounding; expect small differences between strategies.
//!
//! ## Devices
//!
//! This crate ships [`HostDevice`](prelude::HostDevice), which runs every
//! group inline on the calling thread. The `fastHetreduce` crate adds a
//! multi-threaded rayon device and a wgpu GPU device.
//!
//! ## License
//!
//! See the repository for license information and contribution guidelines.

// Layer 1: Primitives - data structures and basic utilities.
mod primitives;

// Layer 2: Ops - reduce operators, transforms and init values.
mod ops;

// Layer 3: Device - execution contexts and pass queues.
mod device;

// Layer 4: Engine - dispatch policy and reduction strategies.
mod engine;

// High-level fluent API for device reductions.
mod api;

// Standard hetreduce prelude.
pub mod prelude {
    pub use crate::api::{
        Backend::{CPU, GPU},
        Capabilities, DeviceBuffer, HostDevice, Init, InputRanges, Maximum, Minimum, Multiplies,
        Plus, ReduceError, ReduceFuture, ReduceOp, Reducer, ReducerBuilder, TransformOp,
        reduce, transform_reduce,
    };
    pub use crate::device::Device;
    pub use crate::engine::policy::{Strategy, Tile, TileBracket};
    pub use crate::ops::transform::Identity;
}

// Internal modules for development and testing.
//
// This module re-exports internal modules for development and testing purposes.
// It is only available with the `dev` feature enabled.
#[cfg(feature = "dev")]
pub mod internals {
    pub mod primitives {
        pub use crate::primitives::*;
    }
    pub mod ops {
        pub use crate::ops::*;
    }
    pub mod device {
        pub use crate::device::*;
    }
    pub mod engine {
        pub use crate::engine::*;
    }
    pub mod api {
        pub use crate::api::*;
    }
}

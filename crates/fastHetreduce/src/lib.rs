//! # fastHetreduce — Parallel and GPU Devices for hetreduce
//!
//! Acceleration crate for [`hetreduce`]. It adds two execution contexts that
//! run the same adaptive reduction (sequential, single-group, tree) as the
//! core crate:
//!
//! * **`RayonDevice`** (feature `cpu`, default): groups of each pass run in
//!   parallel on a rayon pool, and every reduction runs on the pool
//!   asynchronously to the caller.
//! * **`GpuDevice`** (feature `gpu`): strategies run as WGSL compute kernels
//!   through `wgpu` for built-in scalars, operators and transforms.
//!
//! ## Quick Start
//!
//! ### Typical Use
//!
//! ```rust
//! use fastHetreduce::prelude::*;
//!
//! let data: Vec<f32> = (0..100_000).map(|i| (i % 10) as f32).collect();
//!
//! // Parallel CPU execution (default)
//! let reducer = FastReducer::new().backend(CPU).build()?;
//!
//! let total = reducer.sum(&data, Init::None)?.wait()?;
//! assert_eq!(total, 450_000.0);
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ### Arbitrary Operators
//!
//! Closures run on the CPU backends:
//!
//! ```rust
//! use fastHetreduce::prelude::*;
//!
//! let words: DeviceBuffer<&'static str> = vec!["device", "reduce", "tree"].into();
//! let reducer = FastReducer::new().build()?;
//!
//! let longest = reducer
//!     .transform_reduce(words, Init::None, Maximum, |w: &'static str| w.len())?
//!     .wait()?;
//! assert_eq!(longest, 6);
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ### ndarray Integration
//!
//! ```rust
//! use fastHetreduce::prelude::*;
//! use ndarray::Array1;
//!
//! let x = Array1::from_vec((1..=1000).map(|i| i as i32 - 500).collect());
//! let reducer = FastReducer::new().build()?;
//!
//! // Largest magnitude, seeded with 0.
//! let peak = reducer.reduce_builtin(&x, Init::Value(0), Max, Abs)?.wait()?;
//! assert_eq!(peak, 500);
//! # Result::<(), ReduceError>::Ok(())
//! ```
//!
//! ## License
//!
//! See the repository for license information and contribution guidelines.

#![allow(non_snake_case)]

/// GPU execution context.
#[cfg(feature = "gpu")]
pub mod gpu {
    pub use crate::engine::gpu::GpuDevice;
}

// Layer 4: Engine - parallel and GPU devices, built-in operators.
mod engine;

// High-level fluent API with backend selection.
mod api;

// Input data handling.
mod input;

// Standard fastHetreduce prelude.
pub mod prelude {
    pub use crate::api::{
        Backend::{CPU, GPU},
        BuiltinOp::{self, Max, Min, Sum},
        BuiltinTransform::{self, Abs, Square},
        DeviceBuffer, FastReducerBuilder as FastReducer, Init, Maximum, Minimum, Multiplies, Plus,
        ParallelReducer, ReduceError, ReduceFuture, Scalar, Strategy, Tile, TileBracket,
    };
    pub use crate::input::ReduceInput;

    #[cfg(feature = "cpu")]
    pub use crate::api::RayonDevice;
}

// Internal modules for development and testing.
//
// This module re-exports internal modules for development and testing purposes.
// It is only available with the `dev` feature enabled.
#[cfg(feature = "dev")]
pub mod internals {
    pub mod engine {
        pub use crate::engine::*;
    }
    pub mod api {
        pub use crate::api::*;
    }
    pub mod input {
        pub use crate::input::*;
    }
}

//! Layer 4: Engine
//!
//! # Purpose
//!
//! This layer provides the execution contexts of the acceleration crate and
//! the closed operator set they share.
//!
//! # Architecture
//!
//! ```text
//! API (FastReducer)
//!   ↓
//! Engine ← You are here
//!   ├── executor: RayonDevice (implements hetreduce's Device)
//!   ├── gpu:      GpuDevice (WGSL kernels, Capabilities only)
//!   └── builtin:  Scalar, BuiltinOp, BuiltinTransform
//!   ↓
//! hetreduce (policy, strategies, handle)
//! ```

/// Built-in scalars, operators and transforms.
pub mod builtin;

/// Multi-threaded CPU device.
#[cfg(feature = "cpu")]
pub mod executor;

/// GPU device.
#[cfg(feature = "gpu")]
pub mod gpu;

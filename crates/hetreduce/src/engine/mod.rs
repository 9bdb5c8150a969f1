//! Layer 4: Engine
//!
//! # Purpose
//!
//! This layer holds the adaptive reduction backend: the dispatch policy, the
//! three strategies it chooses between, the group-local primitives they share,
//! and the asynchronous handle returned to callers.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine ← You are here
//!   ↓
//! Layer 3: Device
//!   ↓
//! Layer 2: Ops
//!   ↓
//! Layer 1: Primitives
//! ```

/// Strategy selection and tiling.
pub mod policy;

/// Group-local transform and fold.
pub mod group;

/// Bundled reduction inputs.
pub mod task;

/// Single-task reducer for tiny inputs.
pub mod sequential;

/// One-group reducer for medium inputs.
pub mod single_group;

/// Multi-pass reducer for large inputs.
pub mod tree;

/// Asynchronous result handle.
pub mod future;

/// Validation utilities.
pub mod validator;

/// Entry point of the reduction backend.
pub mod executor;

//! Layer 1: Primitives
//!
//! # Purpose
//!
//! This layer provides the primitive abstractions and data structures used
//! throughout the crate. It has zero internal dependencies within the crate.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Device
//!   ↓
//! Layer 2: Ops
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Shared error types.
pub mod errors;

/// Execution backend configuration.
pub mod backend;

/// Intermediate buffer and result cell.
pub mod buffer;

/// Device-resident input ranges.
pub mod range;

//! Layer 2: Ops
//!
//! # Purpose
//!
//! This layer defines the operator vocabulary of a reduction: the binary
//! reduce operator, the transform applied to input elements before they are
//! combined, and the optional init value folded into the final result.
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
//! Layer 2: Ops ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Binary reduce operators.
pub mod reduce;

/// Element transforms.
pub mod transform;

/// Init value handling.
pub mod init;

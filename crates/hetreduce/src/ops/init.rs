//! Init value handling.
//!
//! ## Purpose
//!
//! A reduction may be seeded with an init value. The seed is not part of the
//! parallel combination; it is folded in exactly once, by the execution
//! context that writes the result cell, as `combine(init, result)`.

// Internal dependencies
use crate::ops::reduce::ReduceOp;

/// Optional seed combined with the final reduced result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init<T> {
    /// No seed; the raw transform-reduce result is returned.
    None,

    /// Seed combined on the left of the result.
    Value(T),
}

impl<T: Clone> Init<T> {
    /// Fold the seed into `result`.
    #[inline]
    pub fn apply<O: ReduceOp<T> + ?Sized>(&self, result: T, op: &O) -> T {
        match self {
            Self::None => result,
            Self::Value(init) => op.combine(init.clone(), result),
        }
    }
}

impl<T> Default for Init<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T> Init<T> {
    /// Whether a seed is present.
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl<T> From<Option<T>> for Init<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Self::Value(v),
            None => Self::None,
        }
    }
}

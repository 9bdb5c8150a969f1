//! Element transforms applied before combination.
//!
//! ## Purpose
//!
//! This module defines [`TransformOp`], which maps the element (or tuple of
//! elements, for several input ranges) at one index to the accumulator type.
//! Any `Fn(In) -> T` closure is a transform.

/// Maps input elements to the accumulator type.
pub trait TransformOp<In, T>: Send + Sync {
    /// Transform one element.
    fn apply(&self, input: In) -> T;
}

impl<In, T, F> TransformOp<In, T> for F
where
    F: Fn(In) -> T + Send + Sync,
{
    #[inline]
    fn apply(&self, input: In) -> T {
        self(input)
    }
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<T> TransformOp<T, T> for Identity {
    #[inline]
    fn apply(&self, input: T) -> T {
        input
    }
}

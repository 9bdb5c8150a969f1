//! Binary reduce operators.
//!
//! ## Purpose
//!
//! This module defines [`ReduceOp`], the combination step of a reduction, and
//! the built-in operators. Any `Fn(T, T) -> T` closure is a reduce operator.
//!
//! ## Invariants
//!
//! * Operators are assumed associative. The parallel strategies regroup and
//!   reorder operands (items read strided slices), so they must also be
//!   commutative for results to match a left-to-right fold exactly.
//! * Floating-point operators are only associative up to rounding; results
//!   may differ between strategies within that tolerance.

// External dependencies
use std::ops::{Add, Mul};

/// Associative binary operator combining two partial results.
pub trait ReduceOp<T>: Send + Sync {
    /// Combine two partial results.
    fn combine(&self, a: T, b: T) -> T;
}

impl<T, F> ReduceOp<T> for F
where
    F: Fn(T, T) -> T + Send + Sync,
{
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        self(a, b)
    }
}

/// Sum of two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plus;

impl<T: Add<Output = T>> ReduceOp<T> for Plus {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        a + b
    }
}

/// Product of two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Multiplies;

impl<T: Mul<Output = T>> ReduceOp<T> for Multiplies {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        a * b
    }
}

/// Smaller of two values; keeps the left operand on ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Minimum;

impl<T: PartialOrd> ReduceOp<T> for Minimum {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        if b < a { b } else { a }
    }
}

/// Larger of two values; keeps the left operand on ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Maximum;

impl<T: PartialOrd> ReduceOp<T> for Maximum {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        if b > a { b } else { a }
    }
}

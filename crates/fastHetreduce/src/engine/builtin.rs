//! Built-in scalars, operators and transforms.
//!
//! ## Purpose
//!
//! GPU kernels cannot call arbitrary closures, so the GPU device reduces over
//! a closed set of element types, operators and transforms. This module
//! defines that set once, usable both as ordinary `hetreduce` operators on
//! the CPU and as WGSL snippets for the GPU.
//!
//! ## Design notes
//!
//! * **Same semantics on both sides**: Integer sums and squares wrap, as they
//!   do in WGSL. Min/max keep the left operand on ties.
//! * **Four-byte scalars**: Every scalar is 32 bits wide so its init value
//!   travels as raw bits in the kernel's parameter block.
//!
//! ## Invariants
//!
//! * `Scalar::from_bits(v.to_bits()) == v` for every non-NaN `v`.

// External dependencies
use bytemuck::Pod;
use num_traits::Zero;
use std::fmt::Debug;

// Export dependencies from hetreduce crate
use hetreduce::internals::ops::reduce::ReduceOp;
use hetreduce::internals::ops::transform::TransformOp;

// ============================================================================
// Scalar
// ============================================================================

/// Element type supported by every device, including the GPU.
pub trait Scalar: Pod + Zero + PartialOrd + Debug + Send + Sync + 'static {
    /// WGSL spelling of the type.
    const WGSL: &'static str;

    /// Sum; wraps on integer overflow.
    fn add(self, other: Self) -> Self;

    /// Product; wraps on integer overflow.
    fn mul(self, other: Self) -> Self;

    /// Absolute value; wraps for the most negative signed integer.
    fn abs(self) -> Self;

    /// Raw 32-bit pattern.
    fn to_bits(self) -> u32;

    /// Value from a raw 32-bit pattern.
    fn from_bits(bits: u32) -> Self;
}

impl Scalar for f32 {
    const WGSL: &'static str = "f32";

    #[inline]
    fn add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn mul(self, other: Self) -> Self {
        self * other
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }

    #[inline]
    fn to_bits(self) -> u32 {
        f32::to_bits(self)
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        f32::from_bits(bits)
    }
}

impl Scalar for u32 {
    const WGSL: &'static str = "u32";

    #[inline]
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline]
    fn mul(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }

    #[inline]
    fn abs(self) -> Self {
        self
    }

    #[inline]
    fn to_bits(self) -> u32 {
        self
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        bits
    }
}

impl Scalar for i32 {
    const WGSL: &'static str = "i32";

    #[inline]
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline]
    fn mul(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }

    #[inline]
    fn abs(self) -> Self {
        self.wrapping_abs()
    }

    #[inline]
    fn to_bits(self) -> u32 {
        self as u32
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        bits as i32
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Built-in reduce operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuiltinOp {
    /// Sum.
    #[default]
    Sum,

    /// Minimum.
    Min,

    /// Maximum.
    Max,
}

impl BuiltinOp {
    /// Short name used in kernel labels.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// WGSL body of `fn combine(a: S, b: S) -> S`.
    pub fn wgsl(self) -> &'static str {
        match self {
            Self::Sum => "return a + b;",
            Self::Min => "if (b < a) { return b; } return a;",
            Self::Max => "if (b > a) { return b; } return a;",
        }
    }
}

impl<T: Scalar> ReduceOp<T> for BuiltinOp {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        match self {
            Self::Sum => Scalar::add(a, b),
            Self::Min => {
                if b < a {
                    b
                } else {
                    a
                }
            }
            Self::Max => {
                if b > a {
                    b
                } else {
                    a
                }
            }
        }
    }
}

/// Built-in element transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuiltinTransform {
    /// Element unchanged.
    #[default]
    Identity,

    /// Absolute value.
    Abs,

    /// Element times itself.
    Square,
}

impl BuiltinTransform {
    /// Short name used in kernel labels.
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Abs => "abs",
            Self::Square => "square",
        }
    }

    /// WGSL body of `fn transform(v: S) -> S`.
    pub fn wgsl(self) -> &'static str {
        match self {
            Self::Identity => "return v;",
            Self::Abs => "return abs(v);",
            Self::Square => "return v * v;",
        }
    }
}

impl<T: Scalar> TransformOp<T, T> for BuiltinTransform {
    #[inline]
    fn apply(&self, input: T) -> T {
        match self {
            Self::Identity => input,
            Self::Abs => Scalar::abs(input),
            Self::Square => Scalar::mul(input, input),
        }
    }
}

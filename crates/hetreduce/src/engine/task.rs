//! Bundled inputs of one reduction.

// Internal dependencies
use crate::ops::init::Init;
use crate::ops::reduce::ReduceOp;
use crate::ops::transform::TransformOp;
use crate::primitives::range::InputRanges;

/// Everything a strategy needs besides the device: ranges, operators, seed.
#[derive(Debug, Clone)]
pub struct ReduceTask<R, T, O, F> {
    /// Input ranges, read in lock step.
    pub ranges: R,

    /// Operator combining partial results.
    pub reduce_op: O,

    /// Transform applied to each input element.
    pub transform_op: F,

    /// Seed combined with the final result.
    pub init: Init<T>,

    /// Identity of the compiled unit (kernel label).
    pub kernel_name: Option<&'static str>,
}

impl<R, T, O, F> ReduceTask<R, T, O, F>
where
    R: InputRanges,
    O: ReduceOp<T>,
    F: TransformOp<R::Item, T>,
{
    /// Bundle a reduction.
    pub fn new(ranges: R, init: Init<T>, reduce_op: O, transform_op: F) -> Self {
        Self {
            ranges,
            reduce_op,
            transform_op,
            init,
            kernel_name: None,
        }
    }

    /// Attach a kernel label.
    pub fn with_kernel_name(mut self, name: Option<&'static str>) -> Self {
        self.kernel_name = name;
        self
    }

    /// Transformed element at `idx`.
    #[inline]
    pub fn load(&self, idx: usize) -> T {
        self.transform_op.apply(self.ranges.get(idx))
    }
}

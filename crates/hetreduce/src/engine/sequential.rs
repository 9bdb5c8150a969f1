//! Sequential reducer.
//!
//! ## Purpose
//!
//! Runs the whole reduction as one single-threaded task. Used for tiny inputs
//! where parallel dispatch overhead dominates.
//!
//! ## Invariants
//!
//! * Elements are transformed and combined left to right over `0..n`.
//! * The result cell is written once, with the init value folded in.

// Internal dependencies
use crate::device::Device;
use crate::device::queue::Queue;
use crate::engine::task::ReduceTask;
use crate::ops::reduce::ReduceOp;
use crate::ops::transform::TransformOp;
use crate::primitives::buffer::ResultCell;
use crate::primitives::errors::ReduceError;
use crate::primitives::range::InputRanges;

/// Left-to-right transform-reduce of the first `n` elements, without init.
pub fn fold<R, T, O, F>(n: usize, task: &ReduceTask<R, T, O, F>) -> Option<T>
where
    R: InputRanges,
    O: ReduceOp<T>,
    F: TransformOp<R::Item, T>,
{
    (0..n).fold(None, |acc, i| {
        let value = task.load(i);
        Some(match acc {
            Some(prev) => task.reduce_op.combine(prev, value),
            None => value,
        })
    })
}

/// Reduce `n` elements as a single task and write the result cell.
pub fn reduce<D, R, T, O, F>(
    device: &D,
    n: usize,
    task: &ReduceTask<R, T, O, F>,
    cell: &ResultCell<T>,
) -> Result<(), ReduceError>
where
    D: Device,
    R: InputRanges,
    T: Clone + Send + Sync,
    O: ReduceOp<T>,
    F: TransformOp<R::Item, T>,
{
    debug_assert!(n > 0, "reduction over an empty range");

    let mut queue = Queue::new(device, task.kernel_name);
    let mut single = [()];
    let event = queue.submit(&[], |dev| {
        dev.launch(&mut single, 1, &|_, _| {
            let result = fold(n, task).ok_or(ReduceError::EmptyInput)?;
            cell.write(task.init.apply(result, &task.reduce_op))
        })
    })?;
    event.wait();
    Ok(())
}

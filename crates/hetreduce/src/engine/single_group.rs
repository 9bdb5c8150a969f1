//! Single-group reducer.
//!
//! ## Purpose
//!
//! Runs the reduction within exactly one cooperative group using group-local
//! staging memory, with no cross-group synchronization.
//!
//! ## Design notes
//!
//! * Items read strided elements and skip indices past `n`, so the tail of a
//!   partially filled group contributes nothing.
//! * The tile table tops out at fewer elements per group than the largest
//!   input this strategy accepts; elements per item are widened until the one
//!   group covers all `n` elements.
//! * Item 0 applies the init value and writes the result cell.

// Internal dependencies
use crate::device::Device;
use crate::device::queue::Queue;
use crate::engine::group::run_group;
use crate::engine::policy::Tile;
use crate::engine::task::ReduceTask;
use crate::ops::reduce::ReduceOp;
use crate::ops::transform::TransformOp;
use crate::primitives::buffer::ResultCell;
use crate::primitives::errors::ReduceError;
use crate::primitives::range::InputRanges;

/// Reduce `n` elements within one group of `tile.work_group_size` items.
pub fn reduce<D, R, T, O, F>(
    device: &D,
    n: usize,
    tile: Tile,
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

    let tile = tile.covering(n);
    let load = |idx: usize| Some(task.load(idx));

    let mut queue = Queue::new(device, task.kernel_name);
    let mut single = [()];
    let event = queue.submit(&[], |dev| {
        dev.launch(&mut single, tile.work_group_size, &|group, _| {
            let partial = run_group(group, n, tile, &task.reduce_op, &load).ok_or_else(|| {
                ReduceError::DeviceFault(format!("group {group} produced no partial result"))
            })?;
            cell.write(task.init.apply(partial, &task.reduce_op))
        })
    })?;
    event.wait();
    Ok(())
}

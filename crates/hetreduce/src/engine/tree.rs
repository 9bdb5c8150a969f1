//! Tree reducer.
//!
//! ## Purpose
//!
//! Multi-pass reduction across many cooperative groups. Each pass shrinks the
//! problem by `work_group_size * iters_per_work_item` until a single group
//! holds the whole remainder, whose leader writes the result cell.
//!
//! ## Design notes
//!
//! * **First pass**: Groups transform their slice of the input ranges.
//! * **Later passes**: Groups read partial results from the intermediate
//!   buffer; the transform is a pass-through since values are already reduced.
//! * **Double buffering**: Each pass reads one half of the intermediate
//!   buffer and writes the other; halves swap between passes.
//! * **Ordering**: Every pass is submitted with a dependency on the previous
//!   pass's event, so passes never overlap.
//!
//! ## Key concepts
//!
//! ```text
//! FirstPass ──(n_groups > 1)──> SubsequentPass ──(n_groups > 1)──┐
//!     │                              │   ^                       │
//!     │                              │   └───────────────────────┘
//!     └──(n_groups == 1)──> Done <───┘ (n_groups == 1)
//! ```
//!
//! ## Invariants
//!
//! * Pass count is at most `ceil(log_{tile}(n)) + 1`.
//! * The result cell is written exactly once, by the last pass.

// External dependencies
use log::trace;

// Internal dependencies
use crate::device::Device;
use crate::device::queue::{Event, Queue};
use crate::engine::group::run_group;
use crate::engine::policy::Tile;
use crate::engine::task::ReduceTask;
use crate::ops::reduce::ReduceOp;
use crate::ops::transform::TransformOp;
use crate::primitives::buffer::{IntermediateBuffer, ResultCell};
use crate::primitives::errors::ReduceError;
use crate::primitives::range::InputRanges;

/// Position of the tree reducer in its pass loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Groups read the original input ranges.
    FirstPass,

    /// Groups read partial results of the previous pass.
    SubsequentPass,

    /// The result cell has been written.
    Done,
}

/// Outcome of a tree reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeReport {
    /// Number of passes submitted.
    pub passes: usize,

    /// Group count of the first pass (half the intermediate buffer size).
    pub first_pass_groups: usize,
}

/// Reduce `n` elements over as many passes as needed.
pub fn reduce<D, R, T, O, F>(
    device: &D,
    n: usize,
    tile: Tile,
    task: &ReduceTask<R, T, O, F>,
    cell: &ResultCell<T>,
) -> Result<TreeReport, ReduceError>
where
    D: Device,
    R: InputRanges,
    T: Clone + Send + Sync,
    O: ReduceOp<T>,
    F: TransformOp<R::Item, T>,
{
    debug_assert!(n > 0, "reduction over an empty range");

    let mut n = n;
    let mut n_groups = tile.groups_for(n);
    let first_pass_groups = n_groups;

    let mut temp = IntermediateBuffer::<T>::new(n_groups)?;
    let mut queue = Queue::new(device, task.kernel_name);
    let mut event = Event::completed();
    let mut state = PassState::FirstPass;

    while state != PassState::Done {
        let (len, groups) = (n, n_groups);
        trace!(
            "tree pass {} ({:?}): n={len}, groups={groups}, dst offset {}",
            queue.submitted(),
            state,
            temp.dst_offset()
        );

        let first = state == PassState::FirstPass;
        event = queue.submit(&[&event], |dev| {
            let (src, dst) = temp.halves();
            let dst = &mut dst[..groups];

            let from_input = |idx: usize| Some(task.load(idx));
            let from_partials = |idx: usize| src[idx].clone();

            dev.launch(dst, tile.work_group_size, &|group, slot: &mut Option<T>| {
                let partial = if first {
                    run_group(group, len, tile, &task.reduce_op, &from_input)
                } else {
                    run_group(group, len, tile, &task.reduce_op, &from_partials)
                };
                let partial = partial.ok_or_else(|| {
                    ReduceError::DeviceFault(format!("group {group} produced no partial result"))
                })?;

                // The leader of the last remaining group finishes the reduction.
                if groups == 1 {
                    cell.write(task.init.apply(partial.clone(), &task.reduce_op))?;
                }
                *slot = Some(partial);
                Ok(())
            })
        })?;

        state = if n_groups == 1 {
            PassState::Done
        } else {
            PassState::SubsequentPass
        };

        temp.swap();
        n = n_groups;
        n_groups = tile.groups_for(n);
    }

    event.wait();
    Ok(TreeReport {
        passes: queue.submitted(),
        first_pass_groups,
    })
}

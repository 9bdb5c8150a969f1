//! Group-local reduction primitives.
//!
//! ## Purpose
//!
//! This module holds the work done inside one cooperative group, shared by
//! the single-group and tree reducers: every item transforms its share of the
//! input into a group-local staging area, the group synchronizes, and the
//! staging area is folded pairwise down to one value held by item 0.
//!
//! ## Design notes
//!
//! * **Strided assignment**: Item `l` of a group starting at `base` reads
//!   `base + l + k * work_group_size` for `k < iters_per_work_item`. The items
//!   holding data therefore always form a prefix of the group, and an item
//!   whose first index is past `n` simply leaves its slot empty.
//! * **Lockstep**: Items of a group are stepped phase by phase. A phase is
//!   completed for every item before the next phase reads what it wrote,
//!   which is the guarantee a group barrier gives.
//! * **Pairwise fold**: At step `s` (1, 2, 4, ...) item `l` with
//!   `l % 2s == 0` folds slot `l + s` into slot `l`, for `log2(work_group_size)` steps.
//!
//! ## Invariants
//!
//! * The loader is only called with indices below `n`.
//! * After the fold, slot 0 holds the group's partial result.

// Internal dependencies
use crate::engine::policy::Tile;
use crate::ops::reduce::ReduceOp;

/// Transform step of item `local_idx`: fold the elements it owns.
///
/// `load` maps a global element index to the transformed value; the item
/// checks every index against `n` itself before loading it.
#[inline]
pub fn transform_item<T, O, L>(
    local_idx: usize,
    n: usize,
    group_base: usize,
    tile: Tile,
    op: &O,
    load: &L,
) -> Option<T>
where
    O: ReduceOp<T> + ?Sized,
    L: Fn(usize) -> Option<T> + ?Sized,
{
    let mut acc: Option<T> = None;
    for k in 0..tile.iters_per_work_item {
        let idx = group_base + local_idx + k * tile.work_group_size;
        if idx >= n {
            break;
        }
        if let Some(value) = load(idx) {
            acc = Some(match acc {
                Some(prev) => op.combine(prev, value),
                None => value,
            });
        }
    }
    acc
}

/// Pairwise tree fold over a group's staging area; returns slot 0.
pub fn reduce_over_group<T, O>(op: &O, local: &mut [Option<T>]) -> Option<T>
where
    O: ReduceOp<T> + ?Sized,
{
    let size = local.len();
    let mut step = 1;
    while step < size {
        let mut l = 0;
        while l + step < size {
            if let Some(right) = local[l + step].take() {
                local[l] = Some(match local[l].take() {
                    Some(left) => op.combine(left, right),
                    None => right,
                });
            }
            l += 2 * step;
        }
        step *= 2;
    }
    local.first_mut().and_then(Option::take)
}

/// Run group `group` over the first `n` elements: transform, barrier, fold.
pub fn run_group<T, O, L>(group: usize, n: usize, tile: Tile, op: &O, load: &L) -> Option<T>
where
    O: ReduceOp<T> + ?Sized,
    L: Fn(usize) -> Option<T> + ?Sized,
{
    let group_base = group * tile.size_per_group();

    // 1. Every item fills its staging slot.
    let mut local: Vec<Option<T>> = (0..tile.work_group_size)
        .map(|local_idx| transform_item(local_idx, n, group_base, tile, op, load))
        .collect();

    // Barrier: the staging area is complete before it is read below.

    // 2. Fold the staging area within the group.
    reduce_over_group(op, &mut local)
}

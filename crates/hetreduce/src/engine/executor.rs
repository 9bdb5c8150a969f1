//! Execution engine for device reductions.
//!
//! ## Purpose
//!
//! This module is the entry point of the reduction backend. It asks the
//! dispatch policy for a strategy, runs that strategy as one asynchronous job
//! on the device, and hands the caller a [`ReduceFuture`] for the result cell.
//!
//! ## Design notes
//!
//! * **Closed strategy set**: `Sequential`, `SingleGroup`, `Tree`.
//! * **Asynchronous**: The call returns before the reduction runs on devices
//!   whose `spawn` is asynchronous.
//! * **Fault capture**: A panic inside a user operator is caught and delivered
//!   through the handle as a device fault.
//!
//! ## Invariants
//!
//! * `n > 0` (debug assertion; entry points validate first).
//! * Exactly one strategy runs per call and the result cell is written once.
//!
//! ## Non-goals
//!
//! * This module does not validate input (handled by `validator`).
//! * This module does not retry or recover from faults.

// External dependencies
use log::debug;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

// Internal dependencies
use crate::device::Device;
use crate::engine::future::{ReduceFuture, channel};
use crate::engine::policy::{ReduceConfig, Strategy};
use crate::engine::task::ReduceTask;
use crate::engine::{sequential, single_group, tree};
use crate::ops::reduce::ReduceOp;
use crate::ops::transform::TransformOp;
use crate::primitives::buffer::ResultCell;
use crate::primitives::errors::ReduceError;
use crate::primitives::range::InputRanges;

/// Run `strategy` over `n` elements on the current thread and return the result.
pub fn execute<D, R, T, O, F>(
    device: &D,
    strategy: Strategy,
    n: usize,
    task: &ReduceTask<R, T, O, F>,
) -> Result<T, ReduceError>
where
    D: Device,
    R: InputRanges,
    T: Clone + Send + Sync,
    O: ReduceOp<T>,
    F: TransformOp<R::Item, T>,
{
    let cell = ResultCell::new();

    match strategy {
        Strategy::Sequential => sequential::reduce(device, n, task, &cell)?,
        Strategy::SingleGroup(tile) => single_group::reduce(device, n, tile, task, &cell)?,
        Strategy::Tree(tile) => {
            let report = tree::reduce(device, n, tile, task, &cell)?;
            debug!(
                "{}: tree reduction of {n} elements took {} passes",
                device.name(),
                report.passes
            );
        }
    }

    cell.into_inner().ok_or(ReduceError::Disconnected)
}

/// Dispatch a transform-reduce over `task.ranges` and return its handle.
pub fn parallel_transform_reduce<D, R, T, O, F>(
    device: &D,
    config: &ReduceConfig,
    task: ReduceTask<R, T, O, F>,
) -> ReduceFuture<T>
where
    D: Device,
    R: InputRanges,
    T: Clone + Send + Sync + 'static,
    O: ReduceOp<T> + 'static,
    F: TransformOp<R::Item, T> + 'static,
{
    let n = task.ranges.len();
    debug_assert!(n > 0, "reduction over an empty range");

    let strategy = config.select_strategy::<T, D>(n, device);
    let (promise, future) = channel();
    let job_device = device.clone();

    device.spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute(&job_device, strategy, n, &task)
        }))
        .unwrap_or_else(|panic| Err(ReduceError::DeviceFault(panic_message(panic))));
        promise.fulfill(outcome);
    });

    future
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "kernel panicked".to_string()
    }
}

//! Layer 3: Device
//!
//! # Purpose
//!
//! This layer abstracts the execution context a reduction runs on: the two
//! capability queries the dispatch policy consults, the launch of independent
//! cooperative groups, asynchronous job submission, and in-order pass queues.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Device ← You are here
//!   ↓
//! Layer 2: Ops
//!   ↓
//! Layer 1: Primitives
//! ```

// Internal dependencies
use crate::primitives::errors::ReduceError;

/// Inline host device.
pub mod host;

/// In-order pass submission with completion events.
pub mod queue;

// ============================================================================
// Capabilities
// ============================================================================

/// Capability probes consulted by the dispatch policy.
pub trait Capabilities {
    /// Short device name used in logs.
    fn name(&self) -> &'static str;

    /// Maximum number of items in one cooperative group.
    fn max_work_group_size(&self) -> usize;

    /// Largest group size, at most `work_group_size`, whose group-local
    /// allocation of `bytes_per_item` per item fits in local memory.
    fn max_local_allocation_size(&self, bytes_per_item: usize, work_group_size: usize) -> usize;
}

/// Group size that fits `local_memory_bytes` at `bytes_per_item`, capped at `work_group_size`.
#[inline]
pub fn fit_local_allocation(
    local_memory_bytes: usize,
    bytes_per_item: usize,
    work_group_size: usize,
) -> usize {
    work_group_size.min(local_memory_bytes / bytes_per_item.max(1))
}

// ============================================================================
// Device
// ============================================================================

/// Execution context able to run cooperative groups.
pub trait Device: Capabilities + Clone + Send + Sync + 'static {
    /// Run one cooperative group of `work_group_size` items per element of
    /// `groups`. The kernel receives the group id and the group's output slot.
    ///
    /// Groups are independent; no ordering between them is guaranteed. The
    /// first kernel error is returned once all groups have stopped.
    fn launch<S, K>(&self, groups: &mut [S], work_group_size: usize, kernel: &K) -> Result<(), ReduceError>
    where
        S: Send,
        K: Fn(usize, &mut S) -> Result<(), ReduceError> + Sync;

    /// Run `job` asynchronously with respect to the caller.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}

/// Reject group sizes a device cannot run.
pub fn check_work_group_size<C: Capabilities + ?Sized>(
    device: &C,
    work_group_size: usize,
) -> Result<(), ReduceError> {
    if work_group_size == 0 || work_group_size > device.max_work_group_size() {
        return Err(ReduceError::Unsupported {
            device: device.name(),
            feature: format!(
                "work group of {work_group_size} items (max {})",
                device.max_work_group_size()
            ),
        });
    }
    Ok(())
}

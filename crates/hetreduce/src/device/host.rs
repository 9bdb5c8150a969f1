//! Inline host device.
//!
//! ## Purpose
//!
//! [`HostDevice`] executes everything on the calling thread: groups run one
//! after another and spawned jobs run before `spawn` returns. It is the
//! reference execution context for the strategies and the default device of
//! the core crate.
//!
//! ## Design notes
//!
//! * **Deterministic**: Groups always run in id order.
//! * **Configurable limits**: Group size and local memory are plain settings,
//!   so tests can force any dispatch tier.

// Internal dependencies
use crate::device::{Capabilities, Device, check_work_group_size, fit_local_allocation};
use crate::primitives::errors::ReduceError;

/// Default maximum group size.
pub const DEFAULT_MAX_WORK_GROUP_SIZE: usize = 1024;

/// Default group-local memory, in bytes.
pub const DEFAULT_LOCAL_MEMORY_BYTES: usize = 64 * 1024;

/// Device that runs every group and job inline on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostDevice {
    max_work_group_size: usize,
    local_memory_bytes: usize,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDevice {
    /// Create a host device with default limits.
    pub fn new() -> Self {
        Self {
            max_work_group_size: DEFAULT_MAX_WORK_GROUP_SIZE,
            local_memory_bytes: DEFAULT_LOCAL_MEMORY_BYTES,
        }
    }

    /// Override the maximum group size.
    pub fn with_max_work_group_size(mut self, size: usize) -> Self {
        self.max_work_group_size = size.max(1);
        self
    }

    /// Override the group-local memory size.
    pub fn with_local_memory(mut self, bytes: usize) -> Self {
        self.local_memory_bytes = bytes;
        self
    }
}

impl Capabilities for HostDevice {
    fn name(&self) -> &'static str {
        "host"
    }

    fn max_work_group_size(&self) -> usize {
        self.max_work_group_size
    }

    fn max_local_allocation_size(&self, bytes_per_item: usize, work_group_size: usize) -> usize {
        fit_local_allocation(self.local_memory_bytes, bytes_per_item, work_group_size)
    }
}

impl Device for HostDevice {
    fn launch<S, K>(&self, groups: &mut [S], work_group_size: usize, kernel: &K) -> Result<(), ReduceError>
    where
        S: Send,
        K: Fn(usize, &mut S) -> Result<(), ReduceError> + Sync,
    {
        check_work_group_size(self, work_group_size)?;
        for (group, slot) in groups.iter_mut().enumerate() {
            kernel(group, slot)?;
        }
        Ok(())
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        job();
    }
}

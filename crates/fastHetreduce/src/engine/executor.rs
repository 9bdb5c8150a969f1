//! Parallel execution context for device reductions.
//!
//! ## Purpose
//!
//! This module provides [`RayonDevice`], a `hetreduce` device backed by a
//! rayon thread pool. Each launch runs its groups in parallel across CPU
//! cores, and each reduction runs on the pool asynchronously, so the caller
//! gets its handle back before any element is read.
//!
//! ## Design notes
//!
//! * **Drop-in**: Implements the core crate's `Device`, so the dispatch
//!   policy and the three strategies run unchanged.
//! * **Parallelism**: Groups of one pass are independent and run as a rayon
//!   parallel iterator; items within a group run in lockstep on one thread.
//! * **Pools**: Uses the global pool unless given a dedicated one.
//!
//! ## Key concepts
//!
//! * **Group = task**: One rayon task per cooperative group, writing only its
//!   own output slot.
//! * **Pass ordering**: Comes from the core crate's in-order queue; a launch
//!   returns only once every group has finished.
//!
//! ## Invariants
//!
//! * A launch never returns while one of its groups is still running.
//! * Capability limits are at least 1.
//!
//! ## Non-goals
//!
//! * This module does not choose strategies (handled by `hetreduce::policy`).
//! * This module does not validate inputs (handled by `validator`).

// External dependencies
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

// Export dependencies from hetreduce crate
use hetreduce::internals::device::{
    Capabilities, Device, check_work_group_size, fit_local_allocation,
};
use hetreduce::internals::primitives::errors::ReduceError;

/// Default maximum group size.
pub const DEFAULT_MAX_WORK_GROUP_SIZE: usize = 1024;

/// Default group-local memory, in bytes.
pub const DEFAULT_LOCAL_MEMORY_BYTES: usize = 64 * 1024;

// ============================================================================
// Rayon Device
// ============================================================================

/// Device running groups in parallel on a rayon pool.
#[derive(Clone)]
pub struct RayonDevice {
    pool: Option<Arc<ThreadPool>>,
    max_work_group_size: usize,
    local_memory_bytes: usize,
}

impl Debug for RayonDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonDevice")
            .field("threads", &self.num_threads())
            .field("max_work_group_size", &self.max_work_group_size)
            .field("local_memory_bytes", &self.local_memory_bytes)
            .finish()
    }
}

impl Default for RayonDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RayonDevice {
    /// Device on the global rayon pool with default limits.
    pub fn new() -> Self {
        Self {
            pool: None,
            max_work_group_size: DEFAULT_MAX_WORK_GROUP_SIZE,
            local_memory_bytes: DEFAULT_LOCAL_MEMORY_BYTES,
        }
    }

    /// Device on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, ReduceError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("hetreduce-{i}"))
            .build()
            .map_err(|e| ReduceError::DeviceFault(format!("thread pool: {e}")))?;

        Ok(Self {
            pool: Some(Arc::new(pool)),
            ..Self::new()
        })
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

    /// Number of worker threads available to this device.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Capabilities for RayonDevice {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn max_work_group_size(&self) -> usize {
        self.max_work_group_size
    }

    fn max_local_allocation_size(&self, bytes_per_item: usize, work_group_size: usize) -> usize {
        fit_local_allocation(self.local_memory_bytes, bytes_per_item, work_group_size)
    }
}

impl Device for RayonDevice {
    fn launch<S, K>(&self, groups: &mut [S], work_group_size: usize, kernel: &K) -> Result<(), ReduceError>
    where
        S: Send,
        K: Fn(usize, &mut S) -> Result<(), ReduceError> + Sync,
    {
        check_work_group_size(self, work_group_size)?;

        let mut run = || {
            groups
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(group, slot)| kernel(group, slot))
        };

        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

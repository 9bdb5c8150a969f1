//! In-order pass submission.
//!
//! ## Purpose
//!
//! A reduction submits its passes through a [`Queue`]. Every submission names
//! the events it depends on and yields an [`Event`] that completes when the
//! pass has finished, so pass `k + 1` never starts before pass `k`'s writes
//! are visible.
//!
//! ## Design notes
//!
//! * **Explicit dependencies**: `submit` waits on every dependency before the
//!   work runs; the queue is also in-order, so dependencies on earlier
//!   submissions are already complete and the wait returns immediately.
//! * **Waitable events**: Events wrap a manual-reset event and can be waited
//!   on from any thread.
//!
//! ## Non-goals
//!
//! * Cancellation. Submitted work always runs to completion.

// External dependencies
use futures_intrusive::sync::ManualResetEvent;
use log::trace;
use std::sync::Arc;

// Internal dependencies
use crate::device::Device;
use crate::primitives::errors::ReduceError;

// ============================================================================
// Event
// ============================================================================

/// Completion signal of one submitted unit of work.
#[derive(Clone)]
pub struct Event {
    inner: Arc<ManualResetEvent>,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::completed()
    }
}

impl Event {
    /// An event that is already complete (no prior work).
    pub fn completed() -> Self {
        Self {
            inner: Arc::new(ManualResetEvent::new(true)),
        }
    }

    fn pending() -> Self {
        Self {
            inner: Arc::new(ManualResetEvent::new(false)),
        }
    }

    fn complete(&self) {
        self.inner.set();
    }

    /// Whether the work has finished.
    pub fn is_complete(&self) -> bool {
        self.inner.is_set()
    }

    /// Block until the work has finished.
    pub fn wait(&self) {
        pollster::block_on(self.inner.wait());
    }
}

// ============================================================================
// Queue
// ============================================================================

/// In-order submission queue bound to one device.
#[derive(Debug)]
pub struct Queue<'d, D: Device> {
    device: &'d D,
    label: Option<&'static str>,
    submitted: usize,
}

impl<'d, D: Device> Queue<'d, D> {
    /// Create a queue on `device`. The label names the compiled unit in logs.
    pub fn new(device: &'d D, label: Option<&'static str>) -> Self {
        Self {
            device,
            label,
            submitted: 0,
        }
    }

    /// Device this queue submits to.
    pub fn device(&self) -> &'d D {
        self.device
    }

    /// Number of units submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Run `work` after every event in `depends_on` has completed.
    pub fn submit<F>(&mut self, depends_on: &[&Event], work: F) -> Result<Event, ReduceError>
    where
        F: FnOnce(&D) -> Result<(), ReduceError>,
    {
        for dep in depends_on {
            dep.wait();
        }

        let event = Event::pending();
        trace!(
            "{}: submit #{} on {}",
            self.label.unwrap_or("reduce"),
            self.submitted,
            self.device.name()
        );
        self.submitted += 1;

        work(self.device)?;
        event.complete();
        Ok(event)
    }
}

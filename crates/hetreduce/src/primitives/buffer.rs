//! Device scratch memory for reductions.
//!
//! ## Purpose
//!
//! This module provides the two pieces of device-resident storage a reduction
//! owns for its lifetime: the double-buffered intermediate area used by the
//! tree reducer, and the single-element result cell written by whichever
//! strategy produces the final value.
//!
//! ## Design notes
//!
//! * **Single allocation**: The intermediate area is one allocation of
//!   `2 * n_groups` slots split into two halves. Passes alternate which half
//!   is the source and which is the destination, so memory stays bounded by
//!   the first pass's group count rather than growing with the pass count.
//! * **Fallible**: Allocation uses `try_reserve_exact` and reports failure as
//!   [`ReduceError::AllocationFailed`] instead of aborting.
//! * **Write-once**: The result cell rejects a second write.
//!
//! ## Invariants
//!
//! * The source and destination halves never overlap.
//! * Later passes have no more groups than the first, so each fits in a half.
//! * The result cell holds at most one value.

// External dependencies
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

// Internal dependencies
use crate::primitives::errors::ReduceError;

// ============================================================================
// Intermediate Buffer
// ============================================================================

/// Double-buffered scratch area for multi-pass reductions.
#[derive(Debug)]
pub struct IntermediateBuffer<T> {
    slots: Vec<Option<T>>,
    half: usize,
    // Index (0 or 1) of the half written by the current pass.
    dst: usize,
}

impl<T> IntermediateBuffer<T> {
    /// Allocate a buffer with two halves of `n_groups` slots each.
    pub fn new(n_groups: usize) -> Result<Self, ReduceError> {
        let len = n_groups
            .checked_mul(2)
            .ok_or(ReduceError::AllocationFailed {
                what: "intermediate buffer",
                len: usize::MAX,
            })?;

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| ReduceError::AllocationFailed {
                what: "intermediate buffer",
                len,
            })?;
        slots.resize_with(len, || None);

        Ok(Self {
            slots,
            half: n_groups,
            dst: 0,
        })
    }

    /// Number of slots in each half.
    #[inline]
    pub fn half_len(&self) -> usize {
        self.half
    }

    /// Total number of slots (both halves).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Offset of the half the current pass reads from.
    #[inline]
    pub fn src_offset(&self) -> usize {
        (1 - self.dst) * self.half
    }

    /// Offset of the half the current pass writes to.
    #[inline]
    pub fn dst_offset(&self) -> usize {
        self.dst * self.half
    }

    /// Borrow the source half for reading and the destination half for writing.
    pub fn halves(&mut self) -> (&[Option<T>], &mut [Option<T>]) {
        let (lo, hi) = self.slots.split_at_mut(self.half);
        if self.dst == 0 {
            (hi, lo)
        } else {
            (lo, hi)
        }
    }

    /// Exchange the roles of the two halves.
    #[inline]
    pub fn swap(&mut self) {
        self.dst = 1 - self.dst;
    }
}

// ============================================================================
// Result Cell
// ============================================================================

/// Single-element location holding the final reduced value.
#[derive(Debug)]
pub struct ResultCell<T> {
    value: OnceLock<T>,
    writes: AtomicUsize,
}

impl<T> Default for ResultCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            writes: AtomicUsize::new(0),
        }
    }

    /// Store the final value. Fails if the cell was already written.
    pub fn write(&self, value: T) -> Result<(), ReduceError> {
        self.writes.fetch_add(1, Ordering::AcqRel);
        self.value
            .set(value)
            .map_err(|_| ReduceError::ResultAlreadyWritten)
    }

    /// Number of write attempts observed so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    /// Whether a value has been stored.
    pub fn is_written(&self) -> bool {
        self.value.get().is_some()
    }

    /// Read the stored value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Consume the cell and hand its value to the caller.
    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
}

//! Device-resident input ranges.
//!
//! ## Purpose
//!
//! This module provides the read-only views a reduction consumes. A
//! [`DeviceBuffer`] is a shared handle to an immutable sequence; the
//! [`InputRanges`] trait reads one or several of them in lock step so that an
//! n-ary transform can see the i-th element of every range at once.
//!
//! ## Design notes
//!
//! * **Shared ownership**: Buffers are reference counted, so asynchronous work
//!   keeps its inputs alive after the submitting call returns.
//! * **Read-only**: No API hands out mutable access to the elements.
//! * **Lock step**: Tuples of ranges yield tuples of elements.
//!
//! ## Invariants
//!
//! * The logical length of a tuple of ranges is the length of its first range.
//! * Element access is in bounds for every index below every range's length.

// External dependencies
use std::ops::Deref;
use std::sync::Arc;

// ============================================================================
// Device Buffer
// ============================================================================

/// Shared, immutable, device-resident sequence.
#[derive(Debug)]
pub struct DeviceBuffer<E> {
    data: Arc<[E]>,
}

impl<E> Clone for DeviceBuffer<E> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<E> DeviceBuffer<E> {
    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View the elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }
}

impl<E> Deref for DeviceBuffer<E> {
    type Target = [E];
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<E> From<Vec<E>> for DeviceBuffer<E> {
    fn from(v: Vec<E>) -> Self {
        Self { data: v.into() }
    }
}

impl<E: Clone> From<&[E]> for DeviceBuffer<E> {
    fn from(v: &[E]) -> Self {
        Self { data: v.into() }
    }
}

impl<E> From<Arc<[E]>> for DeviceBuffer<E> {
    fn from(data: Arc<[E]>) -> Self {
        Self { data }
    }
}

impl<E> FromIterator<E> for DeviceBuffer<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Input Ranges
// ============================================================================

/// One or more ranges read in lock step by a reduction.
pub trait InputRanges: Clone + Send + Sync + 'static {
    /// Element (or tuple of elements) seen by the transform.
    type Item;

    /// Logical length: the length of the first range.
    fn len(&self) -> usize;

    /// Lengths of every range, first range first.
    fn lengths(&self) -> Vec<usize>;

    /// Element at `idx` of every range.
    fn get(&self, idx: usize) -> Self::Item;

    /// Whether the first range is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone + Send + Sync + 'static> InputRanges for DeviceBuffer<E> {
    type Item = E;

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    fn lengths(&self) -> Vec<usize> {
        vec![self.data.len()]
    }

    #[inline]
    fn get(&self, idx: usize) -> E {
        self.data[idx].clone()
    }
}

impl<A: InputRanges, B: InputRanges> InputRanges for (A, B) {
    type Item = (A::Item, B::Item);

    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    fn lengths(&self) -> Vec<usize> {
        let mut out = self.0.lengths();
        out.extend(self.1.lengths());
        out
    }

    #[inline]
    fn get(&self, idx: usize) -> Self::Item {
        (self.0.get(idx), self.1.get(idx))
    }
}

impl<A: InputRanges, B: InputRanges, C: InputRanges> InputRanges for (A, B, C) {
    type Item = (A::Item, B::Item, C::Item);

    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    fn lengths(&self) -> Vec<usize> {
        let mut out = self.0.lengths();
        out.extend(self.1.lengths());
        out.extend(self.2.lengths());
        out
    }

    #[inline]
    fn get(&self, idx: usize) -> Self::Item {
        (self.0.get(idx), self.1.get(idx), self.2.get(idx))
    }
}

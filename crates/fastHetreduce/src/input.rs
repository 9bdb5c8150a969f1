//! Input abstractions for device reductions.
//!
//! ## Purpose
//!
//! This module lets the reduction entry points accept slices, vectors and
//! one-dimensional `ndarray` arrays through a single interface, and turns
//! them into the shared `DeviceBuffer` the engine reads from.
//!
//! ## Design notes
//!
//! * **One copy**: Host data is copied once into the device-resident buffer;
//!   an existing `DeviceBuffer` is shared without copying.
//! * **Fail-fast validation**: Non-contiguous arrays are rejected.
//!
//! ## Invariants
//!
//! * Returned slices represent all elements of the input container, in order.
//!
//! ## Non-goals
//!
//! * This module does not reshape or flatten multi-dimensional arrays.

// External dependencies
use ndarray::{ArrayBase, Data, Ix1};

// Export dependencies from hetreduce crate
use hetreduce::internals::primitives::errors::ReduceError;
use hetreduce::internals::primitives::range::DeviceBuffer;

/// Trait for types that can be used as input for a reduction.
pub trait ReduceInput<T: Clone> {
    /// View the input as a contiguous slice.
    fn as_reduce_slice(&self) -> Result<&[T], ReduceError>;

    /// Device-resident copy of the input.
    fn to_device_buffer(&self) -> Result<DeviceBuffer<T>, ReduceError> {
        self.as_reduce_slice().map(DeviceBuffer::from)
    }
}

impl<T: Clone> ReduceInput<T> for [T] {
    fn as_reduce_slice(&self) -> Result<&[T], ReduceError> {
        Ok(self)
    }
}

impl<T: Clone> ReduceInput<T> for Vec<T> {
    fn as_reduce_slice(&self) -> Result<&[T], ReduceError> {
        Ok(self.as_slice())
    }
}

impl<T: Clone> ReduceInput<T> for DeviceBuffer<T> {
    fn as_reduce_slice(&self) -> Result<&[T], ReduceError> {
        Ok(self.as_slice())
    }

    fn to_device_buffer(&self) -> Result<DeviceBuffer<T>, ReduceError> {
        Ok(self.clone())
    }
}

impl<T: Clone, S> ReduceInput<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn as_reduce_slice(&self) -> Result<&[T], ReduceError> {
        self.as_slice().ok_or_else(|| {
            ReduceError::InvalidInput("ndarray input must be contiguous in memory".to_string())
        })
    }
}

//! Fixed-capacity ring storage with lookup by recency offset.
//!
//! A [`CircularBuffer`] keeps the `capacity` most recently pushed values.
//! Once full, every push overwrites the oldest value.
//!
//! The buffer is **not** internally synchronized. `push` takes `&mut self`,
//! so sharing one buffer across threads requires the caller to wrap it in
//! a lock of their own (e.g. `parking_lot::Mutex<CircularBuffer<T>>`).

use miette::Diagnostic;
use ripple_configuration::buffer::{BufferConfiguration, OffsetPolicy};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum CircularBufferError {
    #[error("invalid circular buffer capacity: {capacity} (must be at least 1)")]
    InvalidCapacity { capacity: usize },

    #[error(
        "recency offset {offset} is out of range for a buffer of capacity {capacity}"
    )]
    #[diagnostic(help(
        "only the last `capacity` values are retained, use an offset below {capacity}"
    ))]
    OffsetOutOfRange { offset: usize, capacity: usize },
}

/// A fixed-capacity ring buffer.
///
/// The cursor is advanced **before** each write, so the first push after
/// construction lands in slot 1 (for capacity > 1) and slot 0 keeps its
/// default value until the cursor wraps around. Slots that were never
/// written read as `T::default()`.
#[derive(Clone, Debug)]
pub struct CircularBuffer<T> {
    data: Box<[T]>,

    /// Index of the most recently written slot. Always in `[0, capacity)`.
    cursor: usize,

    offset_policy: OffsetPolicy,
}

impl<T: Default> CircularBuffer<T> {
    /// Create a buffer with the given capacity that rejects
    /// out-of-range offsets (see [`OffsetPolicy::Fail`]).
    pub fn new(capacity: usize) -> Result<Self, CircularBufferError> {
        Self::with_offset_policy(capacity, OffsetPolicy::Fail)
    }

    pub fn with_offset_policy(
        capacity: usize,
        offset_policy: OffsetPolicy,
    ) -> Result<Self, CircularBufferError> {
        if capacity < 1 {
            return Err(CircularBufferError::InvalidCapacity { capacity });
        }

        let data = std::iter::repeat_with(T::default)
            .take(capacity)
            .collect::<Vec<T>>()
            .into_boxed_slice();

        Ok(Self {
            data,
            cursor: 0,
            offset_policy,
        })
    }

    /// Create a buffer using the configured default capacity and offset policy.
    pub fn from_configuration(
        configuration: &BufferConfiguration,
    ) -> Result<Self, CircularBufferError> {
        Self::with_offset_policy(
            configuration.default_capacity,
            configuration.offset_policy,
        )
    }
}

impl<T> CircularBuffer<T> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn offset_policy(&self) -> OffsetPolicy {
        self.offset_policy
    }

    /// Advance the cursor (wrapping past the last slot) and store `value` there,
    /// overwriting whatever the slot held.
    pub fn push(&mut self, value: T) {
        self.cursor = (self.cursor + 1) % self.capacity();
        self.data[self.cursor] = value;
    }

    /// Returns the value pushed `offset` steps before the most recent push:
    /// `0` is the newest value, `1` the one before it, and so on.
    ///
    /// An `offset` of at least `capacity` either fails with
    /// [`CircularBufferError::OffsetOutOfRange`] (`OffsetPolicy::Fail`)
    /// or is wrapped modulo the capacity (`OffsetPolicy::Wrap`), in which case
    /// the returned slot holds a newer value than the offset suggests.
    pub fn at(&self, offset: usize) -> Result<&T, CircularBufferError> {
        let capacity = self.capacity();

        if offset >= capacity && self.offset_policy == OffsetPolicy::Fail {
            return Err(CircularBufferError::OffsetOutOfRange {
                offset,
                capacity,
            });
        }

        let position = (self.cursor + capacity - offset % capacity) % capacity;
        Ok(&self.data[position])
    }
}

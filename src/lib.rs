//! Reusable concurrency primitives:
//!
//! - [`Observable`]: a thread-safe value cell that notifies its [`Observer`]s
//!   asynchronously whenever a new value is set,
//! - [`CircularBuffer`]: a fixed-capacity ring store with lookup by recency offset.
//!
//! The two are independent; a caller that wants both "current value" and
//! "recent history" typically observes an `Observable` and pushes every
//! notified value into a `CircularBuffer` behind a lock of its own.

pub use ripple_configuration as configuration;
pub use ripple_configuration::buffer::OffsetPolicy;

pub use circular_buffer::{CircularBuffer, CircularBufferError};
pub use dispatch::{
    dispatcher_from_configuration,
    Notification,
    NotificationDispatcher,
    SpawnPerNotification,
    WorkerPoolDispatcher,
};
pub use observable::{Observable, Observer, ObserverId};

pub mod circular_buffer;
pub mod dispatch;
pub mod logging;
pub mod observable;

//! Strategies for running observer notifications.
//!
//! [`Observable::set`](crate::Observable::set) never runs callbacks itself;
//! it wraps each one into a [`Notification`] and hands it to a
//! [`NotificationDispatcher`]. Two strategies are provided:
//! - [`SpawnPerNotification`] (the default) runs every notification on a new thread,
//! - [`WorkerPoolDispatcher`] queues notifications for a fixed number of worker threads.
//!
//! Neither applies back-pressure: dispatching never blocks and never fails.

mod spawn;
mod worker_pool;

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use miette::Result;
use ripple_configuration::dispatch::{
    DispatchConfiguration,
    DispatchStrategy,
};
use tracing::error;

use crate::observable::ObserverId;

pub use spawn::SpawnPerNotification;
pub use worker_pool::WorkerPoolDispatcher;

pub type NotificationTask = Box<dyn FnOnce() + Send + 'static>;

/// A single pending callback invocation for one observer.
pub struct Notification {
    observer_id: ObserverId,

    task: NotificationTask,
}

impl Notification {
    pub fn new<F>(observer_id: ObserverId, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            observer_id,
            task: Box::new(task),
        }
    }

    pub fn observer_id(&self) -> ObserverId {
        self.observer_id
    }

    /// Run the callback. A panic is caught and logged so it cannot unwind
    /// into the dispatcher's thread.
    ///
    /// Returns `false` if the callback panicked.
    pub fn run(self) -> bool {
        let observer_id = self.observer_id;

        match panic::catch_unwind(AssertUnwindSafe(self.task)) {
            Ok(()) => true,
            Err(payload) => {
                error!(
                    %observer_id,
                    "Observer callback panicked: {}",
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

impl Debug for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("observer_id", &self.observer_id)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

pub trait NotificationDispatcher: Send + Sync {
    /// Schedule `notification` to run. Must return without waiting for it.
    fn dispatch(&self, notification: Notification);
}

/// Build the dispatcher selected by the configuration.
pub fn dispatcher_from_configuration(
    configuration: &DispatchConfiguration,
) -> Result<Arc<dyn NotificationDispatcher>> {
    match configuration.strategy {
        DispatchStrategy::SpawnPerNotification => {
            Ok(Arc::new(SpawnPerNotification))
        }
        DispatchStrategy::WorkerPool => Ok(Arc::new(
            WorkerPoolDispatcher::new(configuration.worker_threads)?,
        )),
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn run_reports_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let notification = Notification::new(ObserverId::next(), move || {
            ran_clone.store(true, Ordering::SeqCst);
        });

        assert!(notification.run());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn run_contains_panics() {
        let notification =
            Notification::new(ObserverId::next(), || panic!("callback failure"));

        assert!(!notification.run());
    }

    #[test]
    fn panic_messages_are_extracted() {
        let static_payload: Box<dyn Any + Send> = Box::new("static");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other_payload: Box<dyn Any + Send> = Box::new(5u8);

        assert_eq!(panic_message(static_payload.as_ref()), "static");
        assert_eq!(panic_message(owned_payload.as_ref()), "owned");
        assert_eq!(
            panic_message(other_payload.as_ref()),
            "<non-string panic payload>"
        );
    }

    #[test]
    fn configuration_selects_the_strategy() {
        let spawn = dispatcher_from_configuration(&DispatchConfiguration {
            strategy: DispatchStrategy::SpawnPerNotification,
            worker_threads: 1,
        });
        assert!(spawn.is_ok());

        let pool = dispatcher_from_configuration(&DispatchConfiguration {
            strategy: DispatchStrategy::WorkerPool,
            worker_threads: 2,
        });
        assert!(pool.is_ok());

        let empty_pool = dispatcher_from_configuration(&DispatchConfiguration {
            strategy: DispatchStrategy::WorkerPool,
            worker_threads: 0,
        });
        assert!(empty_pool.is_err());
    }
}

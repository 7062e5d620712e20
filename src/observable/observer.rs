use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use tracing::debug;

use super::{Callback, ObservableShared, ObserverId};

/// A live subscription to an [`Observable`](super::Observable).
///
/// Only [`Observer::close`] unsubscribes; the `Observer` merely knows where
/// to deregister itself and does not keep the observable alive.
pub struct Observer<T> {
    id: ObserverId,

    callback: Callback<T>,

    owner: Weak<ObservableShared<T>>,

    closed: AtomicBool,
}

impl<T> Observer<T> {
    pub(super) fn new(
        id: ObserverId,
        callback: Callback<T>,
        owner: Weak<ObservableShared<T>>,
    ) -> Self {
        Self {
            id,
            callback,
            owner,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Invoke the callback synchronously on the calling thread.
    pub fn notify(&self, value: T) {
        (self.callback)(value)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Deregister from the owning observable so future `set` calls no longer
    /// notify this observer.
    ///
    /// Notifications that were already dispatched are not cancelled and may
    /// still complete after this returns. Closing an already closed observer,
    /// or one whose observable has been dropped, does nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(owner) = self.owner.upgrade() {
            if owner.remove_observer(self.id) {
                debug!(observer_id = %self.id, "Observer closed.");
            }
        }
    }
}

impl<T> Debug for Observer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

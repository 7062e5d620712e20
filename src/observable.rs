//! Observable values with asynchronous change notification.
//!
//! [`Observable<T>`] is a thread-safe value cell. Each call to
//! [`Observable::set`] stores the new value and then hands one notification
//! per registered [`Observer`] to a [`NotificationDispatcher`], without waiting
//! for any of them to run.
//!
//! # Concurrency
//!
//! The value and the observer registrations share a single
//! `parking_lot::RwLock`. `set` replaces the value under the write lock,
//! releases it, and only then snapshots the observers under the read lock.
//! In between, `value()` may already return the new value while its
//! notifications have not been dispatched yet, and an observer registered
//! in that window may or may not receive them.
//!
//! Notifications are fire-and-forget: there is no ordering among observers,
//! and a notification that was already dispatched still runs even if its
//! observer is closed right afterwards.

mod observer;

use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::dispatch::{
    Notification,
    NotificationDispatcher,
    SpawnPerNotification,
};

pub use observer::Observer;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Observer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for ObserverId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


struct ObservableState<T> {
    value: T,

    observers: HashMap<ObserverId, Callback<T>>,
}

struct ObservableShared<T> {
    state: RwLock<ObservableState<T>>,

    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl<T> ObservableShared<T> {
    /// Removing an id that is no longer registered is a no-op.
    fn remove_observer(&self, observer_id: ObserverId) -> bool {
        self.state.write().observers.remove(&observer_id).is_some()
    }
}

/// A shared value that notifies its observers whenever it is set.
///
/// Cloning an `Observable` creates another handle to the **same** value
/// and observer set. The shared state is dropped together with the last
/// handle; observers only keep a weak reference to it.
pub struct Observable<T> {
    shared: Arc<ObservableShared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Debug> Debug for Observable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("observer_count", &state.observers.len())
            .finish()
    }
}

impl<T> Observable<T>
where
    T: Clone + Send + 'static,
{
    /// Create an observable with no observers that runs each notification
    /// on its own thread (see [`SpawnPerNotification`]).
    pub fn new(value: T) -> Self {
        Self::with_dispatcher(value, Arc::new(SpawnPerNotification))
    }

    pub fn with_dispatcher(
        value: T,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            shared: Arc::new(ObservableShared {
                state: RwLock::new(ObservableState {
                    value,
                    observers: HashMap::new(),
                }),
                dispatcher,
            }),
        }
    }

    /// Replace the current value, then dispatch one notification carrying
    /// the new value to every currently registered observer.
    ///
    /// Returns as soon as the notifications are handed to the dispatcher.
    pub fn set(&self, value: T) {
        self.shared.state.write().value = value.clone();

        let callbacks: Vec<(ObserverId, Callback<T>)> = {
            let state = self.shared.state.read();
            state
                .observers
                .iter()
                .map(|(observer_id, callback)| {
                    (*observer_id, Arc::clone(callback))
                })
                .collect()
        };

        trace!(notifications = callbacks.len(), "Observable value was set.");

        for (observer_id, callback) in callbacks {
            let value = value.clone();
            self.shared.dispatcher.dispatch(Notification::new(
                observer_id,
                move || callback(value),
            ));
        }
    }

    /// Returns a clone of the current value.
    pub fn value(&self) -> T {
        self.shared.state.read().value.clone()
    }

    /// Register `callback` to be invoked with every value passed to
    /// subsequent [`set`](Self::set) calls. The current value is not replayed.
    ///
    /// The registration lasts until [`Observer::close`] is called;
    /// dropping the returned `Observer` does not unsubscribe.
    pub fn observe<F>(&self, callback: F) -> Observer<T>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let observer_id = ObserverId::next();

        self.shared
            .state
            .write()
            .observers
            .insert(observer_id, Arc::clone(&callback));

        debug!(%observer_id, "Observer registered.");

        Observer::new(observer_id, callback, Arc::downgrade(&self.shared))
    }

    pub fn observer_count(&self) -> usize {
        self.shared.state.read().observers.len()
    }
}

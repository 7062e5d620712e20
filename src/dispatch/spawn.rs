use std::thread;

use tracing::error;

use super::{Notification, NotificationDispatcher};

/// Runs every notification on its own, detached thread.
///
/// There is no limit on the number of threads in flight; an observable with
/// many observers and frequent updates may prefer
/// [`WorkerPoolDispatcher`](super::WorkerPoolDispatcher).
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnPerNotification;

impl NotificationDispatcher for SpawnPerNotification {
    fn dispatch(&self, notification: Notification) {
        let observer_id = notification.observer_id();

        let spawn_result = thread::Builder::new()
            .name(format!("ripple-notify-{}", observer_id.as_u64()))
            .spawn(move || {
                notification.run();
            });

        if let Err(error) = spawn_result {
            error!(
                %observer_id,
                "Could not spawn notification thread, notification dropped: {error}"
            );
        }
    }
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use miette::{miette, Context, IntoDiagnostic, Result};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::{Notification, NotificationDispatcher};

// How often an idle worker re-checks the cancellation flag.
const WORKER_IDLE_TICK_DURATION: Duration = Duration::from_millis(50);

/// Runs notifications on a fixed number of worker threads.
///
/// Notifications are queued on an unbounded channel, so `dispatch` never
/// blocks; the pool only bounds how many callbacks run at the same time.
///
/// Dropping the pool closes the queue: workers finish what is already
/// queued and then exit on their own. Use [`join`](Self::join) to wait for
/// that, or [`cancel`](Self::cancel) to discard notifications that no
/// worker has picked up yet.
pub struct WorkerPoolDispatcher {
    worker_threads: usize,

    /// When `true`, workers stop picking up queued notifications and exit.
    cancellation_flag: Arc<AtomicBool>,

    /// Number of notifications whose callback panicked.
    panicked_notifications: Arc<AtomicUsize>,

    /// `None` once the pool has been joined.
    notification_sender: Mutex<Option<Sender<Notification>>>,

    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPoolDispatcher {
    /// Start a pool with `worker_threads` workers (at least one).
    pub fn new(worker_threads: usize) -> Result<Self> {
        if worker_threads == 0 {
            return Err(miette!(
                "A notification worker pool needs at least one worker thread."
            ));
        }

        let (notification_sender, notification_receiver) =
            channel::unbounded::<Notification>();
        let cancellation_flag = Arc::new(AtomicBool::new(false));
        let panicked_notifications = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(worker_threads);
        for worker_index in 0..worker_threads {
            let receiver = notification_receiver.clone();
            let cancellation_flag = cancellation_flag.clone();
            let panicked_notifications = panicked_notifications.clone();

            let worker_handle = thread::Builder::new()
                .name(format!("ripple-worker-{worker_index}"))
                .spawn(move || {
                    run_worker(
                        worker_index,
                        receiver,
                        cancellation_flag,
                        panicked_notifications,
                    )
                })
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!("Could not spawn notification worker {worker_index}.")
                })?;

            workers.push(worker_handle);
        }

        debug!(worker_threads, "Notification worker pool started.");

        Ok(Self {
            worker_threads,
            cancellation_flag,
            panicked_notifications,
            notification_sender: Mutex::new(Some(notification_sender)),
            workers: Mutex::new(workers),
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Ask the workers to exit as soon as their current callback returns.
    /// Notifications still waiting in the queue are discarded.
    pub fn cancel(&self) {
        self.cancellation_flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_flag.load(Ordering::Acquire)
    }

    /// How many notifications run by this pool ended in a panic.
    pub fn panicked_notifications(&self) -> usize {
        self.panicked_notifications.load(Ordering::Acquire)
    }

    /// Close the queue and wait for every worker to exit.
    ///
    /// Without a prior [`cancel`](Self::cancel), every notification dispatched
    /// before this call is run first. Notifications dispatched afterwards are
    /// dropped with a warning. Concurrent callers all return only once the
    /// workers have exited.
    pub fn join(&self) -> Result<()> {
        drop(self.notification_sender.lock().take());

        // Held until every worker is joined, so a second caller waits too.
        let mut workers = self.workers.lock();

        let abnormal_exits = workers
            .drain(..)
            .map(|worker| worker.join())
            .filter(|join_result| join_result.is_err())
            .count();

        let panicked_notifications = self.panicked_notifications();
        if panicked_notifications > 0 {
            warn!(
                panicked_notifications,
                "Notification worker pool stopped, some callbacks panicked."
            );
        } else {
            debug!("Notification worker pool stopped.");
        }

        if abnormal_exits > 0 {
            return Err(miette!(
                "{abnormal_exits} notification worker(s) exited abnormally."
            ));
        }

        Ok(())
    }
}

impl NotificationDispatcher for WorkerPoolDispatcher {
    fn dispatch(&self, notification: Notification) {
        let observer_id = notification.observer_id();

        if self.is_cancelled() {
            warn!(%observer_id, "Worker pool is cancelled, notification dropped.");
            return;
        }

        let sender_guard = self.notification_sender.lock();
        let Some(sender) = sender_guard.as_ref() else {
            warn!(%observer_id, "Worker pool is joined, notification dropped.");
            return;
        };

        if sender.send(notification).is_err() {
            warn!(%observer_id, "All workers have exited, notification dropped.");
        }
    }
}

impl Drop for WorkerPoolDispatcher {
    fn drop(&mut self) {
        // Closing the queue lets the (detached) workers drain it and exit.
        self.notification_sender.get_mut().take();
    }
}

fn run_worker(
    worker_index: usize,
    receiver: Receiver<Notification>,
    cancellation_flag: Arc<AtomicBool>,
    panicked_notifications: Arc<AtomicUsize>,
) {
    loop {
        if cancellation_flag.load(Ordering::Acquire) {
            break;
        }

        match receiver.recv_timeout(WORKER_IDLE_TICK_DURATION) {
            Ok(notification) => {
                if cancellation_flag.load(Ordering::Acquire) {
                    break;
                }

                if !notification.run() {
                    panicked_notifications.fetch_add(1, Ordering::AcqRel);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    trace!(worker_index, "Notification worker has stopped.");
}


#[cfg(test)]
mod tests {
    use crossbeam::channel::unbounded;

    use super::*;
    use crate::{Observable, ObserverId};

    const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn zero_workers_are_rejected() {
        assert!(WorkerPoolDispatcher::new(0).is_err());
    }

    #[test]
    fn every_observer_is_notified_with_fewer_workers_than_observers() {
        let pool = Arc::new(WorkerPoolDispatcher::new(2).unwrap());
        let observable = Observable::with_dispatcher(0, pool.clone());
        let (sender, receiver) = unbounded();

        let observers: Vec<_> = (0..10)
            .map(|_| {
                let sender = sender.clone();
                observable.observe(move |value| {
                    let _ = sender.send(value);
                })
            })
            .collect();

        observable.set(21);

        for _ in &observers {
            assert_eq!(receiver.recv_timeout(DELIVERY_TIMEOUT), Ok(21));
        }

        pool.join().unwrap();
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn join_drains_the_queue() {
        let pool = WorkerPoolDispatcher::new(1).unwrap();
        let observer_id = ObserverId::next();
        let executed = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let executed = executed.clone();
            pool.dispatch(Notification::new(observer_id, move || {
                executed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        pool.join().unwrap();
        assert_eq!(executed.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn concurrent_joins_both_wait_for_the_queue() {
        let pool = Arc::new(WorkerPoolDispatcher::new(1).unwrap());
        let observer_id = ObserverId::next();
        let executed = Arc::new(AtomicUsize::new(0));
        let (started_sender, started_receiver) = unbounded::<()>();

        for _ in 0..5 {
            let executed = executed.clone();
            let started_sender = started_sender.clone();
            pool.dispatch(Notification::new(observer_id, move || {
                let _ = started_sender.send(());
                thread::sleep(Duration::from_millis(50));
                executed.fetch_add(1, Ordering::SeqCst);
            }));
        }
        started_receiver.recv_timeout(DELIVERY_TIMEOUT).unwrap();

        let first_pool = pool.clone();
        let first_join = thread::spawn(move || first_pool.join());
        thread::sleep(Duration::from_millis(20));

        pool.join().unwrap();
        assert_eq!(executed.load(Ordering::SeqCst), 5);

        first_join.join().unwrap().unwrap();
    }

    #[test]
    fn dispatch_after_join_is_dropped() {
        let pool = WorkerPoolDispatcher::new(1).unwrap();
        let executed = Arc::new(AtomicBool::new(false));

        pool.join().unwrap();

        let executed_clone = executed.clone();
        pool.dispatch(Notification::new(ObserverId::next(), move || {
            executed_clone.store(true, Ordering::SeqCst);
        }));

        assert!(!executed.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_discards_queued_notifications() {
        let pool = WorkerPoolDispatcher::new(1).unwrap();
        let observer_id = ObserverId::next();

        let (started_sender, started_receiver) = unbounded::<()>();
        let (release_sender, release_receiver) = unbounded::<()>();
        let executed = Arc::new(AtomicUsize::new(0));

        // Occupy the only worker until released.
        pool.dispatch(Notification::new(observer_id, move || {
            let _ = started_sender.send(());
            let _ = release_receiver.recv();
        }));
        started_receiver.recv_timeout(DELIVERY_TIMEOUT).unwrap();

        for _ in 0..5 {
            let executed = executed.clone();
            pool.dispatch(Notification::new(observer_id, move || {
                executed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        pool.cancel();
        assert!(pool.is_cancelled());
        drop(release_sender);

        pool.join().unwrap();
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_callback_keeps_the_worker_alive() {
        let pool = Arc::new(WorkerPoolDispatcher::new(1).unwrap());
        let observable = Observable::with_dispatcher(0, pool.clone());
        let _panicking = observable.observe(|_| panic!("observer failure"));
        let (sender, receiver) = unbounded();
        let _healthy = observable.observe(move |value| {
            let _ = sender.send(value);
        });

        observable.set(1);
        observable.set(2);

        let mut received = vec![
            receiver.recv_timeout(DELIVERY_TIMEOUT).unwrap(),
            receiver.recv_timeout(DELIVERY_TIMEOUT).unwrap(),
        ];
        received.sort_unstable();
        assert_eq!(received, vec![1, 2]);

        pool.join().unwrap();
        assert_eq!(pool.panicked_notifications(), 2);
    }
}

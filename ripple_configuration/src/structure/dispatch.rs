use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::traits::ResolvableConfiguration;

pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Strategy used to run observer notifications.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchStrategy {
    /// Every notification gets its own thread.
    #[default]
    SpawnPerNotification,

    /// Notifications are queued and consumed by a fixed number of worker threads.
    WorkerPool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchConfiguration {
    pub strategy: DispatchStrategy,

    /// Number of worker threads when `strategy` is `WorkerPool`. Always at least 1.
    pub worker_threads: usize,
}

impl Default for DispatchConfiguration {
    fn default() -> Self {
        Self {
            strategy: DispatchStrategy::default(),
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub(crate) struct UnresolvedDispatchConfiguration {
    strategy: Option<DispatchStrategy>,

    worker_threads: Option<usize>,
}

impl ResolvableConfiguration for UnresolvedDispatchConfiguration {
    type Resolved = DispatchConfiguration;

    fn resolve(self) -> miette::Result<Self::Resolved> {
        let worker_threads =
            self.worker_threads.unwrap_or(DEFAULT_WORKER_THREADS);

        if worker_threads < 1 {
            return Err(ConfigurationError::InvalidValue {
                key: "dispatch.worker_threads",
                reason: "the worker pool needs at least one thread".to_string(),
            }
            .into());
        }

        Ok(DispatchConfiguration {
            strategy: self.strategy.unwrap_or_default(),
            worker_threads,
        })
    }
}

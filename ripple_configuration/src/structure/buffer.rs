use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::traits::ResolvableConfiguration;

pub const DEFAULT_BUFFER_CAPACITY: usize = 16;

/// How a circular buffer treats a recency offset that is
/// at least as large as its capacity.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OffsetPolicy {
    /// Reject the read with an out-of-range error.
    #[default]
    Fail,

    /// Wrap the offset modulo the capacity and return whatever slot that lands on.
    Wrap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfiguration {
    /// Capacity used when a buffer is created from configuration. Always at least 1.
    pub default_capacity: usize,

    pub offset_policy: OffsetPolicy,
}

impl Default for BufferConfiguration {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_BUFFER_CAPACITY,
            offset_policy: OffsetPolicy::default(),
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub(crate) struct UnresolvedBufferConfiguration {
    default_capacity: Option<usize>,

    offset_policy: Option<OffsetPolicy>,
}

impl ResolvableConfiguration for UnresolvedBufferConfiguration {
    type Resolved = BufferConfiguration;

    fn resolve(self) -> miette::Result<Self::Resolved> {
        let default_capacity =
            self.default_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);

        if default_capacity < 1 {
            return Err(ConfigurationError::InvalidValue {
                key: "buffer.default_capacity",
                reason: "capacity must be at least 1".to_string(),
            }
            .into());
        }

        Ok(BufferConfiguration {
            default_capacity,
            offset_policy: self.offset_policy.unwrap_or_default(),
        })
    }
}

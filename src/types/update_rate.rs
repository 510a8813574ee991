//! Rate control for delivery and consumer subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How queued frames are handed to the consumer on each flush tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Every queued frame, oldest first
    #[default]
    All,

    /// Only the newest queued frame; older ones are discarded
    Latest,
}

/// Update rate for decoded frame subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every frame as it is delivered
    Native,

    /// At most this many frames per second, newest wins.
    /// `Max(0)` is treated as `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Normalize degenerate rates
    pub fn normalize(self) -> Self {
        match self {
            UpdateRate::Max(0) => UpdateRate::Native,
            other => other,
        }
    }

    /// Check if throttling is needed
    pub fn needs_throttle(self) -> bool {
        self.throttle_interval().is_some()
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<Duration> {
        match self.normalize() {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

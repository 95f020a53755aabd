//! Facade configuration.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a [`VolumeList`](crate::VolumeList).
///
/// Every field has a default, so a partial JSON document deserialises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeListConfig {
    /// Restrict the list to removable (USB-style) devices.
    pub removable_only: bool,
    /// Register for hardware arrival/removal notifications.
    pub watch_hardware: bool,
    /// Poll period for backends without native notifications.
    pub poll_interval_ms: u64,
}

impl Default for VolumeListConfig {
    fn default() -> Self {
        Self {
            removable_only: true,
            watch_hardware: true,
            poll_interval_ms: 500,
        }
    }
}

impl VolumeListConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

//! Messages posted from background contexts (OS notification threads,
//! the eject worker) to the context that owns the [`VolumeList`].
//!
//! [`VolumeList`]: crate::VolumeList
use crate::error::EjectResult;

/// A unit of work for the owning context.
#[derive(Debug)]
pub enum Event {
    /// Hardware changed; re-run enumeration and correlation.
    RefreshRequested,
    /// The eject worker finished.
    EjectFinished(EjectResult),
}

/// Kind of hardware notification delivered by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    /// A volume interface appeared.
    InterfaceArrival,
    /// A volume interface disappeared.
    InterfaceRemoval,
    /// Any other notification (query-remove, custom events, ...).
    Other,
}

impl HardwareEvent {
    /// Whether this event should trigger a refresh.
    pub fn is_topology_change(self) -> bool {
        matches!(self, Self::InterfaceArrival | Self::InterfaceRemoval)
    }
}

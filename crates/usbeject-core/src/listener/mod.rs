//! Change listener: turns OS hardware notifications into coalesced
//! refresh requests for the owning context.
//!
//! Notifications arrive on threads we do not control. The callback never
//! runs correlation itself: it raises a [`RefreshSignal`], which enqueues at
//! most one [`Event::RefreshRequested`] until the owner picks it up.
//!
//! ```text
//! Unregistered ──start()──► Idle ──arrival/removal──► RefreshPending
//!                            ▲                              │
//!                            └──── owner runs refresh ◄─────┘
//! ```
pub mod signal;

pub use signal::{EventSink, RefreshSignal};

use crate::error::PlatformError;
use crate::platform::Backend;
use tracing::{debug, info, warn};

/// A live notification registration. Dropping it unregisters.
pub trait Watch: Send {
    /// Unregister from the notification source. Idempotent. After this
    /// returns no further callback runs.
    fn stop(&mut self);
}

/// Observable listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unregistered,
    Idle,
    RefreshPending,
}

/// Owns the backend registration and the signal it feeds.
pub struct ChangeListener {
    signal: RefreshSignal,
    sink: Option<EventSink>,
    watch: Option<Box<dyn Watch>>,
}

impl ChangeListener {
    pub fn new(signal: RefreshSignal) -> Self {
        Self {
            signal,
            sink: None,
            watch: None,
        }
    }

    /// Register with the backend's notification source.
    ///
    /// On failure the listener stays `Unregistered`; the list still works
    /// through explicit refreshes.
    pub fn start(&mut self, backend: &dyn Backend) -> Result<(), PlatformError> {
        if self.watch.is_some() {
            return Ok(());
        }
        let sink = EventSink::new(self.signal.clone());
        match backend.watch(sink.clone()) {
            Ok(watch) => {
                info!("Listening for {} volume changes", backend.name());
                self.sink = Some(sink);
                self.watch = Some(watch);
                Ok(())
            }
            Err(e) => {
                sink.close();
                warn!("Hardware notifications unavailable: {}", e);
                Err(e)
            }
        }
    }

    /// Unregister. The sink goes inert first so a callback racing with
    /// teardown cannot enqueue anything.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.close();
        }
        if let Some(mut watch) = self.watch.take() {
            watch.stop();
            debug!("Change listener unregistered");
        }
    }

    pub fn state(&self) -> ListenerState {
        if self.watch.is_none() {
            ListenerState::Unregistered
        } else if self.signal.is_pending() {
            ListenerState::RefreshPending
        } else {
            ListenerState::Idle
        }
    }

    pub fn signal(&self) -> &RefreshSignal {
        &self.signal
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.stop();
    }
}

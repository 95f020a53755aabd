//! Coalescing refresh signal and the sink handed to backends.
use crate::events::{Event, HardwareEvent};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Enqueues at most one pending refresh on the owner's event channel.
#[derive(Clone)]
pub struct RefreshSignal {
    pending: Arc<AtomicBool>,
    tx: Sender<Event>,
}

impl RefreshSignal {
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Request a refresh. Returns `true` if this call enqueued it, `false`
    /// if one was already pending.
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        if self.tx.send(Event::RefreshRequested).is_err() {
            // Owner is gone.
            self.pending.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Called by the owner right before it refreshes, so events arriving
    /// during the refresh schedule another one.
    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// What a backend's notification callback calls into.
///
/// Cheap to clone and `Send + Sync`. Ignores everything but interface
/// arrival/removal, and ignores everything once closed.
#[derive(Clone)]
pub struct EventSink {
    signal: RefreshSignal,
    open: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(signal: RefreshSignal) -> Self {
        Self {
            signal,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Forward a hardware notification. Never blocks.
    pub fn notify(&self, event: HardwareEvent) {
        if !event.is_topology_change() || !self.is_open() {
            return;
        }
        self.signal.raise();
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

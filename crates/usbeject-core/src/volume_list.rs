//! The volume list facade.
//!
//! Owns the current [`Snapshot`], the change listener and the ejector.
//! All reads and snapshot swaps happen on the owning context; background
//! threads only ever post [`Event`]s, which the owner drains with
//! [`VolumeList::process_events`] or [`VolumeList::wait_events`].
//!
//! ```no_run
//! use usbeject_core::VolumeList;
//!
//! let mut list = VolumeList::new();
//! for volume in list.snapshot().iter() {
//!     println!("{}", volume.friendly_display_name);
//! }
//! ```
use crate::config::VolumeListConfig;
use crate::enumerate::populate;
use crate::error::{EjectError, EjectResult};
use crate::events::Event;
use crate::listener::{ChangeListener, ListenerState, RefreshSignal};
use crate::model::{DeviceKey, Snapshot, Volume};
use crate::platform::{self, Backend};
use crate::eject::{Ejector, VetoType};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct VolumeList {
    // Declared first so it is torn down before anything else.
    listener: ChangeListener,
    backend: Arc<dyn Backend>,
    config: VolumeListConfig,
    snapshot: Snapshot,
    ejector: Ejector,
    events: Receiver<Event>,
    observers: Vec<Box<dyn FnMut()>>,
    subscribers: Vec<Sender<()>>,
    refresh_count: u64,
}

impl VolumeList {
    /// A list over the native platform backend with default settings.
    pub fn new() -> Self {
        Self::with_config(VolumeListConfig::default())
    }

    pub fn with_config(config: VolumeListConfig) -> Self {
        let backend = platform::native(&config);
        Self::with_backend(backend, config)
    }

    /// Build over `backend`. Enumerates immediately and, if
    /// `config.watch_hardware` is set, registers for hardware changes.
    pub fn with_backend(backend: Arc<dyn Backend>, config: VolumeListConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut listener = ChangeListener::new(RefreshSignal::new(tx.clone()));
        let ejector = Ejector::new(Arc::clone(&backend), tx);

        let volumes = populate(backend.as_ref(), config.removable_only);
        info!(
            "Volume list ready on {} backend: {} volume(s)",
            backend.name(),
            volumes.len()
        );

        if config.watch_hardware {
            if let Err(e) = listener.start(backend.as_ref()) {
                debug!("Falling back to explicit refreshes: {}", e);
            }
        }

        Self {
            listener,
            backend,
            config,
            snapshot: volumes.into(),
            ejector,
            events: rx,
            observers: Vec::new(),
            subscribers: Vec::new(),
            refresh_count: 0,
        }
    }

    /// Re-run enumeration and correlation, swap in the new snapshot and
    /// notify observers once.
    pub fn refresh(&mut self) {
        let started = Instant::now();
        let volumes = populate(self.backend.as_ref(), self.config.removable_only);
        self.snapshot = volumes.into();
        self.refresh_count += 1;
        info!(
            "Refreshed volume list: {} volume(s) in {:.1?}",
            self.snapshot.len(),
            started.elapsed()
        );
        self.notify_change();
    }

    /// The current snapshot. Cheap to clone; never changes once returned.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot)
    }

    /// Borrowed view of the current snapshot.
    pub fn volumes(&self) -> &[Volume] {
        &self.snapshot
    }

    /// Eject the container identified by `key`.
    ///
    /// `callback` runs exactly once: immediately when another eject is in
    /// flight, otherwise from a later `process_events` / `wait_events`
    /// call on this list.
    pub fn eject_whole_device(&mut self, key: DeviceKey, callback: impl FnOnce(EjectResult) + 'static) {
        self.ejector.start(key, Box::new(callback));
    }

    /// Eject the container of the volume at `index` in the current
    /// snapshot. An out-of-range index fails immediately with
    /// [`EjectError::InvalidIndex`] without touching hardware.
    pub fn eject_whole_device_at_index(
        &mut self,
        index: usize,
        callback: impl FnOnce(EjectResult) + 'static,
    ) {
        let Some(volume) = self.snapshot.get(index) else {
            debug!("Eject index {} out of range ({} volumes)", index, self.snapshot.len());
            callback(Err(EjectError::InvalidIndex {
                index,
                len: self.snapshot.len(),
            }));
            return;
        };
        let key = volume.device_instance.clone();
        self.eject_whole_device(key, callback);
    }

    pub fn is_ejecting(&self) -> bool {
        self.ejector.is_ejecting()
    }

    /// Register an observer called after every refresh. Observers re-read
    /// the snapshot; nothing is passed to them.
    pub fn on_change(&mut self, observer: impl FnMut() + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// A channel that receives `()` after every refresh.
    ///
    /// Dropped receivers are pruned on the next refresh.
    pub fn subscribe(&mut self) -> Receiver<()> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Handle every queued event without blocking. Returns the number
    /// handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for the first event, then handle it and
    /// everything queued behind it. Returns the number handled.
    pub fn wait_events(&mut self, timeout: Duration) -> usize {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(event);
                1 + self.process_events()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }

    /// Refreshes run since construction, not counting the initial
    /// enumeration.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn config(&self) -> &VolumeListConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::RefreshRequested => {
                // Clear first so changes during the refresh schedule another.
                self.listener.signal().acknowledge();
                self.refresh();
            }
            Event::EjectFinished(outcome) => self.ejector.finish(outcome),
        }
    }

    fn notify_change(&mut self) {
        for observer in &mut self.observers {
            observer();
        }
        self.subscribers.retain(|tx| tx.send(()).is_ok());
    }
}

impl Default for VolumeList {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VolumeList {
    /// Stops the listener, then waits out an in-flight eject so its
    /// callback still runs exactly once.
    fn drop(&mut self) {
        self.listener.stop();
        if !self.ejector.is_ejecting() {
            return;
        }
        debug!("Waiting for the in-flight eject before teardown");
        self.ejector.join_worker();
        while let Ok(event) = self.events.try_recv() {
            if let Event::EjectFinished(outcome) = event {
                self.ejector.finish(outcome);
            }
        }
        if self.ejector.is_ejecting() {
            // The worker died without posting.
            self.ejector.finish(Err(EjectError::Refused {
                reason: VetoType::Unknown,
                vetoing_device: None,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiskEntry, DriveEntry, VolumeEntry};
    use crate::platform::memory::MemoryBackend;

    fn backend_with_stick() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_disk(DiskEntry {
            container: DeviceKey::DevInst(7),
            disk_id: "USBSTOR\\DISK&VEN_TEST\\1".into(),
            friendly_name: "Test USB Device".into(),
            volume_ids: vec!["V1".into()],
        });
        backend.add_volume(VolumeEntry::new("V1", "\\Device\\HarddiskVolume9"));
        backend.add_drive(DriveEntry::lettered('E', "\\Device\\HarddiskVolume9", "STICK", "exFAT"));
        backend
    }

    #[test]
    fn construction_enumerates_without_refresh() {
        let backend = backend_with_stick();
        let list = VolumeList::with_backend(backend.clone(), VolumeListConfig::default());
        assert_eq!(list.volumes().len(), 1);
        assert_eq!(list.refresh_count(), 0);
        assert_eq!(backend.enumeration_count(), 1);
        assert_eq!(list.listener_state(), ListenerState::Idle);
    }

    #[test]
    fn watch_disabled_leaves_listener_unregistered() {
        let backend = backend_with_stick();
        let config = VolumeListConfig {
            watch_hardware: false,
            ..VolumeListConfig::default()
        };
        let list = VolumeList::with_backend(backend.clone(), config);
        assert_eq!(list.listener_state(), ListenerState::Unregistered);
        assert!(!backend.is_watched());
    }

    #[test]
    fn subscribers_are_pruned_when_dropped() {
        let backend = backend_with_stick();
        let mut list = VolumeList::with_backend(backend, VolumeListConfig::default());
        let kept = list.subscribe();
        drop(list.subscribe());
        list.refresh();
        assert_eq!(list.subscribers.len(), 1);
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn wait_events_times_out_when_idle() {
        let backend = backend_with_stick();
        let mut list = VolumeList::with_backend(backend, VolumeListConfig::default());
        assert_eq!(list.wait_events(Duration::from_millis(20)), 0);
    }
}

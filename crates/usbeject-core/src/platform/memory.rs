//! In-memory backend.
//!
//! Holds its own disk / volume / drive tables and a script of eject
//! outcomes. Tests use it to drive the facade without hardware; other
//! threads can fire hardware events through [`MemoryBackend::emit`] the way
//! an OS notification thread would.
use super::Backend;
use crate::eject::{Veto, VetoType};
use crate::error::PlatformError;
use crate::events::HardwareEvent;
use crate::listener::{EventSink, Watch};
use crate::model::{DeviceKey, DiskEntry, DriveEntry, VolumeEntry};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    disks: Vec<(DiskEntry, bool)>,
    volumes: Vec<VolumeEntry>,
    drives: Vec<DriveEntry>,
    failing: Vec<&'static str>,
}

#[derive(Default)]
struct EjectScript {
    outcomes: VecDeque<Result<(), Veto>>,
    calls: Vec<DeviceKey>,
}

/// Scriptable backend with no OS access.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    eject: Mutex<EjectScript>,
    gate: Mutex<Option<Receiver<()>>>,
    sink: Arc<Mutex<Option<EventSink>>>,
    refuse_all: Option<VetoType>,
    enumerations: Mutex<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty backend that refuses every eject as an illegal request.
    pub fn unsupported() -> Self {
        Self {
            refuse_all: Some(VetoType::IllegalDeviceRequest),
            ..Self::default()
        }
    }

    /// Add a disk that passes the removable filter.
    pub fn add_disk(&self, disk: DiskEntry) {
        self.tables.lock().disks.push((disk, true));
    }

    /// Add a disk that the removable filter excludes.
    pub fn add_fixed_disk(&self, disk: DiskEntry) {
        self.tables.lock().disks.push((disk, false));
    }

    pub fn add_volume(&self, volume: VolumeEntry) {
        self.tables.lock().volumes.push(volume);
    }

    pub fn add_drive(&self, drive: DriveEntry) {
        self.tables.lock().drives.push(drive);
    }

    /// Drop a disk and every volume and drive it owns, as an unplug would.
    pub fn unplug(&self, container: &DeviceKey) {
        let mut tables = self.tables.lock();
        let Some(pos) = tables.disks.iter().position(|(d, _)| &d.container == container) else {
            return;
        };
        let (disk, _) = tables.disks.remove(pos);
        let gone: Vec<String> = tables
            .volumes
            .iter()
            .filter(|v| disk.owns(&v.volume_id))
            .map(|v| v.device_path.clone())
            .collect();
        tables.volumes.retain(|v| !disk.owns(&v.volume_id));
        tables.drives.retain(|d| !gone.contains(&d.device_path));
    }

    /// Make the named enumeration (`"disk"`, `"volume"`, `"drive"`) fail.
    pub fn fail_enumeration(&self, kind: &'static str) {
        self.tables.lock().failing.push(kind);
    }

    /// Queue the outcome of the next eject. Unscripted ejects succeed.
    pub fn script_eject(&self, outcome: Result<(), Veto>) {
        self.eject.lock().outcomes.push_back(outcome);
    }

    /// Block every eject until a message arrives on `gate`.
    pub fn set_eject_gate(&self, gate: Receiver<()>) {
        *self.gate.lock() = Some(gate);
    }

    /// Keys passed to `request_eject`, in call order.
    pub fn eject_calls(&self) -> Vec<DeviceKey> {
        self.eject.lock().calls.clone()
    }

    /// Number of full disk enumerations performed so far.
    pub fn enumeration_count(&self) -> usize {
        *self.enumerations.lock()
    }

    /// Deliver a hardware event as the OS would, from the calling thread.
    pub fn emit(&self, event: HardwareEvent) {
        if let Some(sink) = self.sink.lock().as_ref() {
            sink.notify(event);
        }
    }

    /// Whether a listener is currently registered.
    pub fn is_watched(&self) -> bool {
        self.sink.lock().is_some()
    }

    fn check(&self, kind: &'static str) -> Result<(), PlatformError> {
        if self.tables.lock().failing.contains(&kind) {
            return Err(PlatformError::api("memory", format!("{kind} query failed")));
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn disks(&self, removable_only: bool) -> Result<Vec<DiskEntry>, PlatformError> {
        *self.enumerations.lock() += 1;
        self.check("disk")?;
        Ok(self
            .tables
            .lock()
            .disks
            .iter()
            .filter(|(_, removable)| *removable || !removable_only)
            .map(|(disk, _)| disk.clone())
            .collect())
    }

    fn volumes(&self) -> Result<Vec<VolumeEntry>, PlatformError> {
        self.check("volume")?;
        Ok(self.tables.lock().volumes.clone())
    }

    fn drives(&self, _removable_only: bool) -> Result<Vec<DriveEntry>, PlatformError> {
        self.check("drive")?;
        Ok(self.tables.lock().drives.clone())
    }

    fn request_eject(&self, key: &DeviceKey) -> Result<(), Veto> {
        self.eject.lock().calls.push(key.clone());
        if let Some(reason) = self.refuse_all {
            return Err(Veto::new(reason, None));
        }
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            // A dropped sender opens the gate for good.
            gate.recv().ok();
        }
        let outcome = self.eject.lock().outcomes.pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            self.unplug(key);
        }
        outcome
    }

    fn watch(&self, sink: EventSink) -> Result<Box<dyn Watch>, PlatformError> {
        *self.sink.lock() = Some(sink);
        Ok(Box::new(MemoryWatch {
            slot: Arc::clone(&self.sink),
        }))
    }
}

struct MemoryWatch {
    slot: Arc<Mutex<Option<EventSink>>>,
}

impl Watch for MemoryWatch {
    fn stop(&mut self) {
        self.slot.lock().take();
    }
}

impl Drop for MemoryWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick() -> DiskEntry {
        DiskEntry {
            container: DeviceKey::DevInst(7),
            disk_id: "USBSTOR\\STICK".into(),
            friendly_name: "Stick".into(),
            volume_ids: vec!["V1".into()],
        }
    }

    #[test]
    fn removable_filter_applies_to_disks() {
        let backend = MemoryBackend::new();
        backend.add_disk(stick());
        backend.add_fixed_disk(DiskEntry {
            container: DeviceKey::DevInst(1),
            ..stick()
        });
        assert_eq!(backend.disks(true).unwrap().len(), 1);
        assert_eq!(backend.disks(false).unwrap().len(), 2);
    }

    #[test]
    fn successful_eject_unplugs_the_disk() {
        let backend = MemoryBackend::new();
        backend.add_disk(stick());
        backend.add_volume(VolumeEntry::new("V1", "\\Device\\HarddiskVolume9"));
        backend.add_drive(DriveEntry::lettered('E', "\\Device\\HarddiskVolume9", "", "FAT32"));
        backend.request_eject(&DeviceKey::DevInst(7)).unwrap();
        assert!(backend.disks(false).unwrap().is_empty());
        assert!(backend.volumes().unwrap().is_empty());
        assert!(backend.drives(false).unwrap().is_empty());
    }

    #[test]
    fn scripted_refusal_keeps_the_disk() {
        let backend = MemoryBackend::new();
        backend.add_disk(stick());
        backend.script_eject(Err(Veto::new(VetoType::OutstandingOpen, None)));
        assert!(backend.request_eject(&DeviceKey::DevInst(7)).is_err());
        assert_eq!(backend.disks(false).unwrap().len(), 1);
        assert_eq!(backend.eject_calls(), vec![DeviceKey::DevInst(7)]);
    }

    #[test]
    fn unsupported_backend_refuses() {
        let backend = MemoryBackend::unsupported();
        let veto = backend.request_eject(&DeviceKey::DevInst(1)).unwrap_err();
        assert_eq!(veto.reason, VetoType::IllegalDeviceRequest);
    }
}

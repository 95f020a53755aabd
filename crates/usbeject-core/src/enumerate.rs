//! Drive, volume and disk enumerators.
//!
//! Each one performs a single backend query and returns a finished list.
//! Failures are logged and degrade to an empty list: missing one signal
//! should not hide what the others found.
use crate::correlate::correlate;
use crate::model::{DiskEntry, DriveEntry, Volume, VolumeEntry};
use crate::platform::Backend;
use tracing::{debug, warn};

pub fn enumerate_disks(backend: &dyn Backend, removable_only: bool) -> Vec<DiskEntry> {
    absorb("disk", backend.disks(removable_only))
}

pub fn enumerate_volumes(backend: &dyn Backend) -> Vec<VolumeEntry> {
    absorb("volume", backend.volumes())
}

pub fn enumerate_drives(backend: &dyn Backend, removable_only: bool) -> Vec<DriveEntry> {
    absorb("drive", backend.drives(removable_only))
}

/// Run all three enumerations and correlate them.
pub fn populate(backend: &dyn Backend, removable_only: bool) -> Vec<Volume> {
    let disks = enumerate_disks(backend, removable_only);
    let volumes = enumerate_volumes(backend);
    let drives = enumerate_drives(backend, removable_only);
    correlate(&disks, &volumes, &drives)
}

fn absorb<T>(kind: &str, result: Result<Vec<T>, crate::PlatformError>) -> Vec<T> {
    match result {
        Ok(entries) => {
            debug!("{} enumeration: {} entries", kind, entries.len());
            entries
        }
        Err(e) => {
            warn!("{} enumeration incomplete: {}", kind, e);
            Vec::new()
        }
    }
}

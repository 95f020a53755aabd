//! Linux backend.
//!
//! - Disks: `/sys/block/*`, keyed by kernel name (`sdb`).
//! - Volumes: `/sys/class/block/*`, device path `/dev/<name>`.
//! - Drives: `/proc/self/mountinfo`, labels from `/dev/disk/by-label`.
//! - Eject: unmount every volume of the disk, then power off its drive,
//!   through the UDisks2 D-Bus service.
//! - Notifications: UDisks2 object and mount signals. Without a system bus
//!   or udisks daemon, a poller thread diffing block devices and mounts.
//!
//! All roots are configurable so tests can point the backend at a fake
//! tree.
mod eject;
mod mounts;
mod signals;
mod sysfs;
mod udisks;
mod watch;

use super::Backend;
use crate::eject::Veto;
use crate::error::PlatformError;
use crate::listener::{EventSink, Watch};
use crate::model::{DeviceKey, DiskEntry, DriveEntry, VolumeEntry};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Filesystem locations the backend reads.
#[derive(Debug, Clone)]
pub struct SysRoots {
    /// sysfs mount, normally `/sys`.
    pub sys: PathBuf,
    /// Mount table, normally `/proc/self/mountinfo`.
    pub mountinfo: PathBuf,
    /// Label symlink directory, normally `/dev/disk/by-label`.
    pub by_label: PathBuf,
    /// Device node directory, normally `/dev`.
    pub dev: PathBuf,
}

impl Default for SysRoots {
    fn default() -> Self {
        Self {
            sys: PathBuf::from("/sys"),
            mountinfo: PathBuf::from("/proc/self/mountinfo"),
            by_label: PathBuf::from("/dev/disk/by-label"),
            dev: PathBuf::from("/dev"),
        }
    }
}

pub struct LinuxBackend {
    roots: SysRoots,
    poll_interval: Duration,
}

impl LinuxBackend {
    pub fn new(poll_interval: Duration) -> Self {
        Self::with_roots(SysRoots::default(), poll_interval)
    }

    pub fn with_roots(roots: SysRoots, poll_interval: Duration) -> Self {
        Self {
            roots,
            poll_interval,
        }
    }
}

impl Backend for LinuxBackend {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn disks(&self, removable_only: bool) -> Result<Vec<DiskEntry>, PlatformError> {
        sysfs::enumerate_disks(&self.roots, removable_only)
    }

    fn volumes(&self) -> Result<Vec<VolumeEntry>, PlatformError> {
        sysfs::enumerate_volumes(&self.roots)
    }

    fn drives(&self, _removable_only: bool) -> Result<Vec<DriveEntry>, PlatformError> {
        // Removability is a property of the disk here; the disk filter
        // already drops fixed media.
        mounts::enumerate_drives(&self.roots)
    }

    fn request_eject(&self, key: &DeviceKey) -> Result<(), Veto> {
        eject::eject_disk(&self.roots, key)
    }

    fn watch(&self, sink: EventSink) -> Result<Box<dyn Watch>, PlatformError> {
        match signals::start(sink.clone()) {
            Ok(watch) => Ok(Box::new(watch)),
            Err(e) => {
                warn!("udisks signals unavailable ({}), polling instead", e);
                watch::start(self.roots.clone(), self.poll_interval, sink)
                    .map(|w| Box::new(w) as Box<dyn Watch>)
            }
        }
    }
}

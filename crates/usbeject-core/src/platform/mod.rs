//! Platform seam: the OS-specific half of enumeration, ejection and
//! hardware notification.
//!
//! - `windows`: SetupAPI / CfgMgr32.
//! - `linux`: sysfs, mountinfo and udisks.
//! - [`memory`]: scriptable in-memory backend, available everywhere.
pub mod memory;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

use crate::config::VolumeListConfig;
use crate::eject::Veto;
use crate::error::PlatformError;
use crate::listener::{EventSink, Watch};
use crate::model::{DeviceKey, DiskEntry, DriveEntry, VolumeEntry};
use std::sync::Arc;

/// One operating system's view of storage hardware.
///
/// Enumeration methods perform exactly one OS query each and return a
/// finished list. `request_eject` may block for as long as the OS takes.
pub trait Backend: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Disk containers. With `removable_only`, containers that are not
    /// both removable and disableable are left out.
    fn disks(&self, removable_only: bool) -> Result<Vec<DiskEntry>, PlatformError>;

    /// Volume interfaces.
    fn volumes(&self) -> Result<Vec<VolumeEntry>, PlatformError>;

    /// Drive letters / mount points.
    fn drives(&self, removable_only: bool) -> Result<Vec<DriveEntry>, PlatformError>;

    /// Ask the OS to remove the container identified by `key`.
    fn request_eject(&self, key: &DeviceKey) -> Result<(), Veto>;

    /// Start delivering hardware notifications to `sink`.
    fn watch(&self, sink: EventSink) -> Result<Box<dyn Watch>, PlatformError>;
}

/// The backend for the platform we were compiled for.
#[cfg(windows)]
pub fn native(_config: &VolumeListConfig) -> Arc<dyn Backend> {
    Arc::new(windows::WindowsBackend)
}

/// The backend for the platform we were compiled for.
#[cfg(target_os = "linux")]
pub fn native(config: &VolumeListConfig) -> Arc<dyn Backend> {
    Arc::new(linux::LinuxBackend::new(config.poll_interval()))
}

/// No native backend: an empty list and refused ejects.
#[cfg(not(any(windows, target_os = "linux")))]
pub fn native(_config: &VolumeListConfig) -> Arc<dyn Backend> {
    Arc::new(memory::MemoryBackend::unsupported())
}

//! Windows backend: SetupAPI and the configuration manager (CfgMgr32).
//!
//! - Disks: `GUID_DEVINTERFACE_DISK`; the ejectable container is the
//!   disk's parent devnode, owned volumes are its removal relations.
//! - Volumes: `GUID_DEVINTERFACE_VOLUME` with the physical device object
//!   name as the join key.
//! - Drives: logical drive strings resolved through `QueryDosDeviceW`.
//! - Eject: `CM_Request_Device_EjectW` on the container devnode.
//! - Notifications: `CM_Register_Notification` on the volume interface
//!   class.
mod devices;
mod drives;
mod eject;
mod notify;
mod permissions;

use super::Backend;
use crate::eject::Veto;
use crate::error::PlatformError;
use crate::listener::{EventSink, Watch};
use crate::model::{DeviceKey, DiskEntry, DriveEntry, VolumeEntry};

pub use permissions::is_elevated;

pub struct WindowsBackend;

impl Backend for WindowsBackend {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn disks(&self, removable_only: bool) -> Result<Vec<DiskEntry>, PlatformError> {
        devices::enumerate_disks(removable_only)
    }

    fn volumes(&self) -> Result<Vec<VolumeEntry>, PlatformError> {
        devices::enumerate_volumes()
    }

    fn drives(&self, removable_only: bool) -> Result<Vec<DriveEntry>, PlatformError> {
        drives::enumerate_drives(removable_only)
    }

    fn request_eject(&self, key: &DeviceKey) -> Result<(), Veto> {
        eject::request_device_eject(key)
    }

    fn watch(&self, sink: EventSink) -> Result<Box<dyn Watch>, PlatformError> {
        notify::register(sink).map(|r| Box::new(r) as Box<dyn Watch>)
    }
}

/// Convert a NUL-terminated UTF-16 buffer to a `String`.
fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Split a double-NUL-terminated UTF-16 multi-string.
fn split_multi_sz(buf: &[u16]) -> Vec<String> {
    buf.split(|&c| c == 0)
        .take_while(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// NUL-terminated UTF-16 copy of `s`.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

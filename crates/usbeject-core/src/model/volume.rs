//! The public, immutable `Volume` record.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Opaque key of an ejectable disk container.
///
/// Collaborators must treat this as a token: read it from a [`Volume`] and
/// hand it back unmodified to
/// [`VolumeList::eject_whole_device`](crate::VolumeList::eject_whole_device).
/// Several volumes share one key when they live on the same physical device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DeviceKey {
    /// Device-node instance (`DEVINST`) of the disk's ejectable parent.
    DevInst(u32),
    /// Whole-disk kernel name, e.g. `sdb` or `mmcblk0`.
    DiskName(String),
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DevInst(devinst) => write!(f, "{devinst}"),
            Self::DiskName(name) => f.write_str(name),
        }
    }
}

/// A mounted volume that can be ejected together with its disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Display-only label, e.g. "MACRIUM_PE (H:)".
    pub friendly_display_name: String,
    /// Mount root, e.g. "H:\" or "/media/user/STICK".
    pub root_directory: PathBuf,
    /// Volume label as reported by the OS. May be empty.
    pub volume_label: String,
    /// Filesystem type, e.g. "FAT32" or "vfat".
    pub file_system_name: String,
    /// Name of the physical device, e.g. "JetFlash USB Device".
    pub friendly_device_name: String,
    /// Key of the ejectable container that owns this volume.
    pub device_instance: DeviceKey,
}

/// An immutable list of volumes.
///
/// Every refresh builds a new snapshot and swaps it in, so a snapshot that
/// was handed out earlier never changes underneath its holder.
pub type Snapshot = Arc<[Volume]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_key_displays_bare_scalar() {
        assert_eq!(DeviceKey::DevInst(100).to_string(), "100");
        assert_eq!(DeviceKey::DiskName("sdb".into()).to_string(), "sdb");
    }

    #[test]
    fn device_key_serializes_tagged() {
        let json = serde_json::to_string(&DeviceKey::DevInst(7)).unwrap();
        assert_eq!(json, r#"{"kind":"dev_inst","value":7}"#);
        let back: DeviceKey = serde_json::from_str(r#"{"kind":"disk_name","value":"sdc"}"#).unwrap();
        assert_eq!(back, DeviceKey::DiskName("sdc".into()));
    }
}

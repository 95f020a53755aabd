//! Transient records produced by one enumeration pass.
//!
//! They only live for the duration of a single correlation and are
//! discarded afterwards.
use super::DeviceKey;
use std::path::PathBuf;

/// A disk container, i.e. the ejectable unit hosting one or more volumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    /// Key passed back to the platform to eject this disk.
    pub container: DeviceKey,
    /// Raw disk identifier, e.g.
    /// `USBSTOR\DISK&VEN_JETFLASH&PROD_TRANSCEND_2GB&REV_8.07\RA4NEY1B&0`.
    pub disk_id: String,
    /// Hardware name, e.g. "JetFlash Transcend 2GB USB Device".
    pub friendly_name: String,
    /// Identifiers of the volumes this disk owns.
    pub volume_ids: Vec<String>,
}

impl DiskEntry {
    /// Whether `volume_id` belongs to this disk. Case-insensitive.
    pub fn owns(&self, volume_id: &str) -> bool {
        self.volume_ids
            .iter()
            .any(|id| id.eq_ignore_ascii_case(volume_id))
    }
}

/// A volume interface and the device object that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    /// Volume identifier, matched against [`DiskEntry::volume_ids`].
    pub volume_id: String,
    /// Device path, e.g. `\Device\HarddiskVolume65` or `/dev/sdb1`.
    pub device_path: String,
}

impl VolumeEntry {
    pub fn new(volume_id: impl Into<String>, device_path: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            device_path: device_path.into(),
        }
    }
}

/// A drive letter (or mount point) assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    /// Drive letter, e.g. `H`. `None` where volumes are mounted by path.
    pub letter: Option<char>,
    /// Mount root, e.g. "H:\".
    pub root_directory: PathBuf,
    /// Device path the drive resolves to; the join key to [`VolumeEntry`].
    pub device_path: String,
    /// Volume label. May be empty.
    pub volume_label: String,
    /// Filesystem type.
    pub file_system_name: String,
}

impl DriveEntry {
    /// A drive-letter assignment rooted at `<letter>:\`.
    pub fn lettered(
        letter: char,
        device_path: impl Into<String>,
        volume_label: impl Into<String>,
        file_system_name: impl Into<String>,
    ) -> Self {
        Self {
            letter: Some(letter),
            root_directory: PathBuf::from(format!("{letter}:\\")),
            device_path: device_path.into(),
            volume_label: volume_label.into(),
            file_system_name: file_system_name.into(),
        }
    }

    /// A mount-point assignment.
    pub fn mounted(
        root_directory: impl Into<PathBuf>,
        device_path: impl Into<String>,
        volume_label: impl Into<String>,
        file_system_name: impl Into<String>,
    ) -> Self {
        Self {
            letter: None,
            root_directory: root_directory.into(),
            device_path: device_path.into(),
            volume_label: volume_label.into(),
            file_system_name: file_system_name.into(),
        }
    }

    /// Short location shown in display names: "H:" or the mount root.
    pub fn location(&self) -> String {
        match self.letter {
            Some(letter) => format!("{letter}:"),
            None => self.root_directory.display().to_string(),
        }
    }
}

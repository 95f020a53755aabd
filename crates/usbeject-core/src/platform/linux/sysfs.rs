//! Disk and volume enumeration from sysfs.
use super::SysRoots;
use crate::error::PlatformError;
use crate::model::{DeviceKey, DiskEntry, VolumeEntry};
use std::fs;
use std::path::Path;

/// Kernel block devices that never represent ejectable hardware.
const VIRTUAL_PREFIXES: [&str; 5] = ["loop", "ram", "zram", "dm-", "md"];

pub(super) fn enumerate_disks(
    roots: &SysRoots,
    removable_only: bool,
) -> Result<Vec<DiskEntry>, PlatformError> {
    let block = roots.sys.join("block");
    let mut disks = Vec::new();
    for name in list_dir(&block)? {
        if VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }
        let disk_dir = block.join(&name);
        if removable_only && !is_removable(&disk_dir) {
            continue;
        }

        let volume_ids = owned_volumes(&disk_dir, &name);
        disks.push(DiskEntry {
            container: DeviceKey::DiskName(name.clone()),
            friendly_name: friendly_name(&disk_dir),
            disk_id: name,
            volume_ids,
        });
    }
    Ok(disks)
}

pub(super) fn enumerate_volumes(roots: &SysRoots) -> Result<Vec<VolumeEntry>, PlatformError> {
    let class = roots.sys.join("class").join("block");
    Ok(list_dir(&class)?
        .into_iter()
        .map(|name| {
            let device_path = roots.dev.join(&name).to_string_lossy().into_owned();
            VolumeEntry::new(name, device_path)
        })
        .collect())
}

/// Kernel names of the volumes on a disk: its partitions in name order,
/// then the disk itself, since unpartitioned media carries its filesystem
/// on the whole disk.
pub(super) fn owned_volumes(disk_dir: &Path, disk: &str) -> Vec<String> {
    let mut names: Vec<String> = list_dir(disk_dir)
        .unwrap_or_default()
        .into_iter()
        .filter(|child| disk_dir.join(child).join("partition").is_file())
        .collect();
    names.push(disk.to_string());
    names
}

/// Removable media, or a disk hanging off a hot-pluggable bus.
fn is_removable(disk_dir: &Path) -> bool {
    if read_attr(&disk_dir.join("removable")).as_deref() == Some("1") {
        return true;
    }
    fs::canonicalize(disk_dir.join("device"))
        .map(|target| {
            let target = target.to_string_lossy();
            target.contains("/usb") || target.contains("/mmc")
        })
        .unwrap_or(false)
}

/// "vendor model" from the device attributes, whichever exist.
fn friendly_name(disk_dir: &Path) -> String {
    let device = disk_dir.join("device");
    [read_attr(&device.join("vendor")), read_attr(&device.join("model"))]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// Sorted entry names of `dir`.
pub(super) fn list_dir(dir: &Path) -> Result<Vec<String>, PlatformError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| PlatformError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

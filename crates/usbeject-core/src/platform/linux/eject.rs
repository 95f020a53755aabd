//! Whole-disk eject through UDisks2.
//!
//! Every mounted volume on the disk is unmounted first; the drive is then
//! powered off, which detaches it from the bus.
use super::udisks::{self, block_object_path};
use super::{mounts, sysfs, SysRoots};
use crate::eject::{Veto, VetoType};
use crate::model::DeviceKey;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};
use udisks2::block::BlockProxy;
use udisks2::drive::DriveProxy;
use udisks2::filesystem::FilesystemProxy;
use zbus::Connection;

pub(super) fn eject_disk(roots: &SysRoots, key: &DeviceKey) -> Result<(), Veto> {
    let DeviceKey::DiskName(disk) = key else {
        return Err(Veto::new(VetoType::IllegalDeviceRequest, None));
    };

    let release = mounts_to_release(roots, disk);
    let runtime = udisks::runtime().map_err(|e| {
        warn!("Cannot start udisks runtime: {}", e);
        Veto::new(VetoType::Unknown, None)
    })?;
    runtime.block_on(unmount_and_power_off(&release, disk, &roots.dev))
}

/// Kernel names of the disk's volumes that are currently mounted, in
/// mount-table order.
pub(super) fn mounts_to_release(roots: &SysRoots, disk: &str) -> Vec<String> {
    let owned = sysfs::owned_volumes(&roots.sys.join("block").join(disk), disk);
    mounts::read_mounts(&roots.mountinfo)
        .unwrap_or_default()
        .iter()
        .filter_map(|m| mounts::device_name(&m.source))
        .filter(|name| owned.iter().any(|o| o == name))
        .map(str::to_owned)
        .collect()
}

async fn unmount_and_power_off(volumes: &[String], disk: &str, dev: &Path) -> Result<(), Veto> {
    let node = |name: &str| dev.join(name).to_string_lossy().into_owned();

    let connection = Connection::system().await.map_err(|e| {
        warn!("System bus unavailable: {}", e);
        Veto::new(VetoType::LegacyDriver, Some(node(disk)))
    })?;

    for name in volumes {
        let path = block_object_path(name);
        debug!("Unmounting {} ({})", node(name), path);
        let proxy = FilesystemProxy::builder(&connection)
            .path(path.as_str())
            .map_err(|e| refused(&e, node(name)))?
            .build()
            .await
            .map_err(|e| refused(&e, node(name)))?;
        match proxy.unmount(HashMap::new()).await.map_err(zbus::Error::from) {
            Ok(()) => {}
            Err(e) if udisks::is_not_mounted(&e) => debug!("{} was already unmounted", node(name)),
            Err(e) => return Err(refused(&e, node(name))),
        }
    }

    let block_path = block_object_path(disk);
    let block = BlockProxy::builder(&connection)
        .path(block_path.as_str())
        .map_err(|e| refused(&e, node(disk)))?
        .build()
        .await
        .map_err(|e| refused(&e, node(disk)))?;
    let drive_path = block
        .drive()
        .await
        .map_err(zbus::Error::from)
        .map_err(|e| refused(&e, node(disk)))?;
    if drive_path.as_str() == "/" {
        // Loop devices and the like have no drive to power off.
        return Err(Veto::new(VetoType::IllegalDeviceRequest, Some(node(disk))));
    }

    debug!("Powering off {} ({})", node(disk), drive_path.as_str());
    let drive = DriveProxy::builder(&connection)
        .path(drive_path)
        .map_err(|e| refused(&e, node(disk)))?
        .build()
        .await
        .map_err(|e| refused(&e, node(disk)))?;
    drive
        .power_off(HashMap::new())
        .await
        .map_err(zbus::Error::from)
        .map_err(|e| refused(&e, node(disk)))
}

fn refused(err: &zbus::Error, device: String) -> Veto {
    debug!("udisks refused {}: {}", device, err);
    Veto::new(udisks::veto_for(err), Some(device))
}

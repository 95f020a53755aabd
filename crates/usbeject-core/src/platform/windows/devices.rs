//! Disk and volume enumeration through SetupAPI and CfgMgr32.
use super::{from_wide, split_multi_sz, to_wide};
use crate::error::PlatformError;
use crate::model::{DeviceKey, DiskEntry, VolumeEntry};
use windows::core::{GUID, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    CM_Get_DevNode_Status, CM_Get_Device_IDW, CM_Get_Device_ID_ListW, CM_Get_Device_ID_List_SizeW,
    CM_Get_Device_ID_Size, CM_Get_Parent, SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo,
    SetupDiGetClassDevsW, SetupDiGetDeviceRegistryPropertyW, CM_DEVNODE_STATUS_FLAGS,
    CM_GETIDLIST_FILTER_REMOVALRELATIONS, CM_PROB, CR_SUCCESS, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT,
    DN_DISABLEABLE, DN_REMOVABLE, HDEVINFO, SETUP_DI_REGISTRY_PROPERTY, SPDRP_FRIENDLYNAME,
    SPDRP_PHYSICAL_DEVICE_OBJECT_NAME, SP_DEVINFO_DATA,
};
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Ioctl::{GUID_DEVINTERFACE_DISK, GUID_DEVINTERFACE_VOLUME};

/// A present-device information set for one interface class.
///
/// Destroys the set on drop.
struct DevInfoList {
    handle: HDEVINFO,
}

impl DevInfoList {
    fn open(class: &GUID) -> Result<Self, PlatformError> {
        let handle = unsafe {
            SetupDiGetClassDevsW(
                Some(class),
                PCWSTR::null(),
                HWND::default(),
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            )
        }
        .map_err(|e| PlatformError::api("SetupDiGetClassDevsW", e.message()))?;
        Ok(Self { handle })
    }

    /// Device info records in enumeration order.
    fn devices(&self) -> impl Iterator<Item = SP_DEVINFO_DATA> + '_ {
        (0u32..).map_while(move |index| {
            let mut data = SP_DEVINFO_DATA {
                cbSize: std::mem::size_of::<SP_DEVINFO_DATA>() as u32,
                ..Default::default()
            };
            unsafe { SetupDiEnumDeviceInfo(self.handle, index, &mut data) }
                .ok()
                .map(|_| data)
        })
    }

    /// A string registry property, or `None` if the device lacks it.
    fn string_property(&self, data: &SP_DEVINFO_DATA, property: SETUP_DI_REGISTRY_PROPERTY) -> Option<String> {
        let mut required = 0u32;
        // First call sizes the buffer and fails with ERROR_INSUFFICIENT_BUFFER.
        let _ = unsafe {
            SetupDiGetDeviceRegistryPropertyW(self.handle, data, property, None, None, Some(&mut required))
        };
        if required == 0 {
            return None;
        }
        let mut buf = vec![0u8; required as usize];
        unsafe {
            SetupDiGetDeviceRegistryPropertyW(self.handle, data, property, None, Some(buf.as_mut_slice()), None)
        }
        .ok()?;
        let wide: Vec<u16> = buf
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Some(from_wide(&wide))
    }
}

impl Drop for DevInfoList {
    fn drop(&mut self) {
        unsafe {
            let _ = SetupDiDestroyDeviceInfoList(self.handle);
        }
    }
}

/// Instance id of a devnode, e.g. `USBSTOR\DISK&VEN_JETFLASH&...\RA4NEY1B&0`.
fn device_id(devinst: u32) -> Option<String> {
    let mut len = 0u32;
    if unsafe { CM_Get_Device_ID_Size(&mut len, devinst, 0) } != CR_SUCCESS {
        return None;
    }
    let mut buf = vec![0u16; len as usize + 1];
    if unsafe { CM_Get_Device_IDW(devinst, &mut buf, 0) } != CR_SUCCESS {
        return None;
    }
    Some(from_wide(&buf))
}

/// Instance ids removed together with `device_id`. For a disk, its volumes.
fn removal_relations(device_id: &str) -> Vec<String> {
    let filter = to_wide(device_id);
    let mut len = 0u32;
    let sized = unsafe {
        CM_Get_Device_ID_List_SizeW(&mut len, PCWSTR(filter.as_ptr()), CM_GETIDLIST_FILTER_REMOVALRELATIONS)
    };
    if sized != CR_SUCCESS || len == 0 {
        return Vec::new();
    }
    let mut buf = vec![0u16; len as usize + 1];
    let listed = unsafe {
        CM_Get_Device_ID_ListW(PCWSTR(filter.as_ptr()), &mut buf, CM_GETIDLIST_FILTER_REMOVALRELATIONS)
    };
    if listed != CR_SUCCESS {
        return Vec::new();
    }
    split_multi_sz(&buf)
}

/// The parent devnode of `devinst` if it passes the removable policy.
fn ejectable_parent(devinst: u32, removable_only: bool) -> Option<u32> {
    let mut parent = 0u32;
    if unsafe { CM_Get_Parent(&mut parent, devinst, 0) } != CR_SUCCESS {
        return None;
    }
    if removable_only {
        let mut status = CM_DEVNODE_STATUS_FLAGS::default();
        let mut problem = CM_PROB::default();
        if unsafe { CM_Get_DevNode_Status(&mut status, &mut problem, parent, 0) } != CR_SUCCESS {
            return None;
        }
        let required = DN_DISABLEABLE.0 | DN_REMOVABLE.0;
        if status.0 & required != required {
            return None;
        }
    }
    Some(parent)
}

pub(super) fn enumerate_disks(removable_only: bool) -> Result<Vec<DiskEntry>, PlatformError> {
    let list = DevInfoList::open(&GUID_DEVINTERFACE_DISK)?;
    let mut disks = Vec::new();
    for data in list.devices() {
        let Some(parent) = ejectable_parent(data.DevInst, removable_only) else {
            continue;
        };
        let disk_id = device_id(data.DevInst).unwrap_or_default();
        let volume_ids = removal_relations(&disk_id);
        disks.push(DiskEntry {
            container: DeviceKey::DevInst(parent),
            friendly_name: list
                .string_property(&data, SPDRP_FRIENDLYNAME)
                .unwrap_or_default(),
            disk_id,
            volume_ids,
        });
    }
    Ok(disks)
}

pub(super) fn enumerate_volumes() -> Result<Vec<VolumeEntry>, PlatformError> {
    let list = DevInfoList::open(&GUID_DEVINTERFACE_VOLUME)?;
    Ok(list
        .devices()
        .map(|data| VolumeEntry {
            volume_id: device_id(data.DevInst).unwrap_or_default(),
            device_path: list
                .string_property(&data, SPDRP_PHYSICAL_DEVICE_OBJECT_NAME)
                .unwrap_or_default(),
        })
        .collect())
}

//! Drive-letter enumeration.
//!
//! Lists every logical drive with the NT device path it maps to, its volume
//! label and its filesystem name.
use super::{from_wide, split_multi_sz, to_wide};
use crate::error::PlatformError;
use crate::model::DriveEntry;
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{
    GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW, QueryDosDeviceW,
};

// Drive type constant from the Windows API.
const DRIVE_REMOVABLE_VAL: u32 = 2;

const MAX_PATH: usize = 260;

/// Enumerate drive letters.
///
/// With `removable_only`, drives whose type is not `DRIVE_REMOVABLE` are
/// skipped. Letters whose device cannot be resolved are skipped too.
pub(super) fn enumerate_drives(removable_only: bool) -> Result<Vec<DriveEntry>, PlatformError> {
    // GetLogicalDriveStringsW returns null-separated drive root strings.
    let mut buffer = [0u16; 256];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };

    if len == 0 || len as usize > buffer.len() {
        return Err(PlatformError::api(
            "GetLogicalDriveStringsW",
            windows::core::Error::from_win32().message(),
        ));
    }

    let mut drives = Vec::new();

    for root in split_multi_sz(&buffer) {
        let Some(letter) = root.chars().next() else {
            continue;
        };
        let device_name = to_wide(&format!("{letter}:"));
        let root_wide = to_wide(&root);
        let root_pcwstr = PCWSTR(root_wide.as_ptr());

        // NT device path, e.g. "\Device\HarddiskVolume65".
        let mut target = [0u16; MAX_PATH];
        let resolved = unsafe { QueryDosDeviceW(PCWSTR(device_name.as_ptr()), Some(&mut target)) };
        if resolved == 0 {
            continue;
        }

        if removable_only && unsafe { GetDriveTypeW(root_pcwstr) } != DRIVE_REMOVABLE_VAL {
            continue;
        }

        // Volume information. Fails for empty card readers; keep the drive
        // with blank metadata.
        let mut label_buf = [0u16; MAX_PATH + 1];
        let mut fs_buf = [0u16; MAX_PATH + 1];
        let has_volume_info = unsafe {
            GetVolumeInformationW(
                root_pcwstr,
                Some(&mut label_buf),
                None,
                None,
                None,
                Some(&mut fs_buf),
            )
            .is_ok()
        };

        let (label, filesystem) = if has_volume_info {
            (from_wide(&label_buf), from_wide(&fs_buf))
        } else {
            (String::new(), String::new())
        };

        drives.push(DriveEntry::lettered(letter, from_wide(&target), label, filesystem));
    }

    Ok(drives)
}

//! Correlator: joins drives, volumes and disks into [`Volume`] records.
//!
//! Drive → volume on exact device path, then volume → disk on membership of
//! the volume id in the disk's owned-id list. A drive that fails either join
//! (network shares, virtual drives, fixed disks filtered out upstream) is
//! dropped without error. The function is pure: identical inputs give
//! identical, identically ordered output.
use crate::model::{DiskEntry, DriveEntry, Volume, VolumeEntry};

/// Build the volume list. Output order follows `drives`.
pub fn correlate(disks: &[DiskEntry], volumes: &[VolumeEntry], drives: &[DriveEntry]) -> Vec<Volume> {
    drives
        .iter()
        .filter_map(|drive| {
            let volume = volumes
                .iter()
                .find(|volume| volume.device_path == drive.device_path)?;
            // First match wins when nested containers list the same volume.
            let disk = disks.iter().find(|disk| disk.owns(&volume.volume_id))?;
            Some(build_volume(drive, disk))
        })
        .collect()
}

fn build_volume(drive: &DriveEntry, disk: &DiskEntry) -> Volume {
    Volume {
        friendly_display_name: display_name(drive, disk),
        root_directory: drive.root_directory.clone(),
        volume_label: drive.volume_label.clone(),
        file_system_name: drive.file_system_name.clone(),
        friendly_device_name: disk.friendly_name.clone(),
        device_instance: disk.container.clone(),
    }
}

/// `"<label> (H:)"`, falling back to the device name, then the disk id,
/// when the volume has no label. A label is used exactly as the volume
/// reports it.
pub fn display_name(drive: &DriveEntry, disk: &DiskEntry) -> String {
    let title = [&drive.volume_label, &disk.friendly_name, &disk.disk_id]
        .into_iter()
        .find(|s| !s.is_empty())
        .map_or("Removable volume", String::as_str);
    format!("{} ({})", title, drive.location())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceKey;
    use std::path::PathBuf;

    fn jetflash() -> (Vec<DiskEntry>, Vec<VolumeEntry>, Vec<DriveEntry>) {
        let drives = vec![DriveEntry::lettered(
            'H',
            "\\Device\\HarddiskVolume65",
            "MACRIUM_PE",
            "FAT32",
        )];
        let volumes = vec![VolumeEntry::new("V1", "\\Device\\HarddiskVolume65")];
        let disks = vec![DiskEntry {
            container: DeviceKey::DevInst(100),
            disk_id: "USBSTOR\\DISK&VEN_JETFLASH".into(),
            friendly_name: "JetFlash USB Device".into(),
            volume_ids: vec!["V1".into()],
        }];
        (disks, volumes, drives)
    }

    #[test]
    fn joins_drive_volume_and_disk() {
        let (disks, volumes, drives) = jetflash();
        let result = correlate(&disks, &volumes, &drives);
        assert_eq!(
            result,
            vec![Volume {
                friendly_display_name: "MACRIUM_PE (H:)".into(),
                root_directory: PathBuf::from("H:\\"),
                volume_label: "MACRIUM_PE".into(),
                file_system_name: "FAT32".into(),
                friendly_device_name: "JetFlash USB Device".into(),
                device_instance: DeviceKey::DevInst(100),
            }]
        );
    }

    #[test]
    fn drive_without_volume_is_skipped() {
        let (disks, volumes, mut drives) = jetflash();
        drives.push(DriveEntry::lettered('Z', "\\Device\\Mup", "share", "NTFS"));
        let result = correlate(&disks, &volumes, &drives);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].root_directory, PathBuf::from("H:\\"));
    }

    #[test]
    fn volume_without_disk_is_skipped() {
        let (disks, mut volumes, mut drives) = jetflash();
        volumes.push(VolumeEntry::new("V2", "\\Device\\HarddiskVolume3"));
        drives.insert(0, DriveEntry::lettered('C', "\\Device\\HarddiskVolume3", "OS", "NTFS"));
        let result = correlate(&disks, &volumes, &drives);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].friendly_display_name, "MACRIUM_PE (H:)");
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        let (disks, volumes, drives) = jetflash();
        assert!(correlate(&[], &volumes, &drives).is_empty());
        assert!(correlate(&disks, &[], &drives).is_empty());
        assert!(correlate(&disks, &volumes, &[]).is_empty());
    }

    #[test]
    fn volume_id_match_ignores_case() {
        let (mut disks, volumes, drives) = jetflash();
        disks[0].volume_ids = vec!["v1".into()];
        assert_eq!(correlate(&disks, &volumes, &drives).len(), 1);
    }

    #[test]
    fn device_path_match_is_exact() {
        let (disks, volumes, mut drives) = jetflash();
        drives[0].device_path = "\\device\\harddiskvolume65".into();
        assert!(correlate(&disks, &volumes, &drives).is_empty());
    }

    #[test]
    fn first_owning_disk_wins() {
        let (mut disks, volumes, drives) = jetflash();
        disks.push(DiskEntry {
            container: DeviceKey::DevInst(200),
            disk_id: "NESTED".into(),
            friendly_name: "Hub".into(),
            volume_ids: vec!["V1".into()],
        });
        let result = correlate(&disks, &volumes, &drives);
        assert_eq!(result[0].device_instance, DeviceKey::DevInst(100));
    }

    #[test]
    fn volumes_sharing_a_disk_share_the_key() {
        let (mut disks, mut volumes, mut drives) = jetflash();
        disks[0].volume_ids.push("V2".into());
        volumes.push(VolumeEntry::new("V2", "\\Device\\HarddiskVolume66"));
        drives.push(DriveEntry::lettered('I', "\\Device\\HarddiskVolume66", "DATA", "exFAT"));
        let result = correlate(&disks, &volumes, &drives);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].device_instance, result[1].device_instance);
        assert_eq!(result[1].friendly_display_name, "DATA (I:)");
    }

    #[test]
    fn correlation_is_idempotent() {
        let (disks, volumes, drives) = jetflash();
        assert_eq!(
            correlate(&disks, &volumes, &drives),
            correlate(&disks, &volumes, &drives)
        );
    }

    #[test]
    fn unlabeled_volumes_fall_back_to_device_name() {
        let (disks, _, _) = jetflash();
        let h = DriveEntry::lettered('H', "a", "", "FAT32");
        assert_eq!(display_name(&h, &disks[0]), "JetFlash USB Device (H:)");
    }

    #[test]
    fn label_whitespace_is_kept() {
        let (disks, _, _) = jetflash();
        let padded = DriveEntry::lettered('H', "a", " DATA ", "FAT32");
        let blank = DriveEntry::lettered('I', "b", "  ", "FAT32");
        assert_eq!(display_name(&padded, &disks[0]), " DATA  (H:)");
        assert_eq!(display_name(&blank, &disks[0]), "   (I:)");
    }

    #[test]
    fn display_name_uses_disk_id_when_nothing_else_is_known() {
        let disk = DiskEntry {
            container: DeviceKey::DiskName("sdb".into()),
            disk_id: "sdb".into(),
            friendly_name: String::new(),
            volume_ids: vec![],
        };
        let drive = DriveEntry::mounted("/media/usb0", "/dev/sdb1", "", "vfat");
        assert_eq!(display_name(&drive, &disk), "sdb (/media/usb0)");
    }
}

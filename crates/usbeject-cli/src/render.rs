//! Text and JSON rendering of volumes.
use serde::Serialize;
use usbeject_core::Volume;

const NO_VOLUMES: &str = "No removable volumes found.";

/// One `list` line per volume: `[index] display name`.
pub fn list_lines(volumes: &[Volume]) -> Vec<String> {
    if volumes.is_empty() {
        return vec![NO_VOLUMES.to_owned()];
    }
    volumes
        .iter()
        .enumerate()
        .map(|(index, volume)| format!("[{index}] {}", volume.friendly_display_name))
        .collect()
}

/// Label/value pairs describing one volume.
pub fn info_lines(volume: &Volume) -> Vec<(&'static str, String)> {
    vec![
        ("Display name", volume.friendly_display_name.clone()),
        ("Root directory", volume.root_directory.display().to_string()),
        ("Volume label", volume.volume_label.clone()),
        ("File system", volume.file_system_name.clone()),
        ("Device", volume.friendly_device_name.clone()),
        ("Device instance", volume.device_instance.to_string()),
    ]
}

/// The full listing: each volume line followed by its indented details.
pub fn detailed(volumes: &[Volume]) -> String {
    if volumes.is_empty() {
        return format!("{NO_VOLUMES}\n");
    }
    let mut out = String::new();
    for (line, volume) in list_lines(volumes).into_iter().zip(volumes) {
        out.push_str(&line);
        out.push('\n');
        for (label, value) in info_lines(volume) {
            out.push_str(&format!("    {label:<16} {value}\n"));
        }
    }
    out
}

#[derive(Serialize)]
struct Row<'a> {
    index: usize,
    #[serde(flatten)]
    volume: &'a Volume,
}

/// Pretty JSON array of volumes, each carrying its index.
pub fn to_json(volumes: &[Volume]) -> serde_json::Result<String> {
    let rows: Vec<Row<'_>> = volumes
        .iter()
        .enumerate()
        .map(|(index, volume)| Row { index, volume })
        .collect();
    serde_json::to_string_pretty(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use usbeject_core::DeviceKey;

    fn stick() -> Volume {
        Volume {
            friendly_display_name: "MACRIUM_PE (H:)".into(),
            root_directory: PathBuf::from("H:\\"),
            volume_label: "MACRIUM_PE".into(),
            file_system_name: "FAT32".into(),
            friendly_device_name: "JetFlash USB Device".into(),
            device_instance: DeviceKey::DevInst(100),
        }
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(list_lines(&[]), vec!["No removable volumes found."]);
        assert_eq!(detailed(&[]), "No removable volumes found.\n");
    }

    #[test]
    fn lines_are_indexed_from_zero() {
        assert_eq!(list_lines(&[stick()]), vec!["[0] MACRIUM_PE (H:)"]);
    }

    #[test]
    fn info_covers_every_field() {
        let info = info_lines(&stick());
        assert_eq!(info.len(), 6);
        assert_eq!(info[5], ("Device instance", "100".to_owned()));
    }

    #[test]
    fn json_rows_carry_index_and_key() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&[stick()]).unwrap()).unwrap();
        assert_eq!(json[0]["index"], 0);
        assert_eq!(json[0]["volume_label"], "MACRIUM_PE");
        assert_eq!(json[0]["device_instance"]["kind"], "dev_inst");
        assert_eq!(json[0]["device_instance"]["value"], 100);
    }
}

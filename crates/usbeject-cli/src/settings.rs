//! Loading `VolumeListConfig` from disk and the command line.
use anyhow::Context;
use std::path::Path;
use usbeject_core::VolumeListConfig;

/// Read `path` (if any) as JSON, then apply command-line overrides.
///
/// Missing fields keep their defaults.
pub fn load(path: Option<&Path>, all_disks: bool) -> anyhow::Result<VolumeListConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => VolumeListConfig::default(),
    };
    if all_disks {
        config.removable_only = false;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn no_file_gives_defaults() {
        assert_eq!(load(None, false).unwrap(), VolumeListConfig::default());
    }

    #[test]
    fn file_values_and_override_apply() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "poll_interval_ms": 1500 }}"#).unwrap();

        let config = load(Some(file.path()), true).unwrap();
        assert_eq!(config.poll_interval_ms, 1500);
        assert!(!config.removable_only);
        assert!(config.watch_hardware);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load(Some(file.path()), false).unwrap_err();
        assert!(format!("{err}").contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.json")), false).is_err());
    }
}

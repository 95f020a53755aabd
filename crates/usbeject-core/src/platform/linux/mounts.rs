//! Drive enumeration from the mount table.
use super::SysRoots;
use crate::error::PlatformError;
use crate::model::DriveEntry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One block-device mount parsed from mountinfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Mount {
    pub mount_point: String,
    pub fs_type: String,
    pub source: String,
}

pub(super) fn enumerate_drives(roots: &SysRoots) -> Result<Vec<DriveEntry>, PlatformError> {
    let mounts = read_mounts(&roots.mountinfo)?;
    let labels = read_labels(&roots.by_label);
    Ok(mounts
        .into_iter()
        .map(|m| {
            let label = device_name(&m.source)
                .and_then(|dev| labels.get(dev))
                .cloned()
                .unwrap_or_default();
            DriveEntry::mounted(m.mount_point, m.source, label, m.fs_type)
        })
        .collect())
}

/// Block-device mounts in table order, first mount per device only.
pub(super) fn read_mounts(mountinfo: &Path) -> Result<Vec<Mount>, PlatformError> {
    let text = fs::read_to_string(mountinfo).map_err(|e| PlatformError::io(mountinfo, e))?;
    let mut mounts: Vec<Mount> = Vec::new();
    for mount in text.lines().filter_map(parse_line) {
        if !mount.source.starts_with("/dev/") {
            continue;
        }
        if mounts.iter().any(|m| m.source == mount.source) {
            continue;
        }
        mounts.push(mount);
    }
    Ok(mounts)
}

/// `36 35 98:0 / /media/usb rw,nosuid shared:1 - vfat /dev/sdb1 rw`
fn parse_line(line: &str) -> Option<Mount> {
    let (left, right) = line.split_once(" - ")?;
    let mount_point = left.split_whitespace().nth(4)?;
    let mut right = right.split_whitespace();
    let fs_type = right.next()?;
    let source = right.next()?;
    Some(Mount {
        mount_point: unescape_octal(mount_point),
        fs_type: fs_type.to_string(),
        source: unescape_octal(source),
    })
}

/// Decode the `\040`-style escapes the kernel uses in mount tables.
fn unescape_octal(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let digits = bytes.get(i + 1..i + 4).unwrap_or_default();
        if bytes[i] == b'\\' && digits.len() == 3 && digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
            let v = digits.iter().fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
            if let Ok(v) = u8::try_from(v) {
                out.push(v);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decode the `\x20`-style escapes udev uses in by-label link names.
fn unescape_hex(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let digits = bytes.get(i + 2..i + 4).unwrap_or_default();
        if bytes[i] == b'\\'
            && bytes.get(i + 1) == Some(&b'x')
            && digits.len() == 2
            && digits.iter().all(u8::is_ascii_hexdigit)
        {
            if let Ok(v) = u8::from_str_radix(&s[i + 2..i + 4], 16) {
                out.push(v);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Device kernel name → label. A missing directory yields no labels.
fn read_labels(by_label: &Path) -> HashMap<String, String> {
    let Ok(entries) = fs::read_dir(by_label) else {
        return HashMap::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let target = fs::read_link(entry.path()).ok()?;
            let device = target.file_name()?.to_string_lossy().into_owned();
            let label = unescape_hex(&entry.file_name().to_string_lossy());
            Some((device, label))
        })
        .collect()
}

pub(super) fn device_name(source: &str) -> Option<&str> {
    source.rsplit('/').next().filter(|s| !s.is_empty())
}

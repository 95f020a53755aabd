//! UDisks2 plumbing shared by eject and hot-plug watching.
//!
//! The proxies are async; callers run them to completion on a private
//! current-thread runtime.
use crate::eject::VetoType;
use std::collections::HashMap;
use tokio::runtime::{Builder, Runtime};
use zbus::zvariant::{self, OwnedObjectPath};

pub(super) const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
pub(super) const FILESYSTEM_IFACE: &str = "org.freedesktop.UDisks2.Filesystem";
pub(super) const SERVICE: &str = "org.freedesktop.UDisks2";

#[zbus::proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2",
    interface = "org.freedesktop.DBus.ObjectManager"
)]
pub(super) trait UDisks2ObjectManager {
    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: OwnedObjectPath,
        interfaces_and_properties: HashMap<String, HashMap<String, zvariant::OwnedValue>>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn interfaces_removed(
        &self,
        object_path: OwnedObjectPath,
        interfaces: Vec<String>,
    ) -> zbus::Result<()>;
}

/// A runtime for one blocking call into udisks.
pub(super) fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Object path of the block device with kernel name `name`, e.g.
/// `/org/freedesktop/UDisks2/block_devices/sdb1`.
///
/// udisks keeps ASCII alphanumerics and writes every other byte as `_xx`.
pub(super) fn block_object_path(name: &str) -> String {
    let mut path = String::from("/org/freedesktop/UDisks2/block_devices/");
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            path.push(byte as char);
        } else {
            path.push_str(&format!("_{byte:02x}"));
        }
    }
    path
}

/// Veto for a failed udisks call.
pub(super) fn veto_for(err: &zbus::Error) -> VetoType {
    match err {
        zbus::Error::MethodError(name, _, _) => classify(name.as_str()),
        _ => VetoType::Unknown,
    }
}

/// Map a D-Bus error name onto the veto vocabulary.
pub(super) fn classify(error_name: &str) -> VetoType {
    let Some(kind) = error_name
        .strip_prefix("org.freedesktop.UDisks2.Error.")
        .or_else(|| error_name.strip_prefix("org.freedesktop.DBus.Error."))
    else {
        return VetoType::Unknown;
    };
    match kind {
        "DeviceBusy" | "AlreadyUnmounting" => VetoType::OutstandingOpen,
        "NotAuthorized" | "NotAuthorizedCanObtain" | "NotAuthorizedDismissed" | "AccessDenied"
        | "MountedByOtherUser" => VetoType::InsufficientRights,
        "NotSupported" | "UnknownMethod" | "UnknownObject" | "UnknownInterface" => {
            VetoType::IllegalDeviceRequest
        }
        "ServiceUnknown" | "NameHasNoOwner" => VetoType::LegacyDriver,
        _ => VetoType::Unknown,
    }
}

/// Whether udisks reports the filesystem as not mounted.
pub(super) fn is_not_mounted(err: &zbus::Error) -> bool {
    matches!(err, zbus::Error::MethodError(name, _, _)
        if name.as_str() == "org.freedesktop.UDisks2.Error.NotMounted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_escape_non_alphanumerics() {
        assert_eq!(block_object_path("sdb1"), "/org/freedesktop/UDisks2/block_devices/sdb1");
        assert_eq!(block_object_path("dm-0"), "/org/freedesktop/UDisks2/block_devices/dm_2d0");
        assert_eq!(
            block_object_path("mmcblk0p1"),
            "/org/freedesktop/UDisks2/block_devices/mmcblk0p1"
        );
    }

    #[test]
    fn classifies_udisks_error_names() {
        assert_eq!(classify("org.freedesktop.UDisks2.Error.DeviceBusy"), VetoType::OutstandingOpen);
        assert_eq!(
            classify("org.freedesktop.UDisks2.Error.NotAuthorizedCanObtain"),
            VetoType::InsufficientRights
        );
        assert_eq!(
            classify("org.freedesktop.UDisks2.Error.NotSupported"),
            VetoType::IllegalDeviceRequest
        );
        assert_eq!(
            classify("org.freedesktop.DBus.Error.ServiceUnknown"),
            VetoType::LegacyDriver
        );
        assert_eq!(classify("org.freedesktop.UDisks2.Error.Failed"), VetoType::Unknown);
        assert_eq!(classify("com.example.Weird"), VetoType::Unknown);
    }

    #[test]
    fn non_method_errors_are_unknown() {
        let err = zbus::Error::Failure("connection reset".into());
        assert_eq!(veto_for(&err), VetoType::Unknown);
        assert!(!is_not_mounted(&err));
    }
}

//! Platform veto codes and their fixed explanatory messages.

/// Reason a platform gave for refusing a device removal.
///
/// The numeric codes are the Windows `PNP_VETO_TYPE` values. Other
/// backends classify their own failures into the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VetoType {
    Unknown,
    LegacyDevice,
    PendingClose,
    WindowsApp,
    WindowsService,
    OutstandingOpen,
    Device,
    Driver,
    IllegalDeviceRequest,
    InsufficientPower,
    NonDisableable,
    LegacyDriver,
    InsufficientRights,
    /// A code outside the known table.
    Unrecognized(i32),
}

/// Message used for any code missing from [`VETO_TABLE`].
pub const UNRECOGNIZED_VETO_MESSAGE: &str = "unknown";

/// `(code, veto, message)` for every defined veto.
pub static VETO_TABLE: [(i32, VetoType, &str); 13] = [
    (0, VetoType::Unknown, "The specified operation was rejected for an unknown reason."),
    (1, VetoType::LegacyDevice, "The device does not support the specified PnP operation."),
    (2, VetoType::PendingClose, "The specified operation cannot be completed because of a pending close operation."),
    (3, VetoType::WindowsApp, "A Microsoft Win32 application vetoed the specified operation."),
    (4, VetoType::WindowsService, "A Win32 service vetoed the specified operation."),
    (5, VetoType::OutstandingOpen, "The requested operation was rejected because of outstanding open handles."),
    (6, VetoType::Device, "The device supports the specified operation, but the device rejected the operation."),
    (7, VetoType::Driver, "The driver supports the specified operation, but the driver rejected the operation."),
    (8, VetoType::IllegalDeviceRequest, "The device does not support the specified operation."),
    (9, VetoType::InsufficientPower, "There is insufficient power to perform the requested operation."),
    (10, VetoType::NonDisableable, "The device cannot be disabled."),
    (11, VetoType::LegacyDriver, "The driver does not support the specified PnP operation."),
    (12, VetoType::InsufficientRights, "The caller has insufficient privileges to complete the operation."),
];

impl VetoType {
    /// Map a raw platform code. Never fails.
    pub fn from_code(code: i32) -> Self {
        VETO_TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, veto, _)| *veto)
            .unwrap_or(Self::Unrecognized(code))
    }

    pub fn message(self) -> &'static str {
        VETO_TABLE
            .iter()
            .find(|(_, veto, _)| *veto == self)
            .map(|(_, _, message)| *message)
            .unwrap_or(UNRECOGNIZED_VETO_MESSAGE)
    }

    /// Full refusal text: the message, then the vetoing device in quotes.
    pub fn describe(self, vetoing_device: Option<&str>) -> String {
        match vetoing_device.filter(|name| !name.is_empty()) {
            Some(name) => format!("{} \"{}\"", self.message(), name),
            None => self.message().to_owned(),
        }
    }
}

/// A raw refusal as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Veto {
    pub reason: VetoType,
    pub vetoing_device: Option<String>,
}

impl Veto {
    pub fn new(reason: VetoType, vetoing_device: Option<String>) -> Self {
        Self {
            reason,
            vetoing_device,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_defined_code_has_a_distinct_message() {
        let mut seen = HashSet::new();
        for (code, veto, message) in VETO_TABLE.iter() {
            assert_eq!(VetoType::from_code(*code), *veto);
            assert!(!veto.message().is_empty());
            assert_eq!(veto.message(), *message);
            assert!(seen.insert(*message), "duplicate message for code {code}");
        }
        assert!(!seen.contains(UNRECOGNIZED_VETO_MESSAGE));
    }

    #[test]
    fn unrecognized_code_falls_back() {
        for code in [-1, 13, 99, i32::MAX] {
            let veto = VetoType::from_code(code);
            assert_eq!(veto, VetoType::Unrecognized(code));
            assert_eq!(veto.message(), "unknown");
        }
    }

    #[test]
    fn describe_ignores_empty_vetoing_name() {
        assert_eq!(
            VetoType::NonDisableable.describe(Some("")),
            "The device cannot be disabled."
        );
        assert_eq!(
            VetoType::WindowsApp.describe(Some("explorer.exe")),
            "A Microsoft Win32 application vetoed the specified operation. \"explorer.exe\""
        );
    }
}

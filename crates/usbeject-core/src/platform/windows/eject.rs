//! `CM_Request_Device_EjectW` wrapper.
use super::{from_wide, permissions::is_elevated};
use crate::eject::{Veto, VetoType};
use crate::model::DeviceKey;
use tracing::warn;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    CM_Request_Device_EjectW, CR_SUCCESS, PNP_VETO_TYPE,
};

const MAX_PATH: usize = 260;

pub(super) fn request_device_eject(key: &DeviceKey) -> Result<(), Veto> {
    let DeviceKey::DevInst(devinst) = *key else {
        return Err(Veto::new(VetoType::IllegalDeviceRequest, None));
    };

    let mut veto_type = PNP_VETO_TYPE::default();
    let mut veto_name = [0u16; MAX_PATH];
    let result = unsafe {
        CM_Request_Device_EjectW(devinst, Some(&mut veto_type), Some(&mut veto_name), 0)
    };
    if result == CR_SUCCESS {
        return Ok(());
    }

    let reason = VetoType::from_code(veto_type.0);
    if reason == VetoType::InsufficientRights && !is_elevated() {
        warn!("Eject refused for lack of privileges; the process is not elevated");
    }
    let name = from_wide(&veto_name);
    Err(Veto::new(reason, (!name.is_empty()).then_some(name)))
}

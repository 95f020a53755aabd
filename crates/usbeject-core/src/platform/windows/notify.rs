//! Volume interface arrival/removal notifications.
//!
//! The callback runs on a system thread pool. It only forwards to the
//! [`EventSink`], which enqueues a refresh for the owning context.
use crate::error::PlatformError;
use crate::events::HardwareEvent;
use crate::listener::{EventSink, Watch};
use std::ffi::c_void;
use tracing::debug;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    CM_Register_Notification, CM_Unregister_Notification, CM_NOTIFY_ACTION,
    CM_NOTIFY_ACTION_DEVICEINTERFACEARRIVAL, CM_NOTIFY_ACTION_DEVICEINTERFACEREMOVAL,
    CM_NOTIFY_EVENT_DATA, CM_NOTIFY_FILTER, CM_NOTIFY_FILTER_TYPE_DEVICEINTERFACE, CR_SUCCESS,
    HCMNOTIFICATION,
};
use windows::Win32::System::Ioctl::GUID_DEVINTERFACE_VOLUME;

/// A live `CM_Register_Notification` registration.
pub(super) struct Registration {
    handle: Option<HCMNOTIFICATION>,
    // Boxed so the address handed to the OS stays put.
    sink: Box<EventSink>,
}

// The handle is only touched from `stop`, which takes `&mut self`.
unsafe impl Send for Registration {}

pub(super) fn register(sink: EventSink) -> Result<Registration, PlatformError> {
    let sink = Box::new(sink);
    let mut filter = CM_NOTIFY_FILTER {
        cbSize: std::mem::size_of::<CM_NOTIFY_FILTER>() as u32,
        FilterType: CM_NOTIFY_FILTER_TYPE_DEVICEINTERFACE,
        ..Default::default()
    };
    unsafe {
        filter.u.DeviceInterface.ClassGuid = GUID_DEVINTERFACE_VOLUME;
    }

    let mut handle = HCMNOTIFICATION::default();
    let context: *const EventSink = &*sink;
    let result = unsafe {
        CM_Register_Notification(
            &filter,
            Some(context as *const c_void),
            Some(notify_callback),
            &mut handle,
        )
    };
    if result != CR_SUCCESS {
        return Err(PlatformError::api(
            "CM_Register_Notification",
            format!("CONFIGRET {}", result.0),
        ));
    }
    debug!("Registered for volume interface notifications");
    Ok(Registration {
        handle: Some(handle),
        sink,
    })
}

unsafe extern "system" fn notify_callback(
    _notify: HCMNOTIFICATION,
    context: *const c_void,
    action: CM_NOTIFY_ACTION,
    _event_data: *const CM_NOTIFY_EVENT_DATA,
    _event_data_size: u32,
) -> u32 {
    let event = match action {
        CM_NOTIFY_ACTION_DEVICEINTERFACEARRIVAL => HardwareEvent::InterfaceArrival,
        CM_NOTIFY_ACTION_DEVICEINTERFACEREMOVAL => HardwareEvent::InterfaceRemoval,
        _ => HardwareEvent::Other,
    };
    // SAFETY: `context` is the boxed sink owned by the `Registration`,
    // which unregisters before the box is freed.
    if let Some(sink) = (context as *const EventSink).as_ref() {
        sink.notify(event);
    }
    0 // ERROR_SUCCESS
}

impl Watch for Registration {
    fn stop(&mut self) {
        self.sink.close();
        if let Some(handle) = self.handle.take() {
            // Waits for callbacks already in progress to return.
            unsafe {
                let _ = CM_Unregister_Notification(handle);
            }
            debug!("Unregistered volume interface notifications");
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.stop();
    }
}

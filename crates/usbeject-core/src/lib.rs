//! usbeject core: removable volume discovery, hot-plug tracking and
//! whole-device ejection.
//!
//! This crate contains all business logic with zero UI dependencies.
//! Front-ends talk to it through [`VolumeList`] only.
//!
//! # Modules
//!
//! - [`model`]: The public [`Volume`] record, the opaque [`DeviceKey`] and
//!   the transient enumeration entries.
//! - [`enumerate`]: Best-effort drive / volume / disk enumeration.
//! - [`correlate`]: Joins the three enumerations into `Volume` records.
//! - [`listener`]: Hardware change notifications and refresh coalescing.
//! - [`eject`]: Whole-device ejection and veto translation.
//! - [`platform`]: The [`Backend`] seam and its Windows, Linux and
//!   in-memory implementations.
//! - [`volume_list`]: The facade that owns everything above.
pub mod config;
pub mod correlate;
pub mod eject;
pub mod enumerate;
pub mod events;
pub mod error;
pub mod listener;
pub mod model;
pub mod platform;
pub mod volume_list;

pub use config::VolumeListConfig;
pub use eject::{EjectCallback, VetoType};
pub use error::{EjectError, EjectResult, PlatformError};
pub use model::{DeviceKey, DiskEntry, DriveEntry, Snapshot, Volume, VolumeEntry};
pub use platform::Backend;
pub use volume_list::VolumeList;

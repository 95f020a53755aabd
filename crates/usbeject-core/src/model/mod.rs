//! Data model: the public `Volume` snapshot record and the transient
//! per-pass enumeration entries it is built from.
pub mod entries;
pub mod volume;

pub use entries::{DiskEntry, DriveEntry, VolumeEntry};
pub use volume::{DeviceKey, Snapshot, Volume};

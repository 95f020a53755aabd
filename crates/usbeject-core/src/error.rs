//! Error types.
//!
//! Only [`EjectError`] crosses the facade boundary. [`PlatformError`] is
//! produced by backends and absorbed by the enumerators.
use crate::eject::VetoType;
use thiserror::Error;

/// Why an eject request did not detach the device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EjectError {
    /// Index-based request outside the current snapshot. No hardware touched.
    #[error("invalid index {index} (the list holds {len} volumes)")]
    InvalidIndex { index: usize, len: usize },

    /// Another eject is still running. The caller must retry later.
    #[error("an eject request is already in progress")]
    AlreadyInProgress,

    /// The platform refused the removal.
    #[error("{}", .reason.describe(.vetoing_device.as_deref()))]
    Refused {
        reason: VetoType,
        /// Device that vetoed the operation, when the platform named one.
        vetoing_device: Option<String>,
    },
}

/// Outcome delivered to eject callbacks.
pub type EjectResult = Result<(), EjectError>;

/// Failure of a raw platform query.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{api} failed: {message}")]
    Api { api: &'static str, message: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl PlatformError {
    pub fn api(api: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            api,
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

//! Error types for the media organizer
//!
//! Device and volume errors abort a run before any transfer happens.
//! `TransferFailure` and `DateUnresolved` are per-item and are counted by the
//! organizer instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the media organizer
#[derive(Error, Debug)]
pub enum SyncError {
    /// No device is attached to adb
    #[error("No device detected. Connect the phone and enable USB debugging.")]
    DeviceNotFound,

    /// The device is attached but has not authorized this computer
    #[error("Device unauthorized. Accept the USB debugging prompt on the phone.")]
    DeviceUnauthorized,

    /// No removable volume exposes the camera directory
    #[error("No SD card volume with a camera folder was found on the device")]
    VolumeNotFound,

    /// Malformed date, year, month or folder typed by the user
    #[error("Invalid input: {0}")]
    InvalidUserInput(String),

    /// A single pull/push/mkdir did not succeed
    #[error("Transfer failed for '{path}': {message}")]
    TransferFailure { path: String, message: String },

    /// No date source produced a value for this item
    #[error("Could not determine a date for '{0}'")]
    DateUnresolved(String),

    /// The external device tool could not be started
    #[error("Failed to run '{program}': {message}")]
    Command { program: PathBuf, message: String },

    /// Configuration could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl SyncError {
    /// Build a transfer failure for the given path
    pub fn transfer(path: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::TransferFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SyncError::TransferFailure { .. } | SyncError::DateUnresolved(_)
        )
    }
}

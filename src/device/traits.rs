//! Device abstraction traits for testability
//!
//! The organizer never talks to a phone directly. It goes through two narrow
//! traits so the `adb` bridge and the in-memory mock device are interchangeable:
//!
//! - `DeviceSession` - device state and removable volume discovery
//! - `TransferGateway` - listing and moving bytes to and from the device
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sd_media_organizer::device::traits::{DeviceSession, TransferGateway};
//!
//! fn list_camera<D: DeviceSession + TransferGateway>(device: &D) -> Result<(), String> {
//!     device.ensure_ready().map_err(|e| e.to_string())?;
//!     if let Some(camera) = device.detect_media_volume().map_err(|e| e.to_string())? {
//!         for name in device.list_remote_entries(&camera).map_err(|e| e.to_string())? {
//!             println!("{}", name);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use crate::core::error::{Result, SyncError};
use crate::core::media::join_remote;
use log::debug;
use std::fmt::{self, Display};
use std::path::Path;

/// Connection state reported by the device tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    /// Attached and authorized
    Ready,
    /// Attached, waiting for the USB debugging prompt to be accepted
    Unauthorized,
    /// Nothing attached
    #[default]
    Absent,
}

impl DeviceState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceState::Ready)
    }

    /// Get a human-readable name for this state
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceState::Ready => "connected",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Absent => "not found",
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Where removable volumes and their camera folder live on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLayout {
    /// Directory listing the storage volumes, e.g. `/storage`
    pub storage_root: String,
    /// Camera folder inside a volume, e.g. `DCIM/Camera`
    pub camera_dir: String,
}

impl Default for VolumeLayout {
    fn default() -> Self {
        Self {
            storage_root: "/storage".to_string(),
            camera_dir: "DCIM/Camera".to_string(),
        }
    }
}

impl VolumeLayout {
    /// Camera folder of the given volume
    pub fn camera_path(&self, volume: &str) -> String {
        join_remote(&join_remote(&self.storage_root, volume), &self.camera_dir)
    }
}

/// Whether a volume name has the removable storage slot shape `XXXX-XXXX`
pub fn is_storage_slot_name(name: &str) -> bool {
    name.len() == 9
        && name.char_indices().all(|(i, c)| {
            if i == 4 {
                c == '-'
            } else {
                c.is_ascii_alphanumeric()
            }
        })
}

/// Device discovery
pub trait DeviceSession {
    /// Current connection state
    fn device_state(&self) -> Result<DeviceState>;

    /// Names of the entries under the storage root
    fn list_volumes(&self) -> Result<Vec<String>>;

    /// Whether a remote path exists
    fn path_exists(&self, remote_path: &str) -> Result<bool>;

    /// Volume layout used for media volume detection
    fn volume_layout(&self) -> &VolumeLayout;

    /// Fail unless the device is attached and authorized
    fn ensure_ready(&self) -> Result<()> {
        match self.device_state()? {
            DeviceState::Ready => Ok(()),
            DeviceState::Unauthorized => Err(SyncError::DeviceUnauthorized),
            DeviceState::Absent => Err(SyncError::DeviceNotFound),
        }
    }

    /// Camera folder of the first storage slot volume that has one
    fn detect_media_volume(&self) -> Result<Option<String>> {
        let layout = self.volume_layout();
        for volume in self.list_volumes()? {
            if !is_storage_slot_name(&volume) {
                continue;
            }
            let camera = layout.camera_path(&volume);
            if self.path_exists(&camera)? {
                debug!("Media volume found: {}", camera);
                return Ok(Some(camera));
            }
            debug!("Volume {} has no camera folder", volume);
        }
        Ok(None)
    }
}

/// Byte transfer to and from the device
///
/// Every call returns the tool's diagnostic text on success and a
/// [`SyncError::TransferFailure`] on failure.
pub trait TransferGateway {
    /// File names inside a remote directory
    fn list_remote_entries(&self, remote_dir: &str) -> Result<Vec<String>>;

    /// Copy a remote file (or directory) to a local path
    fn pull(&self, remote_path: &str, local_path: &Path, preserve_timestamps: bool)
        -> Result<String>;

    /// Copy a local file to a remote path
    fn push(&self, local_path: &Path, remote_path: &str, preserve_timestamps: bool)
        -> Result<String>;

    /// Create a remote directory and its parents
    fn make_remote_directory(&self, remote_path: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct FakeSession {
        state: DeviceState,
        volumes: Vec<String>,
        existing: HashSet<String>,
        layout: VolumeLayout,
    }

    impl FakeSession {
        fn new(state: DeviceState, volumes: &[&str], existing: &[&str]) -> Self {
            Self {
                state,
                volumes: volumes.iter().map(|s| s.to_string()).collect(),
                existing: existing.iter().map(|s| s.to_string()).collect(),
                layout: VolumeLayout::default(),
            }
        }
    }

    impl DeviceSession for FakeSession {
        fn device_state(&self) -> Result<DeviceState> {
            Ok(self.state)
        }

        fn list_volumes(&self) -> Result<Vec<String>> {
            Ok(self.volumes.clone())
        }

        fn path_exists(&self, remote_path: &str) -> Result<bool> {
            Ok(self.existing.contains(remote_path))
        }

        fn volume_layout(&self) -> &VolumeLayout {
            &self.layout
        }
    }

    #[test]
    fn test_storage_slot_shape() {
        assert!(is_storage_slot_name("1234-ABCD"));
        assert!(is_storage_slot_name("0A1B-2C3D"));
        assert!(!is_storage_slot_name("emulated"));
        assert!(!is_storage_slot_name("self"));
        assert!(!is_storage_slot_name("1234ABCD-"));
        assert!(!is_storage_slot_name("12-34ABCD"));
        assert!(!is_storage_slot_name("1234-ABCDE"));
    }

    #[test]
    fn test_detect_picks_first_slot_with_camera() {
        let session = FakeSession::new(
            DeviceState::Ready,
            &["emulated", "self", "AAAA-0000", "1234-ABCD"],
            &["/storage/1234-ABCD/DCIM/Camera"],
        );

        assert_eq!(
            session.detect_media_volume().unwrap().as_deref(),
            Some("/storage/1234-ABCD/DCIM/Camera")
        );
    }

    #[test]
    fn test_detect_ignores_internal_storage() {
        let session = FakeSession::new(
            DeviceState::Ready,
            &["emulated"],
            &["/storage/emulated/DCIM/Camera"],
        );
        assert_eq!(session.detect_media_volume().unwrap(), None);
    }

    #[test]
    fn test_ensure_ready_maps_states() {
        assert!(FakeSession::new(DeviceState::Ready, &[], &[])
            .ensure_ready()
            .is_ok());
        assert!(matches!(
            FakeSession::new(DeviceState::Unauthorized, &[], &[]).ensure_ready(),
            Err(SyncError::DeviceUnauthorized)
        ));
        assert!(matches!(
            FakeSession::new(DeviceState::Absent, &[], &[]).ensure_ready(),
            Err(SyncError::DeviceNotFound)
        ));
    }

    #[test]
    fn test_camera_path() {
        let layout = VolumeLayout {
            storage_root: "/storage/".to_string(),
            camera_dir: "DCIM/Camera".to_string(),
        };
        assert_eq!(layout.camera_path("1234-ABCD"), "/storage/1234-ABCD/DCIM/Camera");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(DeviceState::Ready.to_string(), "connected");
        assert_eq!(DeviceState::default(), DeviceState::Absent);
        assert!(!DeviceState::Unauthorized.is_ready());
    }
}

//! Mock device implementation for testing without a real phone
//!
//! `MockDevice` keeps an in-memory remote file system and implements both
//! `DeviceSession` and `TransferGateway`. Every call is recorded so tests can
//! assert on what the organizer asked the device to do (or that it asked
//! nothing at all).

use crate::core::error::{Result, SyncError};
use crate::core::media::join_remote;
use crate::device::traits::{DeviceSession, DeviceState, TransferGateway, VolumeLayout};
use filetime::FileTime;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// Volume name used by [`MockDevice::with_sd_card`]
pub const MOCK_VOLUME: &str = "1234-ABCD";

/// A file on the mock device
#[derive(Debug, Clone)]
pub struct MockFile {
    pub content: Vec<u8>,
    pub modified: Option<SystemTime>,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    State,
    ListVolumes,
    PathExists(String),
    List(String),
    Pull {
        remote: String,
        local: PathBuf,
        preserve: bool,
    },
    Push {
        local: PathBuf,
        remote: String,
        preserve: bool,
    },
    MakeDirectory(String),
}

/// Configuration for mock device behavior
#[derive(Debug, Clone)]
pub struct MockDeviceConfig {
    /// Reported connection state
    pub state: DeviceState,
    /// Remote paths whose pull or push fails
    pub failing_paths: Vec<String>,
    /// Volume layout used for detection
    pub layout: VolumeLayout,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        Self {
            state: DeviceState::Ready,
            failing_paths: Vec::new(),
            layout: VolumeLayout::default(),
        }
    }
}

/// Remote file system state
#[derive(Debug, Default)]
struct MockFileSystem {
    files: BTreeMap<String, MockFile>,
    directories: BTreeSet<String>,
}

impl MockFileSystem {
    fn add_directory(&mut self, path: &str) {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = format!("{}/{}", current, part);
            self.directories.insert(current.clone());
        }
    }

    fn add_file(&mut self, path: &str, file: MockFile) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_directory(parent);
        }
        self.files.insert(path.to_string(), file);
    }

    fn is_directory(&self, path: &str) -> bool {
        self.directories.contains(normalize(path))
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", normalize(dir));
        let names: BTreeSet<String> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        names.into_iter().collect()
    }

    fn files_under(&self, dir: &str) -> Vec<(String, MockFile)> {
        let prefix = format!("{}/", normalize(dir));
        self.files
            .iter()
            .filter_map(|(path, file)| {
                path.strip_prefix(&prefix)
                    .map(|rel| (rel.to_string(), file.clone()))
            })
            .collect()
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// In-memory device implementing both collaborator traits
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    fs: Arc<RwLock<MockFileSystem>>,
    calls: Arc<RwLock<Vec<DeviceCall>>>,
    config: MockDeviceConfig,
}

impl MockDevice {
    /// Create a connected device with nothing on it
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specific configuration
    pub fn with_config(config: MockDeviceConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Device with internal storage and an SD card that has a camera folder
    pub fn with_sd_card() -> Self {
        let device = Self::new();
        {
            let mut remote = device.write_fs();
            remote.add_directory("/storage/emulated/0/DCIM/Camera");
            remote.add_directory("/storage/self");
            remote.add_directory(&device.camera_dir());
        }
        device
    }

    /// Camera folder on the mock SD card
    pub fn camera_dir(&self) -> String {
        self.config.layout.camera_path(MOCK_VOLUME)
    }

    /// Add a file with the given content
    pub fn add_file(&self, remote_path: &str, content: &[u8]) {
        self.write_fs().add_file(
            remote_path,
            MockFile {
                content: content.to_vec(),
                modified: None,
            },
        );
    }

    /// Add a file with a specific modification time
    pub fn add_file_with_mtime(&self, remote_path: &str, content: &[u8], modified: SystemTime) {
        self.write_fs().add_file(
            remote_path,
            MockFile {
                content: content.to_vec(),
                modified: Some(modified),
            },
        );
    }

    /// Add a file to the SD card camera folder
    pub fn add_camera_file(&self, name: &str) {
        let path = join_remote(&self.camera_dir(), name);
        self.add_file(&path, name.as_bytes());
    }

    /// Add an empty directory
    pub fn add_directory(&self, remote_path: &str) {
        self.write_fs().add_directory(remote_path);
    }

    /// Make pulls and pushes of `remote_path` fail
    pub fn fail_on(&mut self, remote_path: &str) {
        self.config.failing_paths.push(remote_path.to_string());
    }

    pub fn set_state(&mut self, state: DeviceState) {
        self.config.state = state;
    }

    /// Content of a remote file
    pub fn file(&self, remote_path: &str) -> Option<MockFile> {
        self.read_fs().files.get(remote_path).cloned()
    }

    /// All remote file paths
    pub fn remote_files(&self) -> Vec<String> {
        self.read_fs().files.keys().cloned().collect()
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Recorded pushes as `(local, remote, preserve)`
    pub fn pushes(&self) -> Vec<(PathBuf, String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Push {
                    local,
                    remote,
                    preserve,
                } => Some((local, remote, preserve)),
                _ => None,
            })
            .collect()
    }

    /// Recorded pulls as `(remote, local, preserve)`
    pub fn pulls(&self) -> Vec<(String, PathBuf, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Pull {
                    remote,
                    local,
                    preserve,
                } => Some((remote, local, preserve)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DeviceCall) {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(call);
        }
    }

    fn read_fs(&self) -> std::sync::RwLockReadGuard<'_, MockFileSystem> {
        self.fs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_fs(&self) -> std::sync::RwLockWriteGuard<'_, MockFileSystem> {
        self.fs.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self, remote_path: &str) -> Result<()> {
        if self.config.failing_paths.iter().any(|p| p == remote_path) {
            return Err(SyncError::transfer(remote_path, "simulated transfer error"));
        }
        Ok(())
    }
}

fn write_local(local_path: &Path, file: &MockFile, preserve: bool) -> Result<()> {
    fs::write(local_path, &file.content)
        .map_err(|e| SyncError::transfer(local_path.display().to_string(), e.to_string()))?;
    if preserve {
        if let Some(modified) = file.modified {
            filetime::set_file_mtime(local_path, FileTime::from_system_time(modified))?;
        }
    }
    Ok(())
}

impl DeviceSession for MockDevice {
    fn device_state(&self) -> Result<DeviceState> {
        self.record(DeviceCall::State);
        Ok(self.config.state)
    }

    fn list_volumes(&self) -> Result<Vec<String>> {
        self.record(DeviceCall::ListVolumes);
        Ok(self.read_fs().children(&self.config.layout.storage_root))
    }

    fn path_exists(&self, remote_path: &str) -> Result<bool> {
        self.record(DeviceCall::PathExists(remote_path.to_string()));
        let remote = self.read_fs();
        Ok(remote.files.contains_key(remote_path) || remote.is_directory(remote_path))
    }

    fn volume_layout(&self) -> &VolumeLayout {
        &self.config.layout
    }
}

impl TransferGateway for MockDevice {
    fn list_remote_entries(&self, remote_dir: &str) -> Result<Vec<String>> {
        self.record(DeviceCall::List(remote_dir.to_string()));
        let remote = self.read_fs();
        if !remote.is_directory(remote_dir) {
            return Err(SyncError::transfer(remote_dir, "No such file or directory"));
        }
        Ok(remote.children(remote_dir))
    }

    fn pull(&self, remote_path: &str, local_path: &Path, preserve_timestamps: bool) -> Result<String> {
        self.record(DeviceCall::Pull {
            remote: remote_path.to_string(),
            local: local_path.to_path_buf(),
            preserve: preserve_timestamps,
        });
        self.check_failure(remote_path)?;

        let remote = self.read_fs();
        if let Some(file) = remote.files.get(remote_path) {
            write_local(local_path, file, preserve_timestamps)?;
            return Ok(format!("{}: 1 file pulled", remote_path));
        }

        if remote.is_directory(remote_path) {
            // Like adb, a directory lands inside the local folder under its own name
            let name = remote_path.rsplit('/').next().unwrap_or(remote_path);
            let target = local_path.join(name);
            let files = remote.files_under(remote_path);
            for (relative, file) in &files {
                let local = target.join(relative);
                if let Some(parent) = local.parent() {
                    fs::create_dir_all(parent)?;
                }
                write_local(&local, file, preserve_timestamps)?;
            }
            return Ok(format!("{}: {} files pulled", remote_path, files.len()));
        }

        Err(SyncError::transfer(
            remote_path,
            "remote object does not exist",
        ))
    }

    fn push(&self, local_path: &Path, remote_path: &str, preserve_timestamps: bool) -> Result<String> {
        self.record(DeviceCall::Push {
            local: local_path.to_path_buf(),
            remote: remote_path.to_string(),
            preserve: preserve_timestamps,
        });
        self.check_failure(remote_path)?;

        let content = fs::read(local_path)
            .map_err(|e| SyncError::transfer(remote_path, e.to_string()))?;
        let modified = if preserve_timestamps {
            fs::metadata(local_path).and_then(|m| m.modified()).ok()
        } else {
            None
        };

        self.write_fs()
            .add_file(remote_path, MockFile { content, modified });
        Ok(format!("{}: 1 file pushed", local_path.display()))
    }

    fn make_remote_directory(&self, remote_path: &str) -> Result<()> {
        self.record(DeviceCall::MakeDirectory(remote_path.to_string()));
        self.write_fs().add_directory(remote_path);
        Ok(())
    }
}

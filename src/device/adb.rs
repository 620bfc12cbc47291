//! Android Debug Bridge implementation of the device traits
//!
//! Every operation is one `adb` invocation. The exit status decides success;
//! stdout is returned as diagnostic text and stderr becomes the error message.

use crate::core::config::DeviceConfig;
use crate::core::error::{Result, SyncError};
use crate::device::traits::{DeviceSession, DeviceState, TransferGateway, VolumeLayout};
use log::{debug, info, trace};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Text `adb shell ls` prints for a missing path
const MISSING_PATH: &str = "No such file or directory";

/// One line of `adb devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDevice {
    pub serial: String,
    pub state: DeviceState,
}

/// Parse the output of `adb devices`
pub fn parse_device_list(output: &str) -> Vec<AttachedDevice> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = match fields.next()? {
                "device" => DeviceState::Ready,
                "unauthorized" => DeviceState::Unauthorized,
                _ => DeviceState::Absent,
            };
            Some(AttachedDevice {
                serial: serial.to_string(),
                state,
            })
        })
        .collect()
}

/// Quote a remote path for the device shell
fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

/// `adb` wrapper bound to one device
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb_path: PathBuf,
    serial: Option<String>,
    layout: VolumeLayout,
}

impl AdbBridge {
    pub fn new<P: Into<PathBuf>>(adb_path: P, serial: Option<String>, layout: VolumeLayout) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
            layout,
        }
    }

    /// Bridge for the `[device]` config section
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(
            &config.adb_path,
            config.serial.clone(),
            VolumeLayout {
                storage_root: config.storage_root.clone(),
                camera_dir: config.camera_dir.clone(),
            },
        )
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Devices currently known to adb
    pub fn devices(&self) -> Result<Vec<AttachedDevice>> {
        let output = self.run_global(["devices"])?;
        Ok(parse_device_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Run adb without selecting a device
    fn run_global<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.spawn(args.into_iter().map(Into::into).collect())
    }

    /// Run adb against the configured device
    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut full: Vec<OsString> = Vec::new();
        if let Some(serial) = &self.serial {
            full.push("-s".into());
            full.push(serial.into());
        }
        full.extend(args.into_iter().map(Into::into));
        self.spawn(full)
    }

    fn spawn(&self, args: Vec<OsString>) -> Result<Output> {
        trace!("{} {:?}", self.adb_path.display(), args);
        Command::new(&self.adb_path)
            .args(&args)
            .output()
            .map_err(|e| SyncError::Command {
                program: self.adb_path.clone(),
                message: e.to_string(),
            })
    }

    /// `adb shell ls` of a remote path; `None` when the path does not exist
    fn shell_ls(&self, remote_path: &str) -> Result<Option<String>> {
        let output = self.run(["shell".to_string(), format!("ls {}", shell_quote(remote_path))])?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() || stdout.contains(MISSING_PATH) || stderr.contains(MISSING_PATH) {
            return Ok(None);
        }
        Ok(Some(stdout))
    }
}

/// Turn an adb exit status into the tagged result
fn transfer_result(path: &str, output: Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = if stderr.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.trim().to_string()
    };
    Err(SyncError::transfer(path, message))
}

impl DeviceSession for AdbBridge {
    fn device_state(&self) -> Result<DeviceState> {
        let devices = self.devices()?;
        let state = match &self.serial {
            Some(serial) => devices
                .iter()
                .find(|d| &d.serial == serial)
                .map(|d| d.state)
                .unwrap_or(DeviceState::Absent),
            None => devices
                .iter()
                .map(|d| d.state)
                .find(DeviceState::is_ready)
                .or_else(|| devices.first().map(|d| d.state))
                .unwrap_or(DeviceState::Absent),
        };
        debug!("Device state: {}", state);
        Ok(state)
    }

    fn list_volumes(&self) -> Result<Vec<String>> {
        let listing = self
            .shell_ls(&self.layout.storage_root)?
            .unwrap_or_default();
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn path_exists(&self, remote_path: &str) -> Result<bool> {
        Ok(self.shell_ls(remote_path)?.is_some())
    }

    fn volume_layout(&self) -> &VolumeLayout {
        &self.layout
    }
}

impl TransferGateway for AdbBridge {
    fn list_remote_entries(&self, remote_dir: &str) -> Result<Vec<String>> {
        let listing = self
            .shell_ls(remote_dir)?
            .ok_or_else(|| SyncError::transfer(remote_dir, MISSING_PATH))?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn pull(&self, remote_path: &str, local_path: &Path, preserve_timestamps: bool) -> Result<String> {
        let mut args: Vec<OsString> = vec!["pull".into()];
        if preserve_timestamps {
            args.push("-a".into());
        }
        args.push(remote_path.into());
        args.push(local_path.into());
        transfer_result(remote_path, self.run(args)?)
    }

    fn push(&self, local_path: &Path, remote_path: &str, preserve_timestamps: bool) -> Result<String> {
        let mut args: Vec<OsString> = vec!["push".into()];
        if preserve_timestamps {
            args.push("-a".into());
        }
        args.push(local_path.into());
        args.push(remote_path.into());
        transfer_result(remote_path, self.run(args)?)
    }

    fn make_remote_directory(&self, remote_path: &str) -> Result<()> {
        let output = self.run(["shell".to_string(), format!("mkdir -p {}", shell_quote(remote_path))])?;
        transfer_result(remote_path, output).map(|_| ())
    }
}

/// Start a screen mirroring session and wait for it to end
pub fn launch_mirroring(program: &Path, serial: Option<&str>) -> Result<()> {
    info!("Starting {}", program.display());
    let mut command = Command::new(program);
    if let Some(serial) = serial {
        command.arg(format!("--serial={}", serial));
    }

    let status = command.status().map_err(|e| SyncError::Command {
        program: program.to_path_buf(),
        message: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(SyncError::Command {
            program: program.to_path_buf(),
            message: format!("exited with {}", status),
        })
    }
}

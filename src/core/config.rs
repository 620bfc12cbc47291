//! Configuration module for the media organizer
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\sd_media_organizer\config.toml
//! - Linux: ~/.config/sd_media_organizer/config.toml
//! - macOS: ~/Library/Application Support/sd_media_organizer/config.toml

use crate::core::media::MediaKind;
use crate::core::placement::MonthNames;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "sd_media_organizer";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config files looked up in the working directory before the standard location
const LOCAL_CONFIG_FILES: &[&str] = &["./config.toml", "./sd_media.toml"];

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Write the commented default config to `path`, or to the standard location.
///
/// Returns the path that was written.
pub fn write_default_config(path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let target = match path {
        Some(p) => p,
        None => ensure_config_dir()?.join(CONFIG_FILE_NAME),
    };

    fs::write(&target, Config::generate_default_config())
        .map_err(|e| ConfigError::WriteError(target.clone(), e.to_string()))?;

    Ok(target)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device and external tool settings
    pub device: DeviceConfig,

    /// Local folders the modes write into
    pub paths: PathsConfig,

    /// Recognized media files
    pub media: MediaConfig,

    /// Month folder names
    pub locale: LocaleConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Device configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Path to the adb executable
    pub adb_path: PathBuf,

    /// Path to the screen mirroring executable (scrcpy)
    pub mirror_path: PathBuf,

    /// Serial of the device to use when several are attached
    pub serial: Option<String>,

    /// Directory on the device that lists the storage volumes
    pub storage_root: String,

    /// Camera directory inside a removable volume
    pub camera_dir: String,

    /// Remote directories holding messaging app media
    pub messaging_dirs: Vec<String>,
}

/// Local destination folders
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the year/month backup tree
    pub backup_dir: PathBuf,

    /// Parent folder of the flat per-day and per-month folders
    pub extract_dir: PathBuf,

    /// Local copy of the messaging app media
    pub messaging_dir: PathBuf,

    /// Folder name for items without a date
    pub undated_folder: String,
}

/// Media file recognition
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Image extensions (lowercase, no dot)
    pub image_extensions: Vec<String>,

    /// Video extensions (lowercase, no dot)
    pub video_extensions: Vec<String>,

    /// Name prefix of soft-deleted files
    pub trash_prefix: String,
}

/// Month folder naming
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Display names for months 1-12
    pub month_names: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            mirror_path: PathBuf::from("scrcpy"),
            serial: None,
            storage_root: "/storage".to_string(),
            camera_dir: "DCIM/Camera".to_string(),
            messaging_dirs: vec![
                "/storage/emulated/0/Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Images"
                    .to_string(),
                "/storage/emulated/0/Android/media/com.whatsapp/WhatsApp/Media/WhatsApp Video"
                    .to_string(),
            ],
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("Fotos Camara"),
            extract_dir: PathBuf::from("."),
            messaging_dir: PathBuf::from("WhatsApp Media"),
            undated_folder: "SinFecha".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["jpg", "jpeg", "png", "heic"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            video_extensions: ["mp4", "mov", "avi", "3gp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trash_prefix: ".trashed-".to_string(),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            month_names: MonthNames::spanish().names().to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./sd_media.log"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./config.toml
    /// 2. ./sd_media.toml
    /// 3. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Self::get_active_config_path()).or_else(|e| match e {
            ConfigError::FileNotFound(_) => Ok(Self::default()),
            other => Err(other),
        })
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        for path in LOCAL_CONFIG_FILES {
            let path = PathBuf::from(path);
            if path.exists() {
                return path;
            }
        }

        get_config_path().unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILES[0]))
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locale.month_names.len() != 12 {
            return Err(ConfigError::Invalid(format!(
                "locale.month_names must have 12 entries, found {}",
                self.locale.month_names.len()
            )));
        }
        if self.media.image_extensions.is_empty() && self.media.video_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "media.image_extensions and media.video_extensions are both empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the immutable settings handed to the organizer
    pub fn organizer_config(&self) -> Result<OrganizerConfig, ConfigError> {
        self.validate()?;
        let month_names = MonthNames::from_slice(&self.locale.month_names)
            .ok_or_else(|| ConfigError::Invalid("locale.month_names is malformed".to_string()))?;

        Ok(OrganizerConfig {
            image_extensions: normalize_extensions(&self.media.image_extensions),
            video_extensions: normalize_extensions(&self.media.video_extensions),
            trash_prefix: self.media.trash_prefix.clone(),
            month_names,
            backup_dir: self.paths.backup_dir.clone(),
            extract_dir: self.paths.extract_dir.clone(),
            messaging_dir: self.paths.messaging_dir.clone(),
            undated_folder: self.paths.undated_folder.clone(),
        })
    }
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Settings the organizer reads during a run.
///
/// Built once from [`Config`] and never mutated, so tests can run side by side
/// with different locales or extension sets.
#[derive(Debug, Clone)]
pub struct OrganizerConfig {
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    pub trash_prefix: String,
    pub month_names: MonthNames,
    pub backup_dir: PathBuf,
    pub extract_dir: PathBuf,
    pub messaging_dir: PathBuf,
    pub undated_folder: String,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        let media = MediaConfig::default();
        let paths = PathsConfig::default();
        Self {
            image_extensions: media.image_extensions,
            video_extensions: media.video_extensions,
            trash_prefix: media.trash_prefix,
            month_names: MonthNames::spanish(),
            backup_dir: paths.backup_dir,
            extract_dir: paths.extract_dir,
            messaging_dir: paths.messaging_dir,
            undated_folder: paths.undated_folder,
        }
    }
}

impl OrganizerConfig {
    /// Classify a lowercase extension
    pub fn classify(&self, extension: &str) -> MediaKind {
        if self.image_extensions.iter().any(|e| e == extension) {
            MediaKind::Image
        } else if self.video_extensions.iter().any(|e| e == extension) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    /// Whether a name carries the soft-delete marker
    pub fn is_trashed(&self, name: &str) -> bool {
        !self.trash_prefix.is_empty() && name.starts_with(&self.trash_prefix)
    }

    /// Point every root at `base`, keeping the default folder names
    pub fn rooted_at(mut self, base: &Path) -> Self {
        self.backup_dir = base.join(&self.backup_dir);
        self.extract_dir = base.join(&self.extract_dir);
        self.messaging_dir = base.join(&self.messaging_dir);
        self
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
    /// Parsed values are not usable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::core::error::SyncError {
    fn from(err: ConfigError) -> Self {
        crate::core::error::SyncError::Config(err.to_string())
    }
}

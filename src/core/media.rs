//! Media items as enumerated from the device or a local folder

use crate::core::config::OrganizerConfig;
use crate::core::date::ResolvedDate;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Kind of media, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn is_media(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

/// A file considered for organization
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// File name without directories
    pub name: String,
    /// Full remote path, or the local path for local sources
    pub remote_identifier: String,
    /// Lowercase extension without the dot
    pub extension: String,
    pub kind: MediaKind,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
    /// Set once, when the organizer dates the item
    pub resolved_date: Option<ResolvedDate>,
}

impl MediaItem {
    /// Item for a file listed in a remote directory
    pub fn remote(dir: &str, name: &str, config: &OrganizerConfig) -> Self {
        let extension = extension_of(name);
        Self {
            name: name.to_string(),
            remote_identifier: join_remote(dir, name),
            kind: config.classify(&extension),
            extension,
            size: None,
            modified: None,
            resolved_date: None,
        }
    }

    /// Item for a file already on the local disk
    pub fn local(path: &Path, config: &OrganizerConfig) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension_of(&name);
        let metadata = std::fs::metadata(path).ok();
        Self {
            remote_identifier: path.to_string_lossy().into_owned(),
            kind: config.classify(&extension),
            extension,
            size: metadata.as_ref().map(|m| m.len()),
            modified: metadata.and_then(|m| m.modified().ok()),
            resolved_date: None,
            name,
        }
    }

    /// Local path of a local item
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(&self.remote_identifier)
    }
}

/// Lowercase extension of a file name, empty when there is none
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Join a remote directory and a name with the device's '/' separator
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
    }
}

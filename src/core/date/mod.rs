//! Capture date resolution
//!
//! Dates come from three sources, tried in this order:
//! 1. the file name (always wins when it matches)
//! 2. embedded metadata, for images only
//! 3. the local modification time
//!
//! Whichever source wins is recorded as the [`Provenance`] for diagnostics;
//! placement only looks at year and month.

pub mod exif;
pub mod filename;

use crate::core::error::{Result, SyncError};
use crate::core::media::{MediaItem, MediaKind};
use chrono::{DateTime, Local, NaiveDate};
use log::trace;
use std::fmt;
use std::path::Path;
use std::time::SystemTime;

pub use exif::{ExifReader, MetadataReader};
pub use filename::{parse_filename_date, parse_messaging_date, FilenameDate, NameConvention};

/// Which source produced a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Filename,
    Metadata,
    MtimeFallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Provenance::Filename => "filename",
            Provenance::Metadata => "metadata",
            Provenance::MtimeFallback => "mtime-fallback",
        };
        f.write_str(tag)
    }
}

/// A capture date together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub provenance: Provenance,
}

/// Runs the filename → metadata → mtime chain
#[derive(Debug, Clone, Default)]
pub struct DateResolver<R: MetadataReader> {
    reader: R,
}

impl<R: MetadataReader> DateResolver<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Resolve the capture date of `item`.
    ///
    /// `local` is where the item's bytes can be inspected; without it only the
    /// file name is consulted.
    pub fn resolve(&self, item: &MediaItem, local: Option<&Path>) -> Result<ResolvedDate> {
        if let Some(parsed) = parse_filename_date(&item.name) {
            return Ok(ResolvedDate {
                date: parsed.date,
                provenance: Provenance::Filename,
            });
        }

        let local = local.ok_or_else(|| SyncError::DateUnresolved(item.name.clone()))?;

        let resolved = match item.kind {
            MediaKind::Image => self
                .from_metadata(local)
                .or_else(|| from_mtime(local)),
            MediaKind::Video | MediaKind::Other => from_mtime(local),
        };

        resolved.ok_or_else(|| SyncError::DateUnresolved(item.name.clone()))
    }

    fn from_metadata(&self, local: &Path) -> Option<ResolvedDate> {
        let captured = self.reader.read_capture_time(local)?;
        trace!("Metadata date for {}: {}", local.display(), captured);
        Some(ResolvedDate {
            date: captured.date(),
            provenance: Provenance::Metadata,
        })
    }
}

fn from_mtime(local: &Path) -> Option<ResolvedDate> {
    let modified = std::fs::metadata(local).ok()?.modified().ok()?;
    Some(ResolvedDate {
        date: local_date(modified),
        provenance: Provenance::MtimeFallback,
    })
}

/// Calendar date of a timestamp in the local timezone
pub fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::OrganizerConfig;
    use chrono::NaiveDateTime;
    use filetime::FileTime;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Reader returning a fixed timestamp for every file
    struct FixedReader(Option<NaiveDateTime>);

    impl MetadataReader for FixedReader {
        fn read_capture_time(&self, _path: &Path) -> Option<NaiveDateTime> {
            self.0
        }
    }

    fn fixed(s: &str) -> FixedReader {
        FixedReader(Some(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap(),
        ))
    }

    fn write_file(dir: &TempDir, name: &str, mtime: Option<&str>) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"media").unwrap();
        if let Some(mtime) = mtime {
            let local = NaiveDateTime::parse_from_str(mtime, "%Y-%m-%d %H:%M:%S")
                .unwrap()
                .and_local_timezone(Local)
                .unwrap();
            filetime::set_file_mtime(&path, FileTime::from_unix_time(local.timestamp(), 0))
                .unwrap();
        }
        path
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filename_beats_conflicting_metadata() {
        let temp = TempDir::new().unwrap();
        let config = OrganizerConfig::default();
        let path = write_file(&temp, "IMG_20250601_101000.jpg", Some("2019-03-03 12:00:00"));
        let item = MediaItem::local(&path, &config);

        let resolver = DateResolver::new(fixed("2020-01-01 00:00:00"));
        let resolved = resolver.resolve(&item, Some(&path)).unwrap();

        assert_eq!(resolved.date, ymd(2025, 6, 1));
        assert_eq!(resolved.provenance, Provenance::Filename);
    }

    #[test]
    fn test_image_uses_metadata() {
        let temp = TempDir::new().unwrap();
        let config = OrganizerConfig::default();
        let path = write_file(&temp, "holiday.jpg", Some("2019-03-03 12:00:00"));
        let item = MediaItem::local(&path, &config);

        let resolver = DateResolver::new(fixed("2020-08-15 09:30:00"));
        let resolved = resolver.resolve(&item, Some(&path)).unwrap();

        assert_eq!(resolved.date, ymd(2020, 8, 15));
        assert_eq!(resolved.provenance, Provenance::Metadata);
    }

    #[test]
    fn test_image_without_metadata_falls_back_to_mtime() {
        let temp = TempDir::new().unwrap();
        let config = OrganizerConfig::default();
        let path = write_file(&temp, "holiday.png", Some("2019-03-03 12:00:00"));
        let item = MediaItem::local(&path, &config);

        let resolved = DateResolver::new(FixedReader(None))
            .resolve(&item, Some(&path))
            .unwrap();

        assert_eq!(resolved.date, ymd(2019, 3, 3));
        assert_eq!(resolved.provenance, Provenance::MtimeFallback);
    }

    #[test]
    fn test_video_skips_metadata() {
        let temp = TempDir::new().unwrap();
        let config = OrganizerConfig::default();
        let path = write_file(&temp, "clip.mp4", Some("2018-11-20 18:00:00"));
        let item = MediaItem::local(&path, &config);

        let resolved = DateResolver::new(fixed("2020-08-15 09:30:00"))
            .resolve(&item, Some(&path))
            .unwrap();

        assert_eq!(resolved.date, ymd(2018, 11, 20));
        assert_eq!(resolved.provenance, Provenance::MtimeFallback);
    }

    #[test]
    fn test_unreadable_file_is_unresolved() {
        let temp = TempDir::new().unwrap();
        let config = OrganizerConfig::default();
        let item = MediaItem::remote("/sd", "holiday.jpg", &config);
        let missing = temp.path().join("holiday.jpg");

        let result = DateResolver::new(FixedReader(None)).resolve(&item, Some(&missing));
        assert!(matches!(result, Err(SyncError::DateUnresolved(name)) if name == "holiday.jpg"));
    }

    #[test]
    fn test_name_only_resolution() {
        let config = OrganizerConfig::default();
        let resolver = DateResolver::new(ExifReader);

        let dated = MediaItem::remote("/sd", "VID_20250528_134740.mp4", &config);
        assert_eq!(resolver.resolve(&dated, None).unwrap().date, ymd(2025, 5, 28));

        let undated = MediaItem::remote("/sd", "clip.mp4", &config);
        assert!(resolver.resolve(&undated, None).is_err());
    }

    #[test]
    fn test_provenance_tags() {
        assert_eq!(Provenance::Filename.to_string(), "filename");
        assert_eq!(Provenance::Metadata.to_string(), "metadata");
        assert_eq!(Provenance::MtimeFallback.to_string(), "mtime-fallback");
    }
}

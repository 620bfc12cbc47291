//! Embedded capture time of image files

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag};
use log::trace;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Source of embedded capture timestamps
pub trait MetadataReader {
    /// Capture time stored inside the file, if present and well formed
    fn read_capture_time(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Reads EXIF `DateTimeOriginal` (then `DateTimeDigitized`, then `DateTime`)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl MetadataReader for ExifReader {
    fn read_capture_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let file = File::open(path).ok()?;
        let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
            Ok(exif) => exif,
            Err(e) => {
                trace!("No EXIF in {}: {}", path.display(), e);
                return None;
            }
        };

        [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
            .iter()
            .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
            .find_map(|field| parse_exif_datetime(&field.display_value().to_string()))
    }
}

/// Parse the `YYYY:MM:DD HH:MM:SS` EXIF layout, tolerating other separators.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s.trim().replace(['-', '/', '\\', '.'], ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    let day = cleaned.split(' ').next()?;
    NaiveDate::parse_from_str(day, "%Y:%m:%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}

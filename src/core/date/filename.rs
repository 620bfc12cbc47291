//! Capture dates encoded in file names

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Camera apps: `IMG_20250101_120000.jpg`, `VID_20250528_134740.mp4`, `20250101_120000.jpg`
static CAMERA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[A-Z]+_)?(?P<date>\d{8})_\d{6}").unwrap());

/// Messaging apps: `IMG-20250101-WA0001.jpg`, `VID-20250101-WA0002.mp4`
static MESSAGING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:IMG|VID)-(?P<date>\d{8})-WA").unwrap());

/// Naming convention that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameConvention {
    Camera,
    Messaging,
}

/// A date read from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameDate {
    pub date: NaiveDate,
    pub convention: NameConvention,
}

impl FilenameDate {
    /// The `YYYYMMDD` token as it appears in the name
    pub fn token(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Extract a capture date from a camera- or messaging-style file name.
pub fn parse_filename_date(filename: &str) -> Option<FilenameDate> {
    let name = base_name(filename);
    match_convention(&CAMERA_RE, name, NameConvention::Camera)
        .or_else(|| match_convention(&MESSAGING_RE, name, NameConvention::Messaging))
}

/// Only the messaging convention (`IMG-YYYYMMDD-WA####`).
pub fn parse_messaging_date(filename: &str) -> Option<FilenameDate> {
    match_convention(&MESSAGING_RE, base_name(filename), NameConvention::Messaging)
}

fn base_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename)
}

fn match_convention(re: &Regex, name: &str, convention: NameConvention) -> Option<FilenameDate> {
    let token = re.captures(name)?.name("date")?.as_str();
    parse_date_token(token).map(|date| FilenameDate { date, convention })
}

/// Parse an 8-digit `YYYYMMDD` token into a real calendar date
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = token[..4].parse().ok()?;
    let month: u32 = token[4..6].parse().ok()?;
    let day: u32 = token[6..].parse().ok()?;

    if !(1..=12).contains(&month) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

//! Destination folders and collision-free file paths
//!
//! Folders follow `{root}/{year}/{MM}-{MonthName}`. A file never replaces an
//! existing one: `name.ext` becomes `name_1.ext`, `name_2.ext`, ... until the
//! path is free. Paths are checked at allocation time only, which is enough
//! because a run places files one at a time.

use chrono::{Datelike, NaiveDate};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Display names for months 1-12
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthNames([String; 12]);

impl MonthNames {
    /// Build from exactly twelve names
    pub fn from_slice<S: AsRef<str>>(names: &[S]) -> Option<Self> {
        let owned: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        owned.try_into().ok().map(Self)
    }

    pub fn spanish() -> Self {
        Self::from_strs([
            "Enero",
            "Febrero",
            "Marzo",
            "Abril",
            "Mayo",
            "Junio",
            "Julio",
            "Agosto",
            "Septiembre",
            "Octubre",
            "Noviembre",
            "Diciembre",
        ])
    }

    fn from_strs(names: [&str; 12]) -> Self {
        Self(names.map(String::from))
    }

    pub fn names(&self) -> &[String; 12] {
        &self.0
    }

    /// Name of month `month` (1-12)
    pub fn name(&self, month: u32) -> Option<&str> {
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        self.0.get(index).map(String::as_str)
    }

    /// Folder name `MM-Name`, e.g. `01-Enero`
    pub fn folder(&self, month: u32) -> Option<String> {
        self.name(month).map(|name| format!("{:02}-{}", month, name))
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self::spanish()
    }
}

/// How destination folders are laid out under a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationLayout {
    /// `{root}/{year}/{MM}-{Name}`
    YearMonth,
    /// `{root}/{MM}-{Name}`
    MonthOnly,
    /// `{root}/{folder}` regardless of the date
    Flat(String),
}

/// Folder used for undated items when none is configured
pub const DEFAULT_UNDATED_FOLDER: &str = "SinFecha";

/// Computes destination folders and free file paths under one root
#[derive(Debug, Clone)]
pub struct PathAllocator {
    root: PathBuf,
    months: MonthNames,
    undated_folder: String,
}

impl PathAllocator {
    pub fn new<P: Into<PathBuf>>(root: P, months: MonthNames) -> Self {
        Self {
            root: root.into(),
            months,
            undated_folder: DEFAULT_UNDATED_FOLDER.to_string(),
        }
    }

    /// Set the folder name that collects undated items
    pub fn with_undated_folder(mut self, folder: &str) -> Self {
        self.undated_folder = folder.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Month folder label for a date, e.g. `06-Junio`
    pub fn month_folder(&self, date: NaiveDate) -> String {
        // chrono months are always 1-12
        self.months
            .folder(date.month())
            .unwrap_or_else(|| format!("{:02}", date.month()))
    }

    /// `{root}/{year}/{MM}-{Name}`, without touching the disk
    pub fn year_month_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(date.year().to_string())
            .join(self.month_folder(date))
    }

    /// `{root}/{MM}-{Name}`, without touching the disk
    pub fn month_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(self.month_folder(date))
    }

    /// Folder an item lands in. Items without a date go to the undated folder
    /// unless the layout ignores dates.
    pub fn directory_for(&self, layout: &DestinationLayout, date: Option<NaiveDate>) -> PathBuf {
        match (layout, date) {
            (DestinationLayout::Flat(folder), _) => self.root.join(folder),
            (DestinationLayout::YearMonth, Some(date)) => self.year_month_dir(date),
            (DestinationLayout::MonthOnly, Some(date)) => self.month_dir(date),
            (_, None) => self.root.join(&self.undated_folder),
        }
    }

    /// Create the destination folder and return a free path for `file_name` in it
    pub fn place(
        &self,
        layout: &DestinationLayout,
        date: Option<NaiveDate>,
        file_name: &str,
    ) -> io::Result<PathBuf> {
        let dir = self.directory_for(layout, date);
        ensure_dir(&dir)?;
        Ok(unique_path(&dir, file_name))
    }

    /// [`place`](Self::place) with the year/month layout
    pub fn allocate(&self, date: NaiveDate, file_name: &str) -> io::Result<PathBuf> {
        self.place(&DestinationLayout::YearMonth, Some(date), file_name)
    }
}

/// Create a directory and its parents; an existing directory is fine.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// First free path for `file_name` inside `dir`.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = name.extension().and_then(|s| s.to_str()).unwrap_or("");

    let mut counter = 1u32;
    loop {
        let new_name = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };
        let new_path = dir.join(new_name);
        if !new_path.exists() {
            debug!("{} is taken, using {}", file_name, new_path.display());
            return new_path;
        }
        counter += 1;
    }
}

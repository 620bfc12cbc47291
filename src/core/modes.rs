//! Operating modes
//!
//! Each mode is a [`RunPlan`] over the same engine. User input is validated
//! while the [`Mode`] is built, so a bad date never reaches the device.

use crate::core::config::OrganizerConfig;
use crate::core::date::filename::parse_date_token;
use crate::core::date::MetadataReader;
use crate::core::error::{Result, SyncError};
use crate::core::organizer::{
    CandidateFilter, DateSource, Organizer, RunPlan, RunSummary, UndatedPolicy,
};
use crate::core::placement::{ensure_dir, DestinationLayout};
use crate::device::traits::{DeviceSession, TransferGateway};
use chrono::NaiveDate;
use log::{info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// One user-selected run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Every media file on the card, grouped by month
    FullVolume,
    /// Files named with today's date
    Today,
    SpecificDate(NaiveDate),
    SpecificMonth { year: i32, month: u32 },
    /// Like `SpecificMonth`, keeping the original timestamps
    SpecificMonthPreserve { year: i32, month: u32 },
    /// Files of one year into the year/month backup tree
    Year(i32),
    /// Local messaging app media, grouped by the date in their names
    Messaging,
    /// Push a local tree back to the card
    Restore { source: PathBuf },
}

impl Mode {
    /// Specific-date mode from a `YYYYMMDD` string
    pub fn specific_date(input: &str) -> Result<Self> {
        parse_date_input(input).map(Mode::SpecificDate)
    }

    /// Specific-month mode from year and month strings
    pub fn specific_month(year: &str, month: &str, preserve: bool) -> Result<Self> {
        let year = parse_year_input(year)?;
        let month = parse_month_input(month)?;
        Ok(if preserve {
            Mode::SpecificMonthPreserve { year, month }
        } else {
            Mode::SpecificMonth { year, month }
        })
    }

    /// Year mode from a 4-digit string
    pub fn year(input: &str) -> Result<Self> {
        parse_year_input(input).map(Mode::Year)
    }

    /// Restore mode from a folder typed by the user
    pub fn restore(input: &str) -> Result<Self> {
        parse_restore_source(input).map(|source| Mode::Restore { source })
    }

    /// Whether the mode talks to the device
    pub fn needs_device(&self) -> bool {
        !matches!(self, Mode::Messaging)
    }

    /// Run plan for the organize modes; `None` for restore
    pub fn plan(&self, config: &OrganizerConfig, today: NaiveDate) -> Option<RunPlan> {
        let plan = match self {
            Mode::FullVolume => RunPlan::new(&self.to_string(), &config.backup_dir)
                .layout(DestinationLayout::MonthOnly)
                .preserve_timestamps(true)
                .undated(UndatedPolicy::Bucket),
            Mode::Today => day_plan(self, config, today),
            Mode::SpecificDate(date) => day_plan(self, config, *date),
            Mode::SpecificMonth { year, month } => {
                RunPlan::new(&self.to_string(), &config.extract_dir)
                    .filter(CandidateFilter::Month {
                        year: *year,
                        month: *month,
                    })
                    .layout(DestinationLayout::Flat(format!("{:04}-{:02}", year, month)))
            }
            Mode::SpecificMonthPreserve { year, month } => {
                RunPlan::new(&self.to_string(), &config.extract_dir)
                    .filter(CandidateFilter::Month {
                        year: *year,
                        month: *month,
                    })
                    .layout(DestinationLayout::Flat(format!(
                        "{:04}-{:02}_METADATA_OK",
                        year, month
                    )))
                    .preserve_timestamps(true)
            }
            Mode::Year(year) => RunPlan::new(&self.to_string(), &config.backup_dir)
                .filter(CandidateFilter::Year(*year))
                .layout(DestinationLayout::YearMonth),
            Mode::Messaging => RunPlan::new(&self.to_string(), &config.messaging_dir)
                .date_source(DateSource::MessagingName)
                .undated(UndatedPolicy::Bucket),
            Mode::Restore { .. } => return None,
        };
        Some(plan)
    }
}

fn day_plan(mode: &Mode, config: &OrganizerConfig, day: NaiveDate) -> RunPlan {
    RunPlan::new(&mode.to_string(), &config.extract_dir)
        .filter(CandidateFilter::Day(day))
        .layout(DestinationLayout::Flat(day.format("%Y-%m-%d").to_string()))
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::FullVolume => write!(f, "full volume"),
            Mode::Today => write!(f, "today"),
            Mode::SpecificDate(date) => write!(f, "date {}", date.format("%Y-%m-%d")),
            Mode::SpecificMonth { year, month } => write!(f, "month {:04}-{:02}", year, month),
            Mode::SpecificMonthPreserve { year, month } => {
                write!(f, "month {:04}-{:02} (timestamps kept)", year, month)
            }
            Mode::Year(year) => write!(f, "year {}", year),
            Mode::Messaging => write!(f, "messaging media"),
            Mode::Restore { source } => write!(f, "restore {}", source.display()),
        }
    }
}

// =============================================================================
// Input validation
// =============================================================================

/// Strict `YYYYMMDD` naming a real calendar date
pub fn parse_date_input(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    parse_date_token(input).ok_or_else(|| {
        SyncError::InvalidUserInput(format!("'{}' is not a valid YYYYMMDD date", input))
    })
}

/// Exactly four digits
pub fn parse_year_input(input: &str) -> Result<i32> {
    let input = input.trim();
    if input.len() != 4 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SyncError::InvalidUserInput(format!(
            "'{}' is not a 4-digit year",
            input
        )));
    }
    input
        .parse()
        .map_err(|_| SyncError::InvalidUserInput(format!("'{}' is not a 4-digit year", input)))
}

/// Month number 1-12, with or without a leading zero
pub fn parse_month_input(input: &str) -> Result<u32> {
    let input = input.trim();
    let invalid = || SyncError::InvalidUserInput(format!("'{}' is not a month (1-12)", input));

    if input.is_empty() || input.len() > 2 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match input.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => Ok(month),
        _ => Err(invalid()),
    }
}

/// Absolute path of an existing local folder
pub fn parse_restore_source(input: &str) -> Result<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SyncError::InvalidUserInput("no folder given".to_string()));
    }

    let path = expand_home(input);
    let resolved = path.canonicalize().map_err(|_| {
        SyncError::InvalidUserInput(format!("folder does not exist: {}", path.display()))
    })?;
    if !resolved.is_dir() {
        return Err(SyncError::InvalidUserInput(format!(
            "not a folder: {}",
            resolved.display()
        )));
    }
    Ok(resolved)
}

fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if input == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(input)),
        _ => PathBuf::from(input),
    }
}

// =============================================================================
// Running
// =============================================================================

/// Run one mode to completion.
///
/// Device and volume problems end the run before anything is transferred;
/// per-file problems end up in the summary.
pub fn run_mode<D, R>(
    device: &D,
    organizer: &Organizer<R>,
    mode: &Mode,
    today: NaiveDate,
) -> Result<RunSummary>
where
    D: DeviceSession + TransferGateway,
    R: MetadataReader,
{
    info!("Starting {}", mode);

    if let Mode::Messaging = mode {
        let config = organizer.config();
        let plan = mode
            .plan(config, today)
            .ok_or_else(|| SyncError::InvalidUserInput(mode.to_string()))?;
        return organizer.organize_local(&config.messaging_dir, &plan);
    }

    device.ensure_ready()?;
    let camera_dir = device
        .detect_media_volume()?
        .ok_or(SyncError::VolumeNotFound)?;
    info!("Using media volume {}", camera_dir);

    match mode.plan(organizer.config(), today) {
        Some(plan) => organizer.organize_remote(device, &camera_dir, &plan),
        None => match mode {
            Mode::Restore { source } => organizer.restore(device, source, &camera_dir),
            _ => Err(SyncError::InvalidUserInput(mode.to_string())),
        },
    }
}

/// Copy the messaging app folders from the device into `local_dir`.
///
/// Returns how many remote folders were copied. Missing folders are skipped.
pub fn pull_messaging_media<D>(device: &D, remote_dirs: &[String], local_dir: &Path) -> Result<usize>
where
    D: DeviceSession + TransferGateway,
{
    device.ensure_ready()?;
    ensure_dir(local_dir)?;

    let mut pulled = 0;
    for remote in remote_dirs {
        if !device.path_exists(remote)? {
            warn!("{} does not exist on the device", remote);
            continue;
        }
        match device.pull(remote, local_dir, false) {
            Ok(output) => {
                info!("{}", output.trim());
                pulled += 1;
            }
            Err(e) => warn!("{}", e),
        }
    }
    Ok(pulled)
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

//! Organization engine
//!
//! One engine drives every mode. A [`RunPlan`] picks the candidate filter, the
//! folder layout and the timestamp policy; the engine does the rest:
//!
//! `Idle → Discovering → Filtering → Transferring → Summarizing → Idle`
//!
//! Items are handled one at a time. A failing item is logged and counted and
//! the run moves on to the next one.

use crate::core::config::OrganizerConfig;
use crate::core::date::{
    parse_filename_date, parse_messaging_date, DateResolver, ExifReader, FilenameDate,
    MetadataReader, Provenance, ResolvedDate,
};
use crate::core::error::{Result, SyncError};
use crate::core::media::MediaItem;
use crate::core::placement::{ensure_dir, unique_path, DestinationLayout, PathAllocator};
use crate::device::traits::TransferGateway;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Folder under the destination root where undated remote items wait for inspection
const STAGING_DIR: &str = ".incoming";

// =============================================================================
// Run plan
// =============================================================================

/// Stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Discovering,
    Filtering,
    Transferring,
    Summarizing,
}

/// Which items a run picks, judged on the date in their file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFilter {
    /// Every media file, dated or not
    All,
    /// Name date equals this day
    Day(NaiveDate),
    /// Name date falls in this month
    Month { year: i32, month: u32 },
    /// Name date falls in this year
    Year(i32),
}

impl CandidateFilter {
    pub fn accepts(&self, name_date: Option<&FilenameDate>) -> bool {
        match (self, name_date) {
            (CandidateFilter::All, _) => true,
            (_, None) => false,
            (CandidateFilter::Day(day), Some(parsed)) => {
                parsed.token() == day.format("%Y%m%d").to_string()
            }
            (CandidateFilter::Month { year, month }, Some(parsed)) => {
                parsed.year() == *year && parsed.month() == *month
            }
            (CandidateFilter::Year(year), Some(parsed)) => parsed.year() == *year,
        }
    }
}

/// Where dates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// File name, then embedded metadata, then modification time
    Chain,
    /// Messaging-style file names only
    MessagingName,
}

impl DateSource {
    fn name_date(&self, name: &str) -> Option<FilenameDate> {
        match self {
            DateSource::Chain => parse_filename_date(name),
            DateSource::MessagingName => parse_messaging_date(name),
        }
    }
}

/// What happens to an item whose date cannot be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndatedPolicy {
    /// Leave it out and count it as skipped
    Skip,
    /// Place it in the undated folder
    Bucket,
}

/// Everything that distinguishes one mode from another
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Short name used in logs and the summary
    pub label: String,
    /// Destination root
    pub root: PathBuf,
    pub filter: CandidateFilter,
    pub layout: DestinationLayout,
    pub date_source: DateSource,
    /// Ask the gateway to keep the original timestamps
    pub preserve_timestamps: bool,
    /// Leave out soft-deleted files
    pub skip_trashed: bool,
    pub undated: UndatedPolicy,
}

impl RunPlan {
    /// Plan that takes every media file and files it by year and month
    pub fn new<P: Into<PathBuf>>(label: &str, root: P) -> Self {
        Self {
            label: label.to_string(),
            root: root.into(),
            filter: CandidateFilter::All,
            layout: DestinationLayout::YearMonth,
            date_source: DateSource::Chain,
            preserve_timestamps: false,
            skip_trashed: true,
            undated: UndatedPolicy::Skip,
        }
    }

    pub fn filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn layout(mut self, layout: DestinationLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn date_source(mut self, source: DateSource) -> Self {
        self.date_source = source;
        self
    }

    pub fn preserve_timestamps(mut self, value: bool) -> Self {
        self.preserve_timestamps = value;
        self
    }

    pub fn skip_trashed(mut self, value: bool) -> Self {
        self.skip_trashed = value;
        self
    }

    pub fn undated(mut self, policy: UndatedPolicy) -> Self {
        self.undated = policy;
        self
    }
}

// =============================================================================
// Outcomes and summary
// =============================================================================

/// Result of handling one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Placed at this path
    Copied(PathBuf),
    /// Already sits in its destination folder
    InPlace,
    Skipped(String),
    Failed(String),
}

/// Aggregated result of one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub label: String,
    /// Destination root the per-folder counts are relative to
    pub root: PathBuf,
    pub total_candidates: usize,
    pub total_copied: usize,
    /// Candidates found already in their destination folder
    pub already_in_place: usize,
    /// Destination folder (relative to `root`, `/`-separated) → files placed there
    pub per_month_counts: BTreeMap<String, usize>,
    /// `(name, reason)` for every item left out after being seen
    pub skipped: Vec<(String, String)>,
    /// `(name, reason)` for every failed transfer
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn new(label: &str, root: &Path) -> Self {
        Self {
            label: label.to_string(),
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    /// Candidates that neither got copied nor were already in place
    pub fn mismatch(&self) -> usize {
        self.total_candidates
            .saturating_sub(self.total_copied)
            .saturating_sub(self.already_in_place)
    }

    pub fn record(&mut self, name: &str, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Copied(path) => {
                self.total_copied += 1;
                let key = self.folder_key(&path);
                *self.per_month_counts.entry(key).or_insert(0) += 1;
            }
            TransferOutcome::InPlace => self.already_in_place += 1,
            TransferOutcome::Skipped(reason) => self.skipped.push((name.to_string(), reason)),
            TransferOutcome::Failed(reason) => self.failures.push((name.to_string(), reason)),
        }
    }

    fn folder_key(&self, path: &Path) -> String {
        let parent = path.parent().unwrap_or(path);
        let relative = parent.strip_prefix(&self.root).unwrap_or(parent);
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: copied {} of {} candidates, {} skipped, {} failed",
            self.label,
            self.total_copied,
            self.total_candidates,
            self.skipped.len(),
            self.failures.len()
        )
    }
}

// =============================================================================
// Progress tracking
// =============================================================================

/// Progress update information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Item just handled
    pub current_file: String,
    /// Items handled so far
    pub completed: usize,
    /// Number of candidates
    pub total: usize,
    pub phase: RunPhase,
    /// Date of the item just handled, when it was dated
    pub resolved: Option<ResolvedDate>,
}

/// Callback receiving progress updates
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

// =============================================================================
// Engine
// =============================================================================

/// A media item that passed filtering
#[derive(Debug, Clone)]
struct Candidate {
    item: MediaItem,
    name_date: Option<FilenameDate>,
}

/// Runs plans against a device or a local folder
pub struct Organizer<R: MetadataReader = ExifReader> {
    config: OrganizerConfig,
    resolver: DateResolver<R>,
    progress_callback: Option<ProgressCallback>,
}

impl Organizer<ExifReader> {
    pub fn new(config: OrganizerConfig) -> Self {
        Self::with_reader(config, ExifReader)
    }
}

impl<R: MetadataReader> Organizer<R> {
    pub fn with_reader(config: OrganizerConfig, reader: R) -> Self {
        Self {
            config,
            resolver: DateResolver::new(reader),
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Pull the matching files of `remote_dir` into the plan's layout.
    ///
    /// Only listing the directory can fail the whole run.
    pub fn organize_remote<G: TransferGateway + ?Sized>(
        &self,
        gateway: &G,
        remote_dir: &str,
        plan: &RunPlan,
    ) -> Result<RunSummary> {
        self.enter(RunPhase::Discovering, plan);
        let entries = gateway.list_remote_entries(remote_dir)?;
        info!("{} entries in {}", entries.len(), remote_dir);

        let items = entries
            .iter()
            .map(|name| MediaItem::remote(remote_dir, name, &self.config))
            .collect();

        let mut staged = false;
        let summary = self.run(plan, items, |candidate, allocator| {
            if needs_staging(candidate, plan) {
                staged = true;
                return self.pull_then_place(gateway, candidate, plan, allocator);
            }
            self.pull_candidate(gateway, candidate, plan, allocator)
        })?;

        if staged {
            remove_staging(&plan.root);
        }
        Ok(summary)
    }

    /// Move the matching files under `source_dir` into the plan's layout.
    pub fn organize_local(&self, source_dir: &Path, plan: &RunPlan) -> Result<RunSummary> {
        self.enter(RunPhase::Discovering, plan);
        if !source_dir.is_dir() {
            return Err(SyncError::Io(format!(
                "Folder not found: {}",
                source_dir.display()
            )));
        }

        let items: Vec<MediaItem> = WalkDir::new(source_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| MediaItem::local(e.path(), &self.config))
            .collect();
        info!("{} files in {}", items.len(), source_dir.display());

        self.run(plan, items, |candidate, allocator| {
            self.move_candidate(candidate, plan, allocator)
        })
    }

    /// Shared Filtering → Transferring → Summarizing skeleton
    fn run<F>(&self, plan: &RunPlan, items: Vec<MediaItem>, mut transfer: F) -> Result<RunSummary>
    where
        F: FnMut(&mut Candidate, &PathAllocator) -> TransferOutcome,
    {
        let mut summary = RunSummary::new(&plan.label, &plan.root);

        self.enter(RunPhase::Filtering, plan);
        let mut candidates = self.select(items, plan, &mut summary);
        summary.total_candidates = candidates.len();

        if candidates.is_empty() {
            warn!("[{}] No matching media files", plan.label);
        } else {
            info!("[{}] {} files to transfer", plan.label, candidates.len());
        }

        self.enter(RunPhase::Transferring, plan);
        let allocator = PathAllocator::new(&plan.root, self.config.month_names.clone())
            .with_undated_folder(&self.config.undated_folder);
        let total = candidates.len();

        for (index, candidate) in candidates.iter_mut().enumerate() {
            let outcome = transfer(candidate, &allocator);
            match &outcome {
                TransferOutcome::Copied(path) => debug!(
                    "{} -> {} ({})",
                    candidate.item.name,
                    path.display(),
                    candidate
                        .item
                        .resolved_date
                        .map(|r| r.provenance.to_string())
                        .unwrap_or_else(|| "undated".to_string())
                ),
                TransferOutcome::InPlace => {
                    debug!("{} is already in place", candidate.item.name)
                }
                TransferOutcome::Skipped(reason) => {
                    debug!("Skipped {}: {}", candidate.item.name, reason)
                }
                TransferOutcome::Failed(reason) => {
                    warn!("Failed to transfer {}: {}", candidate.item.name, reason)
                }
            }
            summary.record(&candidate.item.name, outcome);

            self.report_progress(ProgressUpdate {
                current_file: candidate.item.name.clone(),
                completed: index + 1,
                total,
                phase: RunPhase::Transferring,
                resolved: candidate.item.resolved_date,
            });
        }

        self.enter(RunPhase::Summarizing, plan);
        info!("{}", summary);
        self.enter(RunPhase::Idle, plan);

        Ok(summary)
    }

    fn select(
        &self,
        items: Vec<MediaItem>,
        plan: &RunPlan,
        summary: &mut RunSummary,
    ) -> Vec<Candidate> {
        items
            .into_iter()
            .filter_map(|item| {
                if !item.kind.is_media() {
                    return None;
                }
                if plan.skip_trashed && self.config.is_trashed(&item.name) {
                    summary.record(&item.name, TransferOutcome::Skipped("trashed".to_string()));
                    return None;
                }
                let name_date = plan.date_source.name_date(&item.name);
                if !plan.filter.accepts(name_date.as_ref()) {
                    return None;
                }
                Some(Candidate { item, name_date })
            })
            .collect()
    }

    /// Date of a candidate whose bytes are at `local`
    fn resolve(&self, candidate: &Candidate, plan: &RunPlan, local: &Path) -> Result<ResolvedDate> {
        match plan.date_source {
            DateSource::Chain => self.resolver.resolve(&candidate.item, Some(local)),
            DateSource::MessagingName => candidate
                .name_date
                .map(|parsed| ResolvedDate {
                    date: parsed.date,
                    provenance: Provenance::Filename,
                })
                .ok_or_else(|| SyncError::DateUnresolved(candidate.item.name.clone())),
        }
    }

    /// Pull a candidate straight to its destination, dated by its name
    fn pull_candidate<G: TransferGateway + ?Sized>(
        &self,
        gateway: &G,
        candidate: &mut Candidate,
        plan: &RunPlan,
        allocator: &PathAllocator,
    ) -> TransferOutcome {
        let resolved = candidate.name_date.map(|parsed| ResolvedDate {
            date: parsed.date,
            provenance: Provenance::Filename,
        });
        candidate.item.resolved_date = resolved;

        let item = &candidate.item;
        let date = resolved.map(|r| r.date);
        let destination = match allocator.place(&plan.layout, date, &item.name) {
            Ok(path) => path,
            Err(e) => return TransferOutcome::Failed(e.to_string()),
        };

        match gateway.pull(&item.remote_identifier, &destination, plan.preserve_timestamps) {
            Ok(_) => TransferOutcome::Copied(destination),
            Err(e) => TransferOutcome::Failed(e.to_string()),
        }
    }

    /// Undated remote items are pulled to a staging folder, dated from their
    /// bytes, then moved into place.
    fn pull_then_place<G: TransferGateway + ?Sized>(
        &self,
        gateway: &G,
        candidate: &mut Candidate,
        plan: &RunPlan,
        allocator: &PathAllocator,
    ) -> TransferOutcome {
        let staging = allocator.root().join(STAGING_DIR);
        if let Err(e) = ensure_dir(&staging) {
            return TransferOutcome::Failed(e.to_string());
        }
        let staged = unique_path(&staging, &candidate.item.name);

        if let Err(e) = gateway.pull(
            &candidate.item.remote_identifier,
            &staged,
            plan.preserve_timestamps,
        ) {
            return TransferOutcome::Failed(e.to_string());
        }

        let outcome = self.place_local(candidate, &staged, plan, allocator);
        if !matches!(outcome, TransferOutcome::Copied(_)) && staged.exists() {
            if let Err(e) = fs::remove_file(&staged) {
                warn!("Could not remove {}: {}", staged.display(), e);
            }
        }
        outcome
    }

    fn move_candidate(
        &self,
        candidate: &mut Candidate,
        plan: &RunPlan,
        allocator: &PathAllocator,
    ) -> TransferOutcome {
        let source = candidate.item.local_path();
        self.place_local(candidate, &source, plan, allocator)
    }

    /// Resolve a local file's date and move it to its destination
    fn place_local(
        &self,
        candidate: &mut Candidate,
        source: &Path,
        plan: &RunPlan,
        allocator: &PathAllocator,
    ) -> TransferOutcome {
        let date = match self.resolve(candidate, plan, source) {
            Ok(resolved) => {
                candidate.item.resolved_date = Some(resolved);
                Some(resolved.date)
            }
            Err(e) => match plan.undated {
                UndatedPolicy::Bucket => {
                    debug!("{}, using the undated folder", e);
                    None
                }
                UndatedPolicy::Skip => return TransferOutcome::Skipped(e.to_string()),
            },
        };

        let item = &candidate.item;
        let dir = allocator.directory_for(&plan.layout, date);
        if source.parent() == Some(dir.as_path()) {
            return TransferOutcome::InPlace;
        }

        let destination = match allocator.place(&plan.layout, date, &item.name) {
            Ok(path) => path,
            Err(e) => return TransferOutcome::Failed(e.to_string()),
        };

        match fs::rename(source, &destination) {
            Ok(()) => TransferOutcome::Copied(destination),
            Err(e) => TransferOutcome::Failed(format!(
                "could not move to {}: {}",
                destination.display(),
                e
            )),
        }
    }

    fn enter(&self, phase: RunPhase, plan: &RunPlan) {
        debug!("[{}] {:?}", plan.label, phase);
        if matches!(phase, RunPhase::Discovering) {
            self.report_progress(ProgressUpdate {
                current_file: String::new(),
                completed: 0,
                total: 0,
                phase,
                resolved: None,
            });
        }
    }

    pub(crate) fn report_progress(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.progress_callback {
            callback(update);
        }
    }
}

/// Undated remote items need their bytes before they can be placed
fn needs_staging(candidate: &Candidate, plan: &RunPlan) -> bool {
    candidate.name_date.is_none() && !matches!(plan.layout, DestinationLayout::Flat(_))
}

/// Remove the staging folder once a run has emptied it
fn remove_staging(root: &Path) {
    let staging = root.join(STAGING_DIR);
    match fs::remove_dir(&staging) {
        Ok(()) => debug!("Removed {}", staging.display()),
        Err(e) => warn!("Could not remove {}: {}", staging.display(), e),
    }
}

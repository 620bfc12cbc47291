//! Restore: push a local tree back to the device
//!
//! `{local_root}/2025/06-Junio/a.jpg` goes to `{target}/2025/06-Junio/a.jpg`.
//! Local files are never moved or deleted, and remote name clashes are left
//! to the transfer tool.

use crate::core::date::MetadataReader;
use crate::core::error::{Result, SyncError};
use crate::core::media::join_remote;
use crate::core::organizer::{Organizer, ProgressUpdate, RunPhase, RunSummary, TransferOutcome};
use crate::device::traits::TransferGateway;
use log::{debug, info, warn};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Remote path for `file` under `target_root`, using `/` separators
pub fn remote_path_for(local_root: &Path, file: &Path, target_root: &str) -> Option<String> {
    let relative = file.strip_prefix(local_root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(join_remote(target_root, &parts.join("/")))
}

/// Directory part of a remote path
fn remote_parent(remote_path: &str) -> Option<&str> {
    remote_path
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
}

impl<R: MetadataReader> Organizer<R> {
    /// Push every regular file under `local_root` to the same relative path
    /// under `target_root`, keeping timestamps.
    pub fn restore<G: TransferGateway + ?Sized>(
        &self,
        gateway: &G,
        local_root: &Path,
        target_root: &str,
    ) -> Result<RunSummary> {
        if !local_root.is_dir() {
            return Err(SyncError::InvalidUserInput(format!(
                "not a folder: {}",
                local_root.display()
            )));
        }

        let files: Vec<PathBuf> = WalkDir::new(local_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        let mut summary = RunSummary::new("restore", Path::new(target_root));
        summary.total_candidates = files.len();
        info!(
            "Restoring {} files from {} to {}",
            files.len(),
            local_root.display(),
            target_root
        );

        for (index, file) in files.iter().enumerate() {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let outcome = match remote_path_for(local_root, file, target_root) {
                Some(remote) => push_file(gateway, file, &remote),
                None => TransferOutcome::Skipped("outside the restore folder".to_string()),
            };
            if let TransferOutcome::Failed(reason) = &outcome {
                warn!("Failed to restore {}: {}", name, reason);
            }
            summary.record(&name, outcome);

            self.report_progress(ProgressUpdate {
                current_file: name,
                completed: index + 1,
                total: files.len(),
                phase: RunPhase::Transferring,
                resolved: None,
            });
        }

        info!("{}", summary);
        Ok(summary)
    }
}

fn push_file<G: TransferGateway + ?Sized>(gateway: &G, file: &Path, remote: &str) -> TransferOutcome {
    if let Some(parent) = remote_parent(remote) {
        if let Err(e) = gateway.make_remote_directory(parent) {
            return TransferOutcome::Failed(e.to_string());
        }
    }

    match gateway.push(file, remote, true) {
        Ok(output) => {
            debug!("{}", output.trim());
            TransferOutcome::Copied(PathBuf::from(remote))
        }
        Err(e) => TransferOutcome::Failed(e.to_string()),
    }
}

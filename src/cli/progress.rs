//! Progress bar utilities for CLI output
//!
//! The organizer reports progress through a callback; [`TransferProgress`]
//! turns those updates into an indicatif bar and the helpers below print
//! headers, status lines and run summaries.

use crate::core::organizer::{ProgressUpdate, RunPhase, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

// ============================================================================
// Styles
// ============================================================================

/// `[██████░░░░] 40% (4/10)`
fn transfer_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  [{bar:50}] {percent}% ({pos}/{len}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 60;
    let title_padded = format!("{:^width$}", title, width = width - 2);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a section divider
pub fn print_divider() {
    println!("{}", "─".repeat(60));
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

// ============================================================================
// Transfer progress
// ============================================================================

/// Progress bar fed by organizer updates.
///
/// The bar stays hidden until the first transfer, since the number of
/// candidates is only known once filtering is over.
#[derive(Clone)]
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(transfer_style());
        Self { bar }
    }

    /// Apply one update from the organizer
    pub fn update(&self, update: &ProgressUpdate) {
        if update.phase != RunPhase::Transferring {
            return;
        }
        if self.bar.is_hidden() {
            self.bar.set_draw_target(indicatif::ProgressDrawTarget::stdout());
        }
        self.bar.set_length(update.total as u64);
        self.bar.set_position(update.completed as u64);
        self.bar.set_message(update.current_file.clone());
    }

    /// Callback suitable for `Organizer::with_progress`
    pub fn callback(&self) -> impl Fn(ProgressUpdate) + Send + Sync + 'static {
        let progress = self.clone();
        move |update| progress.update(&update)
    }

    /// Clear the message and leave the finished bar on screen
    pub fn finish(&self) {
        if !self.bar.is_hidden() {
            self.bar.finish_with_message("");
        }
    }
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Lines describing a finished run
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for (folder, count) in &summary.per_month_counts {
        lines.push(format!("📁 {}: {} files", folder, count));
    }
    lines.push(format!(
        "Total: {} of {} files copied",
        summary.total_copied, summary.total_candidates
    ));
    if summary.mismatch() > 0 {
        lines.push(format!(
            "⚠ {} files were not copied (see the log for details)",
            summary.mismatch()
        ));
    }
    if summary.already_in_place > 0 {
        lines.push(format!(
            "{} files already in place",
            summary.already_in_place
        ));
    }
    if !summary.skipped.is_empty() {
        lines.push(format!("{} files skipped", summary.skipped.len()));
    }
    lines
}

/// Print the summary of a finished run
pub fn print_summary(summary: &RunSummary) {
    println!();
    print_divider();
    println!("  {} → {}", summary.label, summary.root.display());
    print_divider();
    for line in summary_lines(summary) {
        println!("  {}", line);
    }
    for (name, reason) in &summary.failures {
        print_error(&format!("{}: {}", name, reason));
    }
    println!();
}

// ============================================================================
// Log output
// ============================================================================

/// Writer that sends log output to both stderr and a log file
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! CLI module for the media organizer
//!
//! # Submodules
//!
//! - `args` - Command-line argument definitions using clap
//! - `commands` - Interactive menu and command handlers
//! - `progress` - Progress bar, summaries and console output helpers

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Args, Commands};
pub use commands::run_command;
pub use progress::DualWriter;

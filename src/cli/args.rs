//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pull photos and videos from an Android SD card and file them by date
#[derive(Parser, Debug)]
#[command(name = "sd-media")]
#[command(version)]
#[command(about = "Pull photos and videos from an Android SD card over adb and organize them into year/month folders", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backup folder for the year and full-volume modes (overrides config)
    #[arg(short, long)]
    pub backup_dir: Option<PathBuf>,

    /// Folder for the date and month extractions (overrides config)
    #[arg(short, long)]
    pub extract_dir: Option<PathBuf>,

    /// adb device serial (overrides config)
    #[arg(short, long)]
    pub serial: Option<String>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Open the interactive menu (default)
    Menu,

    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

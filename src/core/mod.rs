//! Core functionality module
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `media` - Media items and their kinds
//! - `date` - Capture date resolution (file name, metadata, mtime)
//! - `placement` - Month folders and collision-free paths
//! - `organizer` - The engine that runs a plan
//! - `modes` - Plans for each user-facing mode
//! - `restore` - Pushing a local tree back to the device

pub mod config;
pub mod date;
pub mod error;
pub mod media;
pub mod modes;
pub mod organizer;
pub mod placement;
pub mod restore;

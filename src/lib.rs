//! SD Media Organizer Library
//!
//! Pulls photos and videos from an Android phone's SD card over adb and
//! files them into date folders on the computer. Dates come from the file
//! name when it carries one, then from EXIF capture time, then from the
//! modification time.
//!
//! # Architecture
//!
//! - [`core`] - Configuration, errors, date resolution, path allocation and
//!   the organization engine with its modes
//! - [`device`] - The device traits and their adb implementation
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - Mock device for running every mode without a phone
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sd_media_organizer::core::config::Config;
//! use sd_media_organizer::core::modes::{run_mode, today, Mode};
//! use sd_media_organizer::core::organizer::Organizer;
//! use sd_media_organizer::device::AdbBridge;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let bridge = AdbBridge::from_config(&config.device);
//!     let organizer = Organizer::new(config.organizer_config()?);
//!
//!     let summary = run_mode(&bridge, &organizer, &Mode::year("2025")?, today())?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```
//!
//! # Testing Without a Device
//!
//! [`testdb::MockDevice`] implements the same traits as the adb bridge, with
//! an in-memory card, recorded calls and injectable failures.

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

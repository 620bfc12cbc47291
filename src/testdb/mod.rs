//! Test Database Module
//!
//! Lets every mode run without a phone attached. `MockDevice` stands in for
//! the adb bridge: an in-memory card with a camera folder, recorded calls and
//! injectable transfer failures.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sd_media_organizer::core::config::OrganizerConfig;
//! use sd_media_organizer::core::modes::{run_mode, Mode};
//! use sd_media_organizer::core::organizer::Organizer;
//! use sd_media_organizer::testdb::MockDevice;
//!
//! let device = MockDevice::with_sd_card();
//! device.add_camera_file("IMG_20250601_101000.jpg");
//!
//! let organizer = Organizer::new(OrganizerConfig::default());
//! let summary = run_mode(&device, &organizer, &Mode::Year(2025), chrono::Local::now().date_naive()).unwrap();
//! println!("{}", summary);
//! ```

pub mod mock_device;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod integration;

pub use mock_device::{DeviceCall, MockDevice, MockDeviceConfig, MockFile, MOCK_VOLUME};

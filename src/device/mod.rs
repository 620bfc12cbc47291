//! Device interaction module
//!
//! # Submodules
//!
//! - `traits` - `DeviceSession` and `TransferGateway`, the seams the organizer uses
//! - `adb` - Android Debug Bridge implementation of both traits
//!
//! The mock device in `testdb` implements the same traits, so every mode can
//! be exercised without a phone attached.

pub mod adb;
pub mod traits;

pub use adb::{launch_mirroring, AdbBridge, AttachedDevice};
pub use traits::{is_storage_slot_name, DeviceSession, DeviceState, TransferGateway, VolumeLayout};

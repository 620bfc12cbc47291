//! End-to-end runs of every mode against the mock device
//!
//! These go through `run_mode` exactly as the menu does: device check, volume
//! detection, filtering, placement and the transfer calls.

use super::fixtures::jpeg_with_exif;
use super::mock_device::{DeviceCall, MockDevice};
use crate::core::config::OrganizerConfig;
use crate::core::date::Provenance;
use crate::core::error::SyncError;
use crate::core::media::join_remote;
use crate::core::modes::{pull_messaging_media, run_mode, Mode};
use crate::core::organizer::{Organizer, ProgressUpdate, RunPhase};
use crate::device::traits::DeviceState;
use chrono::{Local, NaiveDate, NaiveDateTime};
use exif::Tag;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn local_time(s: &str) -> SystemTime {
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_local_timezone(Local)
        .unwrap();
    SystemTime::from(local)
}

fn organizer_in(temp: &TempDir) -> Organizer {
    Organizer::new(OrganizerConfig::default().rooted_at(temp.path()))
}

fn backup(temp: &TempDir) -> PathBuf {
    temp.path().join("Fotos Camara")
}

fn card_with(names: &[&str]) -> MockDevice {
    let device = MockDevice::with_sd_card();
    for name in names {
        device.add_camera_file(name);
    }
    device
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

// =============================================================================
// YEAR ORGANIZE
// =============================================================================

#[test]
fn test_year_organize_places_by_month() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&[
        "IMG_20250601_101000.jpg",
        "VID_20250715_090000.mp4",
        "note.txt",
    ]);

    let summary = run_mode(
        &device,
        &organizer_in(&temp),
        &Mode::Year(2025),
        ymd(2025, 8, 1),
    )
    .unwrap();

    let root = backup(&temp);
    assert!(root
        .join("2025")
        .join("06-Junio")
        .join("IMG_20250601_101000.jpg")
        .is_file());
    assert!(root
        .join("2025")
        .join("07-Julio")
        .join("VID_20250715_090000.mp4")
        .is_file());

    assert_eq!(summary.total_candidates, 2);
    assert_eq!(summary.total_copied, 2);
    assert_eq!(summary.mismatch(), 0);
    assert_eq!(summary.per_month_counts.get("2025/06-Junio"), Some(&1));
    assert_eq!(summary.per_month_counts.get("2025/07-Julio"), Some(&1));
    assert!(summary.skipped.is_empty());

    let pulled: Vec<String> = device.pulls().into_iter().map(|(r, _, _)| r).collect();
    assert!(!pulled.iter().any(|r| r.ends_with("note.txt")));
}

#[test]
fn test_year_organize_only_takes_that_year() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&[
        "IMG_20240101_000000.jpg",
        "IMG_20250101_000000.jpg",
        "holiday.jpg",
    ]);

    let summary = run_mode(
        &device,
        &organizer_in(&temp),
        &Mode::Year(2024),
        ymd(2025, 8, 1),
    )
    .unwrap();

    assert_eq!(summary.total_copied, 1);
    assert_eq!(
        files_in(&backup(&temp).join("2024").join("01-Enero")),
        vec!["IMG_20240101_000000.jpg"]
    );
    assert!(!backup(&temp).join("2025").exists());
}

#[test]
fn test_rerun_creates_suffixed_copy() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg"]);
    let organizer = organizer_in(&temp);

    let month = backup(&temp).join("2025").join("06-Junio");
    fs::create_dir_all(&month).unwrap();
    fs::write(month.join("IMG_20250601_101000.jpg"), b"original").unwrap();

    let summary = run_mode(&device, &organizer, &Mode::Year(2025), ymd(2025, 8, 1)).unwrap();

    assert_eq!(summary.total_copied, 1);
    assert_eq!(
        files_in(&month),
        vec!["IMG_20250601_101000.jpg", "IMG_20250601_101000_1.jpg"]
    );
    assert_eq!(
        fs::read(month.join("IMG_20250601_101000.jpg")).unwrap(),
        b"original"
    );
}

#[test]
fn test_trashed_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&[
        "IMG_20250601_101000.jpg",
        ".trashed-1718000000-IMG_20250602_101000.jpg",
    ]);

    let summary = run_mode(
        &device,
        &organizer_in(&temp),
        &Mode::Year(2025),
        ymd(2025, 8, 1),
    )
    .unwrap();

    assert_eq!(summary.total_candidates, 1);
    assert_eq!(summary.total_copied, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].1, "trashed");
}

#[test]
fn test_transfer_failure_does_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let mut device = card_with(&[
        "IMG_20250601_101000.jpg",
        "IMG_20250602_101000.jpg",
        "IMG_20250603_101000.jpg",
    ]);
    let failing = join_remote(&device.camera_dir(), "IMG_20250602_101000.jpg");
    device.fail_on(&failing);

    let summary = run_mode(
        &device,
        &organizer_in(&temp),
        &Mode::Year(2025),
        ymd(2025, 8, 1),
    )
    .unwrap();

    assert_eq!(summary.total_candidates, 3);
    assert_eq!(summary.total_copied, 2);
    assert_eq!(summary.mismatch(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, "IMG_20250602_101000.jpg");
    assert_eq!(device.pulls().len(), 3);
}

#[test]
fn test_progress_reports_every_item() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg", "VID_20250715_090000.mp4"]);

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let organizer = organizer_in(&temp).with_progress(move |update| {
        sink.lock().unwrap().push(update);
    });

    run_mode(&device, &organizer, &Mode::Year(2025), ymd(2025, 8, 1)).unwrap();

    let updates = updates.lock().unwrap();
    let transferring: Vec<&ProgressUpdate> = updates
        .iter()
        .filter(|u| u.phase == RunPhase::Transferring)
        .collect();
    assert_eq!(transferring.len(), 2);
    assert_eq!(transferring[1].completed, 2);
    assert_eq!(transferring[1].total, 2);
    assert_eq!(updates[0].phase, RunPhase::Discovering);
}

// =============================================================================
// FLAT FOLDER MODES
// =============================================================================

#[test]
fn test_today_mode() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&[
        "IMG_20250601_101000.jpg",
        "IMG_20250601_181500.jpg",
        "IMG_20250531_235959.jpg",
    ]);

    let summary = run_mode(&device, &organizer_in(&temp), &Mode::Today, ymd(2025, 6, 1)).unwrap();

    assert_eq!(summary.total_copied, 2);
    assert_eq!(
        files_in(&temp.path().join("2025-06-01")),
        vec!["IMG_20250601_101000.jpg", "IMG_20250601_181500.jpg"]
    );
}

#[test]
fn test_specific_date_mode() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&[
        "IMG_20240115_080000.jpg",
        "VID_20240115_200000.mp4",
        "IMG_20240116_080000.jpg",
        "IMG-20240115-WA0003.jpg",
    ]);
    let mode = Mode::specific_date("20240115").unwrap();

    let summary = run_mode(&device, &organizer_in(&temp), &mode, ymd(2025, 8, 1)).unwrap();

    assert_eq!(summary.total_candidates, 3);
    assert_eq!(summary.total_copied, 3);
    assert_eq!(
        files_in(&temp.path().join("2024-01-15")),
        vec![
            "IMG-20240115-WA0003.jpg",
            "IMG_20240115_080000.jpg",
            "VID_20240115_200000.mp4"
        ]
    );
    assert!(!temp.path().join("2024-01-16").exists());
}

#[test]
fn test_flat_modes_leave_existing_staging_name_alone() {
    let temp = TempDir::new().unwrap();
    let unrelated = temp.path().join(".incoming");
    fs::create_dir(&unrelated).unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg"]);

    run_mode(&device, &organizer_in(&temp), &Mode::Today, ymd(2025, 6, 1)).unwrap();

    assert!(unrelated.is_dir());
}

#[test]
fn test_specific_month_preserve_requests_timestamps() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg", "IMG_20250701_101000.jpg"]);
    let mode = Mode::specific_month("2025", "06", true).unwrap();

    let summary = run_mode(&device, &organizer_in(&temp), &mode, ymd(2025, 8, 1)).unwrap();

    assert_eq!(summary.total_copied, 1);
    assert!(temp
        .path()
        .join("2025-06_METADATA_OK")
        .join("IMG_20250601_101000.jpg")
        .is_file());
    assert!(device.pulls().iter().all(|(_, _, preserve)| *preserve));
}

#[test]
fn test_specific_month_plain_copy() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg"]);
    let mode = Mode::specific_month("2025", "6", false).unwrap();

    run_mode(&device, &organizer_in(&temp), &mode, ymd(2025, 8, 1)).unwrap();

    assert!(temp.path().join("2025-06").join("IMG_20250601_101000.jpg").is_file());
    assert!(device.pulls().iter().all(|(_, _, preserve)| !*preserve));
}

#[test]
fn test_invalid_date_never_reaches_device() {
    let device = card_with(&["IMG_20250601_101000.jpg"]);

    let result = Mode::specific_date("2025-13-01");

    assert!(matches!(result, Err(SyncError::InvalidUserInput(_))));
    assert_eq!(device.call_count(), 0);
}

// =============================================================================
// DEVICE PROBLEMS
// =============================================================================

#[test]
fn test_absent_device_aborts_before_transfer() {
    let temp = TempDir::new().unwrap();
    let mut device = card_with(&["IMG_20250601_101000.jpg"]);
    device.set_state(DeviceState::Absent);

    let result = run_mode(&device, &organizer_in(&temp), &Mode::Year(2025), ymd(2025, 8, 1));

    assert!(matches!(result, Err(SyncError::DeviceNotFound)));
    assert_eq!(device.calls(), vec![DeviceCall::State]);
    assert!(!backup(&temp).exists());
}

#[test]
fn test_unauthorized_device() {
    let temp = TempDir::new().unwrap();
    let mut device = card_with(&[]);
    device.set_state(DeviceState::Unauthorized);

    let result = run_mode(&device, &organizer_in(&temp), &Mode::Today, ymd(2025, 8, 1));
    assert!(matches!(result, Err(SyncError::DeviceUnauthorized)));
}

#[test]
fn test_missing_sd_card() {
    let temp = TempDir::new().unwrap();
    let device = MockDevice::new();
    device.add_directory("/storage/emulated/0/DCIM/Camera");

    let result = run_mode(&device, &organizer_in(&temp), &Mode::Year(2025), ymd(2025, 8, 1));

    assert!(matches!(result, Err(SyncError::VolumeNotFound)));
    assert!(device.pulls().is_empty());
}

// =============================================================================
// FULL VOLUME
// =============================================================================

#[test]
fn test_full_volume_uses_fallback_dates() {
    let temp = TempDir::new().unwrap();
    let device = card_with(&["IMG_20250601_101000.jpg"]);
    let clip = join_remote(&device.camera_dir(), "clip.mp4");
    device.add_file_with_mtime(&clip, b"video", local_time("2023-05-10 12:00:00"));

    let summary = run_mode(
        &device,
        &organizer_in(&temp),
        &Mode::FullVolume,
        ymd(2025, 8, 1),
    )
    .unwrap();

    let root = backup(&temp);
    assert_eq!(summary.total_copied, 2);
    assert!(root.join("06-Junio").join("IMG_20250601_101000.jpg").is_file());
    assert!(root.join("05-Mayo").join("clip.mp4").is_file());
    assert!(!root.join(".incoming").exists());
    assert!(device.pulls().iter().all(|(_, _, preserve)| *preserve));
}

#[test]
fn test_full_volume_dates_photos_from_exif() {
    let temp = TempDir::new().unwrap();
    let device = MockDevice::with_sd_card();
    let holiday = join_remote(&device.camera_dir(), "holiday.jpg");
    device.add_file_with_mtime(
        &holiday,
        &jpeg_with_exif(&[(Tag::DateTimeOriginal, "2021:07:04 10:11:12")]),
        local_time("2023-05-10 12:00:00"),
    );

    let dated: Arc<Mutex<Vec<(String, Provenance)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dated);
    let organizer = organizer_in(&temp).with_progress(move |update| {
        if let Some(resolved) = update.resolved {
            sink.lock()
                .unwrap()
                .push((update.current_file, resolved.provenance));
        }
    });

    let summary = run_mode(&device, &organizer, &Mode::FullVolume, ymd(2025, 8, 1)).unwrap();

    let root = backup(&temp);
    assert_eq!(summary.total_copied, 1);
    assert!(root.join("07-Julio").join("holiday.jpg").is_file());
    assert!(!root.join("05-Mayo").exists());
    assert_eq!(
        *dated.lock().unwrap(),
        vec![("holiday.jpg".to_string(), Provenance::Metadata)]
    );
}

// =============================================================================
// RESTORE
// =============================================================================

#[test]
fn test_restore_mirrors_local_tree() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("backup");
    let month = local.join("2025").join("06-Junio");
    fs::create_dir_all(&month).unwrap();
    fs::write(month.join("a.jpg"), b"a").unwrap();

    let device = MockDevice::with_sd_card();
    let organizer = organizer_in(&temp);

    let summary = organizer.restore(&device, &local, "R").unwrap();

    assert_eq!(summary.total_copied, 1);
    assert_eq!(
        device.pushes(),
        vec![(month.join("a.jpg"), "R/2025/06-Junio/a.jpg".to_string(), true)]
    );
    assert!(device
        .calls()
        .contains(&DeviceCall::MakeDirectory("R/2025/06-Junio".to_string())));
    assert!(month.join("a.jpg").is_file());
}

#[test]
fn test_restore_mode_targets_detected_volume() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("backup");
    fs::create_dir_all(local.join("2024").join("12-Diciembre")).unwrap();
    fs::write(local.join("2024").join("12-Diciembre").join("b.mp4"), b"b").unwrap();
    fs::write(local.join("top.jpg"), b"t").unwrap();

    let device = MockDevice::with_sd_card();
    let mode = Mode::restore(local.to_str().unwrap()).unwrap();

    let summary = run_mode(&device, &organizer_in(&temp), &mode, ymd(2025, 8, 1)).unwrap();

    let camera = device.camera_dir();
    assert_eq!(summary.total_copied, 2);
    assert!(device
        .file(&format!("{}/2024/12-Diciembre/b.mp4", camera))
        .is_some());
    assert!(device.file(&format!("{}/top.jpg", camera)).is_some());
}

// =============================================================================
// MESSAGING MEDIA
// =============================================================================

#[test]
fn test_messaging_pull_then_organize() {
    let temp = TempDir::new().unwrap();
    let config = OrganizerConfig::default().rooted_at(temp.path());
    let remote_dirs = vec![
        "/storage/emulated/0/WhatsApp/Media/WhatsApp Images".to_string(),
        "/storage/emulated/0/WhatsApp/Media/WhatsApp Video".to_string(),
    ];

    let device = MockDevice::with_sd_card();
    device.add_file(
        "/storage/emulated/0/WhatsApp/Media/WhatsApp Images/IMG-20250314-WA0007.jpg",
        b"a",
    );
    device.add_file(
        "/storage/emulated/0/WhatsApp/Media/WhatsApp Images/IMG-20250314-WA0008.jpg",
        b"b",
    );
    device.add_file(
        "/storage/emulated/0/WhatsApp/Media/WhatsApp Images/sticker.png",
        b"c",
    );

    let pulled = pull_messaging_media(&device, &remote_dirs, &config.messaging_dir).unwrap();
    assert_eq!(pulled, 1);

    let organizer = Organizer::new(config.clone());
    let summary = run_mode(&device, &organizer, &Mode::Messaging, ymd(2025, 8, 1)).unwrap();

    let march = config.messaging_dir.join("2025").join("03-Marzo");
    assert_eq!(summary.total_copied, 3);
    assert_eq!(
        files_in(&march),
        vec!["IMG-20250314-WA0007.jpg", "IMG-20250314-WA0008.jpg"]
    );
    assert_eq!(
        files_in(&config.messaging_dir.join("SinFecha")),
        vec!["sticker.png"]
    );
}

#[test]
fn test_messaging_organize_needs_no_device() {
    let temp = TempDir::new().unwrap();
    let config = OrganizerConfig::default().rooted_at(temp.path());
    fs::create_dir_all(&config.messaging_dir).unwrap();
    fs::write(config.messaging_dir.join("VID-20241231-WA0001.mp4"), b"v").unwrap();

    let mut device = MockDevice::new();
    device.set_state(DeviceState::Absent);

    let summary = run_mode(
        &device,
        &Organizer::new(config.clone()),
        &Mode::Messaging,
        ymd(2025, 8, 1),
    )
    .unwrap();

    assert_eq!(summary.total_copied, 1);
    assert_eq!(device.call_count(), 0);
}

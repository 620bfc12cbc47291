//! Command handler implementations
//!
//! The interactive menu and the two config subcommands. Every menu action
//! returns to the menu; errors are printed there and never end the loop.

use crate::cli::progress::{
    print_error, print_header, print_info, print_success, print_summary, print_warning,
    TransferProgress,
};
use crate::cli::{Args, Commands};
use crate::core::config::{write_default_config, Config, OrganizerConfig};
use crate::core::modes::{pull_messaging_media, run_mode, today, Mode};
use crate::core::organizer::Organizer;
use crate::device::{launch_mirroring, AdbBridge, DeviceSession, DeviceState};
use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use log::{debug, info};
use std::path::PathBuf;

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        None | Some(Commands::Menu) => run_menu(config),
        Some(Commands::ShowConfig) => {
            show_config(config);
            Ok(())
        }
        Some(Commands::GenerateConfig { output }) => generate_config_file(output.clone()),
    }
}

// ============================================================================
// Menu
// ============================================================================

/// One entry of the interactive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    VerifyDevice,
    Mirror,
    FullVolume,
    Today,
    SpecificDate,
    SpecificMonth,
    SpecificMonthPreserve,
    Year,
    MessagingOrganize,
    MessagingPull,
    MessagingPullAndOrganize,
    Restore,
    Exit,
}

impl MenuAction {
    /// Menu order
    pub const ALL: [MenuAction; 13] = [
        MenuAction::VerifyDevice,
        MenuAction::Mirror,
        MenuAction::FullVolume,
        MenuAction::Today,
        MenuAction::SpecificDate,
        MenuAction::SpecificMonth,
        MenuAction::SpecificMonthPreserve,
        MenuAction::Year,
        MenuAction::MessagingOrganize,
        MenuAction::MessagingPull,
        MenuAction::MessagingPullAndOrganize,
        MenuAction::Restore,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::VerifyDevice => "Verify device connection",
            MenuAction::Mirror => "Open screen mirroring",
            MenuAction::FullVolume => "Back up the whole SD card by month",
            MenuAction::Today => "Extract today's photos and videos",
            MenuAction::SpecificDate => "Extract a specific date",
            MenuAction::SpecificMonth => "Extract a month",
            MenuAction::SpecificMonthPreserve => "Extract a month keeping timestamps",
            MenuAction::Year => "Organize a year into month folders",
            MenuAction::MessagingOrganize => "Organize local WhatsApp media",
            MenuAction::MessagingPull => "Copy WhatsApp media from the phone",
            MenuAction::MessagingPullAndOrganize => "Copy and organize WhatsApp media",
            MenuAction::Restore => "Restore a backup folder to the SD card",
            MenuAction::Exit => "Exit",
        }
    }

    /// Mode for actions that need no follow-up input
    pub fn fixed_mode(&self) -> Option<Mode> {
        match self {
            MenuAction::FullVolume => Some(Mode::FullVolume),
            MenuAction::Today => Some(Mode::Today),
            MenuAction::MessagingOrganize => Some(Mode::Messaging),
            _ => None,
        }
    }
}

/// Everything a menu action needs
struct Session<'a> {
    config: &'a Config,
    organizer_config: OrganizerConfig,
    bridge: AdbBridge,
}

/// Show the menu until the user picks Exit
pub fn run_menu(config: &Config) -> Result<()> {
    let session = Session {
        config,
        organizer_config: config
            .organizer_config()
            .context("Configuration is not usable")?,
        bridge: AdbBridge::from_config(&config.device),
    };

    let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();

    print_header("SD Media Organizer");
    loop {
        let index = Select::new()
            .with_prompt("Choose an option")
            .items(&labels[..])
            .default(0)
            .interact()
            .context("Failed to read menu selection")?;
        let action = MenuAction::ALL[index];
        debug!("Menu action: {:?}", action);

        if action == MenuAction::Exit {
            info!("Bye");
            return Ok(());
        }

        if let Err(e) = handle_action(&session, action) {
            print_error(&format!("{:#}", e));
        }
        println!();
    }
}

fn handle_action(session: &Session<'_>, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::VerifyDevice => verify_device(&session.bridge),
        MenuAction::Mirror => {
            session.bridge.ensure_ready()?;
            print_info("Close the mirroring window to return to the menu");
            launch_mirroring(&session.config.device.mirror_path, session.bridge.serial())?;
            Ok(())
        }
        MenuAction::MessagingPull => pull_messaging(session).map(|_| ()),
        MenuAction::MessagingPullAndOrganize => {
            pull_messaging(session)?;
            run_with_progress(session, &Mode::Messaging)
        }
        MenuAction::Exit => Ok(()),
        _ => {
            let mode = prompt_mode(action)?;
            run_with_progress(session, &mode)
        }
    }
}

/// Build the mode for an organize action, asking for its parameters
fn prompt_mode(action: MenuAction) -> Result<Mode> {
    if let Some(mode) = action.fixed_mode() {
        return Ok(mode);
    }

    let mode = match action {
        MenuAction::SpecificDate => Mode::specific_date(&prompt("Date (YYYYMMDD)")?)?,
        MenuAction::SpecificMonth | MenuAction::SpecificMonthPreserve => {
            let year = prompt("Year (YYYY)")?;
            let month = prompt("Month (1-12)")?;
            Mode::specific_month(
                &year,
                &month,
                action == MenuAction::SpecificMonthPreserve,
            )?
        }
        MenuAction::Year => Mode::year(&prompt("Year (YYYY)")?)?,
        MenuAction::Restore => Mode::restore(&prompt("Local folder to restore")?)?,
        other => anyhow::bail!("'{}' is not an organize action", other.label()),
    };
    Ok(mode)
}

fn prompt(text: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(text)
        .interact_text()
        .context("Failed to read input")
}

// ============================================================================
// Actions
// ============================================================================

/// Report whether the phone is attached and authorized
pub fn verify_device<D: DeviceSession>(device: &D) -> Result<()> {
    match device.device_state()? {
        DeviceState::Ready => print_success("Device connected"),
        DeviceState::Unauthorized => {
            print_warning("Device unauthorized: accept the USB debugging prompt on the phone")
        }
        DeviceState::Absent => print_error("No device found"),
    }
    Ok(())
}

fn pull_messaging(session: &Session<'_>) -> Result<usize> {
    let local = &session.organizer_config.messaging_dir;
    print_info(&format!("Copying WhatsApp media into {}", local.display()));

    let pulled = pull_messaging_media(&session.bridge, &session.config.device.messaging_dirs, local)?;
    if pulled == 0 {
        print_warning("No WhatsApp folders found on the device");
    } else {
        print_success(&format!("{} folders copied", pulled));
    }
    Ok(pulled)
}

fn run_with_progress(session: &Session<'_>, mode: &Mode) -> Result<()> {
    print_info(&format!("Running {}", mode));

    let progress = TransferProgress::new();
    let organizer =
        Organizer::new(session.organizer_config.clone()).with_progress(progress.callback());

    let result = run_mode(&session.bridge, &organizer, mode, today());
    progress.finish();

    let summary = result?;
    print_summary(&summary);
    Ok(())
}

// ============================================================================
// Config subcommands
// ============================================================================

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let path = write_default_config(output)?;
    info!("Configuration file: {}", path.display());
    info!("Edit this file to customize folders, month names and the adb location.");
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("[device]");
    info!("  adb_path = \"{}\"", config.device.adb_path.display());
    info!("  mirror_path = \"{}\"", config.device.mirror_path.display());
    info!(
        "  serial = {:?}",
        config.device.serial.as_deref().unwrap_or("(auto)")
    );
    info!("  storage_root = \"{}\"", config.device.storage_root);
    info!("  camera_dir = \"{}\"", config.device.camera_dir);
    info!("  messaging_dirs = {:?}", config.device.messaging_dirs);
    info!("");
    info!("[paths]");
    info!("  backup_dir = \"{}\"", config.paths.backup_dir.display());
    info!("  extract_dir = \"{}\"", config.paths.extract_dir.display());
    info!("  messaging_dir = \"{}\"", config.paths.messaging_dir.display());
    info!("  undated_folder = \"{}\"", config.paths.undated_folder);
    info!("");
    info!("[media]");
    info!("  image_extensions = {:?}", config.media.image_extensions);
    info!("  video_extensions = {:?}", config.media.video_extensions);
    info!("  trash_prefix = \"{}\"", config.media.trash_prefix);
    info!("");
    info!("[locale]");
    info!("  month_names = {:?}", config.locale.month_names);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}

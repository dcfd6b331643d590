//! `hth settings ...`: household preferences.

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use hearth_core::{Snapshot, ops};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::{Household, command_failed};
use crate::output::{OutputMode, pretty_kv, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    #[command(
        about = "Show the current settings",
        after_help = "EXAMPLES:\n    hth settings show"
    )]
    Show,

    #[command(
        about = "Turn ambient sound on or off",
        after_help = "EXAMPLES:\n    # Flip the current setting\n    hth settings sound\n\n    hth settings sound off"
    )]
    Sound {
        /// Omit to toggle.
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    #[command(
        about = "Set the sync relay URL",
        after_help = "EXAMPLES:\n    hth settings sync-url https://relay.example/sync\n\n    # Clear it\n    hth settings sync-url \"\""
    )]
    SyncUrl {
        /// An http:// or https:// URL. Empty clears it.
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Serialize)]
struct SettingsReport {
    active_user_id: String,
    sound_enabled: bool,
    sync_url: String,
    pin_set: bool,
}

impl SettingsReport {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            active_user_id: snapshot.settings.active_user_id.clone(),
            sound_enabled: snapshot.settings.sound_enabled,
            sync_url: snapshot.settings.sync_endpoint_url.clone(),
            pin_set: ops::has_pin(snapshot),
        }
    }
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn write_text(r: &SettingsReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "active_user_id\t{}", r.active_user_id)?;
    writeln!(w, "sound\t{}", on_off(r.sound_enabled))?;
    writeln!(w, "sync_url\t{}", r.sync_url)?;
    writeln!(w, "pin_set\t{}", r.pin_set)
}

fn write_pretty(r: &SettingsReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Settings")?;
    pretty_kv(w, "Active user", &r.active_user_id)?;
    pretty_kv(w, "Sound", on_off(r.sound_enabled))?;
    let url = if r.sync_url.is_empty() { "(not set)" } else { r.sync_url.as_str() };
    pretty_kv(w, "Sync URL", url)?;
    pretty_kv(w, "Parent PIN", if r.pin_set { "set" } else { "not set" })
}

pub fn run_settings(
    command: &SettingsCommand,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    match command {
        SettingsCommand::Show => {
            let report = SettingsReport::of(&household.load());
            render_mode(output, &report, write_text, write_pretty)
        }
        SettingsCommand::Sound { state } => {
            let report = household.mutate(|snapshot| {
                let enabled = state.map_or(!snapshot.settings.sound_enabled, |s| s == Switch::On);
                let next = ops::set_sound_enabled(snapshot, enabled);
                let report = SettingsReport::of(&next);
                Ok((next, report))
            })?;
            info!(enabled = report.sound_enabled, "sound setting updated");
            render(output, &report, |r, w| {
                writeln!(w, "✓ Sound {}", on_off(r.sound_enabled))
            })
        }
        SettingsCommand::SyncUrl { url } => {
            let report = household.mutate(|snapshot| {
                let outcome =
                    ops::set_sync_url(snapshot, url).map_err(|err| command_failed(output, &err))?;
                let report = SettingsReport::of(&outcome.state);
                Ok((outcome.state, report))
            })?;
            info!(url = %report.sync_url, "sync url updated");
            render(output, &report, |r, w| {
                if r.sync_url.is_empty() {
                    writeln!(w, "✓ Sync URL cleared")
                } else {
                    writeln!(w, "✓ Sync URL saved: {}", r.sync_url)
                }
            })
        }
    }
}

use anyhow::Result;
use clap::Args;
use hearth_core::clock::SystemClock;
use hearth_core::model::LedgerEntry;
use hearth_core::ops::{self, EarnRequest};
use std::io::Write;
use std::path::Path;

use super::{Household, command_failed};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct EarnArgs {
    /// Event id to earn from (uses the event's points).
    #[arg(long, short, conflicts_with = "points", required_unless_present = "points")]
    pub event: Option<String>,

    /// Ad-hoc point amount. Fractions are rounded down.
    #[arg(long, short)]
    pub points: Option<f64>,

    /// Optional note stored on the ledger row.
    #[arg(long, short, default_value = "")]
    pub note: String,

    /// User id (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,
}

pub fn write_entry(entry: &LedgerEntry, w: &mut dyn Write) -> std::io::Result<()> {
    let label = if entry.note.is_empty() {
        entry.reference.id()
    } else {
        entry.note.as_str()
    };
    writeln!(w, "✓ {:+} for {} ({label})", entry.signed_points(), entry.user_id)
}

pub fn run_earn(args: &EarnArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let clock = SystemClock;
    let entry = household.mutate(|snapshot| {
        let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
        let outcome = match &args.event {
            Some(event_id) => {
                ops::earn_event(snapshot, &clock, &user_id, event_id.trim(), &args.note)
            }
            None => ops::earn(
                snapshot,
                &clock,
                &EarnRequest {
                    user_id,
                    event_id: None,
                    points: args.points.unwrap_or_default(),
                    note: args.note.clone(),
                },
            ),
        }
        .map_err(|err| command_failed(output, &err))?;
        Ok((outcome.state, outcome.value))
    })?;
    render(output, &entry, |e, w| write_entry(e, w))
}

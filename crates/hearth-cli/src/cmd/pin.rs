//! `hth pin ...`: manage the parent PIN.
//!
//! `set` and `clear` need the current PIN through the global `--pin` flag
//! once one is configured. `verify` only reads.

use anyhow::Result;
use clap::Subcommand;
use hearth_core::ErrorCode;
use hearth_core::ops;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::{Household, fail, require_parent};
use crate::output::{OutputMode, render};

#[derive(Subcommand, Debug)]
pub enum PinCommand {
    #[command(
        about = "Set or replace the parent PIN",
        after_help = "EXAMPLES:\n    # First PIN\n    hth pin set 4321\n\n    # Replace an existing PIN\n    hth --pin 4321 pin set 8765"
    )]
    Set {
        /// Exactly four digits.
        new_pin: String,
    },

    #[command(
        about = "Remove the parent PIN",
        after_help = "EXAMPLES:\n    hth --pin 4321 pin clear"
    )]
    Clear,

    #[command(
        about = "Check a PIN without changing anything",
        after_help = "EXAMPLES:\n    hth pin verify 4321"
    )]
    Verify {
        #[arg(value_name = "PIN")]
        candidate: String,
    },
}

#[derive(Debug, Serialize)]
struct PinStatus {
    pin_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

pub fn run_pin(
    command: &PinCommand,
    current_pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    match command {
        PinCommand::Set { new_pin } => {
            let status = household.mutate(|snapshot| {
                require_parent(snapshot, current_pin, output)?;
                let next = ops::set_parent_pin(snapshot, new_pin)
                    .map_err(|err| fail(output, err.to_string(), err.code()))?;
                let status = PinStatus {
                    pin_set: ops::has_pin(&next),
                    verified: None,
                };
                Ok((next, status))
            })?;
            info!(pin_set = status.pin_set, "parent pin updated");
            render(output, &status, |s, w| {
                if s.pin_set {
                    writeln!(w, "✓ Parent PIN set")
                } else {
                    writeln!(w, "✓ Parent PIN cleared")
                }
            })
        }
        PinCommand::Clear => {
            let status = household.mutate(|snapshot| {
                require_parent(snapshot, current_pin, output)?;
                let next = ops::set_parent_pin(snapshot, "")
                    .map_err(|err| fail(output, err.to_string(), err.code()))?;
                Ok((
                    next,
                    PinStatus {
                        pin_set: false,
                        verified: None,
                    },
                ))
            })?;
            info!("parent pin cleared");
            render(output, &status, |_, w| writeln!(w, "✓ Parent PIN cleared"))
        }
        PinCommand::Verify { candidate } => {
            let snapshot = household.load();
            if !ops::verify_pin(&snapshot, candidate) {
                return Err(fail(output, "PIN does not match.", ErrorCode::PinRejected));
            }
            let status = PinStatus {
                pin_set: ops::has_pin(&snapshot),
                verified: Some(true),
            };
            render(output, &status, |s, w| {
                if s.pin_set {
                    writeln!(w, "✓ PIN accepted")
                } else {
                    writeln!(w, "✓ No parent PIN is set")
                }
            })
        }
    }
}

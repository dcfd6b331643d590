use anyhow::Result;
use clap::Args;
use hearth_core::clock::SystemClock;
use hearth_core::ops;
use std::path::Path;

use super::earn::write_entry;
use super::{Household, command_failed, require_parent};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Signed amount: +N adds points, -N removes them.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,

    #[arg(long, short, default_value = "")]
    pub note: String,

    /// User id (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,
}

pub fn run_adjust(
    args: &AdjustArgs,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let entry = household.mutate(|snapshot| {
        require_parent(snapshot, pin, output)?;
        let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
        let outcome = ops::quick_adjust(snapshot, &SystemClock, &user_id, args.amount, &args.note)
            .map_err(|err| command_failed(output, &err))?;
        Ok((outcome.state, outcome.value))
    })?;
    render(output, &entry, |e, w| write_entry(e, w))
}

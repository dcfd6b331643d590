use anyhow::Result;
use clap::Args;
use hearth_core::clock::SystemClock;
use hearth_core::ops::{self, CommandError};
use std::path::Path;

use super::earn::write_entry;
use super::{Household, command_failed, fail};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct RedeemArgs {
    /// Reward id to redeem.
    pub reward: String,

    #[arg(long, short, default_value = "")]
    pub note: String,

    /// User id (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,
}

fn describe(err: &CommandError) -> String {
    match err {
        CommandError::RewardLocked {
            earned_total,
            unlock_at_total,
        } => format!("{err} Earned {earned_total} of {unlock_at_total} lifetime points."),
        CommandError::InsufficientBalance { balance, cost } => {
            format!("{err} Balance is {balance}, reward costs {cost}.")
        }
        other => other.to_string(),
    }
}

pub fn run_redeem(args: &RedeemArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let entry = household.mutate(|snapshot| {
        let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
        let outcome = ops::redeem(snapshot, &SystemClock, &user_id, args.reward.trim(), &args.note)
            .map_err(|err| match err {
                CommandError::RewardLocked { .. } | CommandError::InsufficientBalance { .. } => {
                    fail(output, describe(&err), err.code())
                }
                other => command_failed(output, &other),
            })?;
        Ok((outcome.state, outcome.value))
    })?;
    render(output, &entry, |e, w| write_entry(e, w))
}

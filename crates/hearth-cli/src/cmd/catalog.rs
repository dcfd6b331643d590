//! `hth events ...` and `hth rewards ...`.

use anyhow::Result;
use clap::{Args, Subcommand};
use hearth_core::clock::SystemClock;
use hearth_core::model::{Event, Reward};
use hearth_core::ops::{self, EventDraft, RewardDraft, Upserted};
use hearth_core::views::group_by_category;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::{Household, command_failed, require_parent};
use crate::output::{OutputMode, Renderable, pretty_section, render, render_list};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// User id (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,

    /// Include disabled rows.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    #[arg(long, short)]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct EventUpsertArgs {
    /// Existing event id to update. Omit to create.
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, short)]
    pub title: String,

    #[arg(long, short)]
    pub points: i64,

    #[arg(long, short, default_value = "")]
    pub category: String,

    #[arg(long, short, default_value = "")]
    pub description: String,

    /// Store the event disabled (hidden from quick picks).
    #[arg(long)]
    pub disabled: bool,

    #[arg(long, short)]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct RewardUpsertArgs {
    /// Existing reward id to update. Omit to create.
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, short)]
    pub title: String,

    #[arg(long)]
    pub cost: i64,

    /// Lifetime points required before the reward can be redeemed.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub unlock_at: i64,

    #[arg(long, short, default_value = "")]
    pub category: String,

    #[arg(long)]
    pub disabled: bool,

    #[arg(long, short)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    #[command(
        about = "List a user's events",
        after_help = "EXAMPLES:\n    hth events list\n    hth events list --user will --all"
    )]
    List(ListArgs),

    #[command(
        about = "Create or update an event",
        after_help = "EXAMPLES:\n    # Create\n    hth events upsert --title \"Feed the cat\" --points 2 --category Chores\n\n    # Update in place\n    hth events upsert --id tidy_room --title \"Tidy room\" --points 4"
    )]
    Upsert(EventUpsertArgs),

    #[command(
        about = "Delete an event",
        after_help = "EXAMPLES:\n    hth --pin 4321 events delete feed_the_cat"
    )]
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum RewardsCommand {
    #[command(
        about = "List a user's rewards",
        after_help = "EXAMPLES:\n    hth rewards list\n    hth rewards list --user will --all"
    )]
    List(ListArgs),

    #[command(
        about = "Create or update a reward",
        after_help = "EXAMPLES:\n    hth rewards upsert --title \"Park trip\" --cost 6 --unlock-at 15"
    )]
    Upsert(RewardUpsertArgs),

    #[command(
        about = "Delete a reward",
        after_help = "EXAMPLES:\n    hth --pin 4321 rewards delete park_trip"
    )]
    Delete(DeleteArgs),
}

#[derive(Debug, Serialize)]
struct EventRow<'a> {
    #[serde(flatten)]
    event: &'a Event,
}

impl Renderable for EventRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let off = if self.event.enabled { "" } else { " (disabled)" };
        writeln!(
            w,
            "  +{:<3} {} [{}]{off}",
            self.event.points, self.event.title, self.event.id
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let e = self.event;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            e.id, e.category, e.points, e.enabled, e.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "CATEGORY", "POINTS", "ENABLED", "TITLE"]
    }
}

#[derive(Debug, Serialize)]
struct RewardRow<'a> {
    #[serde(flatten)]
    reward: &'a Reward,
}

impl Renderable for RewardRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let r = self.reward;
        let off = if r.enabled { "" } else { " (disabled)" };
        let gate = if r.unlock_at_total > 0 {
            format!(" unlocks at {}", r.unlock_at_total)
        } else {
            String::new()
        };
        writeln!(w, "  -{:<3} {} [{}]{gate}{off}", r.cost, r.title, r.id)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let r = self.reward;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.id, r.category, r.cost, r.unlock_at_total, r.enabled, r.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "CATEGORY", "COST", "UNLOCK_AT", "ENABLED", "TITLE"]
    }
}

/// Pretty listings are grouped under category headings.
fn render_grouped<'a, T, R>(
    items: &'a [T],
    output: OutputMode,
    row: impl Fn(&'a T) -> R,
) -> Result<()>
where
    T: hearth_core::model::CatalogItem,
    R: Renderable,
{
    if output != OutputMode::Pretty {
        let rows: Vec<R> = items.iter().map(&row).collect();
        return render_list(&rows, output);
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (category, members) in group_by_category(items) {
        pretty_section(&mut out, &category)?;
        for item in members {
            row(item).render_human(&mut out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_upserted(
    kind: &str,
    id: &str,
    title: &str,
    mode: &str,
    w: &mut dyn Write,
) -> io::Result<()> {
    writeln!(w, "✓ {kind} {mode}: {title} [{id}]")
}

#[derive(Debug, Serialize)]
struct UpsertReport<T> {
    mode: &'static str,
    item: T,
}

impl<T> From<Upserted<T>> for UpsertReport<T> {
    fn from(upserted: Upserted<T>) -> Self {
        Self {
            mode: upserted.mode.as_str(),
            item: upserted.item,
        }
    }
}

pub fn run_events(
    command: &EventsCommand,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    match command {
        EventsCommand::List(args) => {
            let snapshot = household.load();
            let user_id = household.resolve_user(&snapshot, args.user.as_deref())?;
            let events: Vec<Event> = snapshot
                .events_for(&user_id)
                .iter()
                .filter(|e| args.all || e.enabled)
                .cloned()
                .collect();
            render_grouped(&events, output, |event| EventRow { event })
        }
        EventsCommand::Upsert(args) => {
            let report: UpsertReport<Event> = household.mutate(|snapshot| {
                require_parent(snapshot, pin, output)?;
                let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
                let draft = EventDraft {
                    id: args.id.clone(),
                    title: args.title.clone(),
                    category: args.category.clone(),
                    description: args.description.clone(),
                    points: args.points,
                    enabled: !args.disabled,
                };
                let outcome = ops::upsert_event(snapshot, &SystemClock, &user_id, &draft)
                    .map_err(|err| command_failed(output, &err))?;
                Ok((outcome.state, outcome.value.into()))
            })?;
            render(output, &report, |r, w| {
                write_upserted("Event", &r.item.id, &r.item.title, r.mode, w)
            })
        }
        EventsCommand::Delete(args) => {
            let removed = household.mutate(|snapshot| {
                require_parent(snapshot, pin, output)?;
                let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
                let outcome = ops::delete_event(snapshot, &user_id, &args.id)
                    .map_err(|err| command_failed(output, &err))?;
                Ok((outcome.state, outcome.value))
            })?;
            render(output, &removed, |e, w| {
                writeln!(w, "✓ Event deleted: {} [{}]", e.title, e.id)
            })
        }
    }
}

pub fn run_rewards(
    command: &RewardsCommand,
    pin: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let household = Household::open(project_root, output)?;
    match command {
        RewardsCommand::List(args) => {
            let snapshot = household.load();
            let user_id = household.resolve_user(&snapshot, args.user.as_deref())?;
            let rewards: Vec<Reward> = snapshot
                .rewards_for(&user_id)
                .iter()
                .filter(|r| args.all || r.enabled)
                .cloned()
                .collect();
            render_grouped(&rewards, output, |reward| RewardRow { reward })
        }
        RewardsCommand::Upsert(args) => {
            let report: UpsertReport<Reward> = household.mutate(|snapshot| {
                require_parent(snapshot, pin, output)?;
                let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
                let draft = RewardDraft {
                    id: args.id.clone(),
                    title: args.title.clone(),
                    category: args.category.clone(),
                    cost: args.cost,
                    unlock_at_total: args.unlock_at,
                    enabled: !args.disabled,
                };
                let outcome = ops::upsert_reward(snapshot, &SystemClock, &user_id, &draft)
                    .map_err(|err| command_failed(output, &err))?;
                Ok((outcome.state, outcome.value.into()))
            })?;
            render(output, &report, |r, w| {
                write_upserted("Reward", &r.item.id, &r.item.title, r.mode, w)
            })
        }
        RewardsCommand::Delete(args) => {
            let removed = household.mutate(|snapshot| {
                require_parent(snapshot, pin, output)?;
                let user_id = household.resolve_user(snapshot, args.user.as_deref())?;
                let outcome = ops::delete_reward(snapshot, &user_id, &args.id)
                    .map_err(|err| command_failed(output, &err))?;
                Ok((outcome.state, outcome.value))
            })?;
            render(output, &removed, |r, w| {
                writeln!(w, "✓ Reward deleted: {} [{}]", r.title, r.id)
            })
        }
    }
}

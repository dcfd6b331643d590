use anyhow::Result;
use clap::Args;
use hearth_core::clock::{Clock, SystemClock};
use hearth_core::views::{
    self, DEFAULT_TOP_LIMIT, DaySummary, Totals, UnlockProgress, top_events, top_rewards,
};
use hearth_core::{ErrorCode, Snapshot};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::{Household, fail};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// User id to report on (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,

    /// How many quick-pick events and rewards to show.
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
    pub top: usize,
}

#[derive(Debug, Serialize)]
struct QuickEvent {
    id: String,
    title: String,
    points: u32,
}

#[derive(Debug, Serialize)]
struct QuickReward {
    id: String,
    title: String,
    cost: u32,
    unlock_at_total: u32,
    unlocked: bool,
    affordable: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    user_id: String,
    name: String,
    active: bool,
    totals: Totals,
    today: DaySummary,
    unlock: UnlockProgress,
    top_events: Vec<QuickEvent>,
    top_rewards: Vec<QuickReward>,
}

fn build_report(
    snapshot: &Snapshot,
    user_id: &str,
    top: usize,
    now_ms: i64,
) -> Option<StatusReport> {
    let user = snapshot.user(user_id)?;
    let totals = views::totals(snapshot, user_id);
    let top_events = top_events(snapshot, user_id, top)
        .into_iter()
        .map(|e| QuickEvent {
            id: e.id,
            title: e.title,
            points: e.points,
        })
        .collect();
    let top_rewards = top_rewards(snapshot, user_id, top)
        .into_iter()
        .map(|r| QuickReward {
            unlocked: totals.earned_total >= i64::from(r.unlock_at_total),
            affordable: totals.balance >= i64::from(r.cost),
            id: r.id,
            title: r.title,
            cost: r.cost,
            unlock_at_total: r.unlock_at_total,
        })
        .collect();

    Some(StatusReport {
        user_id: user.id.clone(),
        name: user.name.clone(),
        active: snapshot.settings.active_user_id == user.id,
        totals,
        today: views::today_summary(snapshot, user_id, now_ms),
        unlock: views::unlock_progress(snapshot, user_id),
        top_events,
        top_rewards,
    })
}

fn write_text(r: &StatusReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "user\t{}\t{}", r.user_id, r.name)?;
    writeln!(
        w,
        "totals\t{}\t{}\t{}",
        r.totals.earned_total, r.totals.spent_total, r.totals.balance
    )?;
    writeln!(w, "today\t{}\t{}", r.today.today_earned, r.today.today_spent)?;
    let next = r
        .unlock
        .next_threshold
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    writeln!(w, "unlock\t{next}\t{:.0}", r.unlock.percent)?;
    for e in &r.top_events {
        writeln!(w, "event\t{}\t{}\t{}", e.id, e.points, e.title)?;
    }
    for rw in &r.top_rewards {
        writeln!(w, "reward\t{}\t{}\t{}", rw.id, rw.cost, rw.title)?;
    }
    Ok(())
}

fn write_pretty(r: &StatusReport, w: &mut dyn Write) -> std::io::Result<()> {
    let marker = if r.active { " (active)" } else { "" };
    pretty_section(w, &format!("{}{marker}", r.name))?;
    pretty_kv(w, "Balance", r.totals.balance.to_string())?;
    pretty_kv(w, "Earned", r.totals.earned_total.to_string())?;
    pretty_kv(w, "Spent", r.totals.spent_total.to_string())?;
    pretty_kv(
        w,
        "Today",
        format!("+{} / -{}", r.today.today_earned, r.today.today_spent),
    )?;
    let unlock = r.unlock.next_threshold.map_or_else(
        || "all rewards unlocked".to_string(),
        |next| format!("{:.0}% toward {next}", r.unlock.percent),
    );
    pretty_kv(w, "Next unlock", unlock)?;

    writeln!(w)?;
    pretty_section(w, "Quick events")?;
    for e in &r.top_events {
        writeln!(w, "  +{:<3} {} [{}]", e.points, e.title, e.id)?;
    }
    writeln!(w)?;
    pretty_section(w, "Quick rewards")?;
    for rw in &r.top_rewards {
        let state = if !rw.unlocked {
            format!("locked until {}", rw.unlock_at_total)
        } else if rw.affordable {
            "ready".to_string()
        } else {
            "need more points".to_string()
        };
        writeln!(w, "  -{:<3} {} [{}] {state}", rw.cost, rw.title, rw.id)?;
    }
    Ok(())
}

pub fn run_status(args: &StatusArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let snapshot = household.load();
    let user_id = household.resolve_user(&snapshot, args.user.as_deref())?;
    let report = build_report(&snapshot, &user_id, args.top, SystemClock.now_ms())
        .ok_or_else(|| fail(output, "User not found.", ErrorCode::UserNotFound))?;
    render_mode(output, &report, write_text, write_pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::clock::FixedClock;
    use hearth_core::ops;

    #[test]
    fn report_reflects_ledger() {
        let clock = FixedClock::at(1_000);
        let snapshot = ops::quick_adjust(&Snapshot::default(), &clock, "will", 12, "")
            .expect("adjust")
            .state;
        let report = build_report(&snapshot, "will", 3, 2_000).expect("report");
        assert_eq!(report.totals.balance, 12);
        assert!(!report.active);
        assert_eq!(report.unlock.next_threshold, Some(20));
        assert_eq!(report.top_events.len(), 3);
        assert!(report.top_rewards.iter().all(|r| r.unlocked));

        let mut buf = Vec::new();
        write_text(&report, &mut buf).expect("text");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("totals\t12\t0\t12"));
    }

    #[test]
    fn unknown_user_has_no_report() {
        assert!(build_report(&Snapshot::default(), "ghost", 3, 0).is_none());
    }
}

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Args;
use hearth_core::Snapshot;
use hearth_core::clock::{Clock, SystemClock};
use hearth_core::model::{EntryKind, LedgerEntry};
use hearth_core::views::{LedgerFilter, Window, filter_ledger, resolve_ref_title};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::Household;
use crate::output::{OutputMode, Renderable, render_list};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// User id (defaults to the active user).
    #[arg(long, short)]
    pub user: Option<String>,

    /// Only `earn` or `spend` rows.
    #[arg(long = "type", short = 't')]
    pub kind: Option<EntryKind>,

    /// Time range: 7d, 30d or all.
    #[arg(long, short, default_value = "7d")]
    pub range: Window,

    /// Only rows whose event or reward is in this category.
    #[arg(long, short)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    id: String,
    timestamp_ms: i64,
    time: String,
    kind: EntryKind,
    points: i64,
    title: String,
    ref_kind: &'static str,
    ref_id: String,
    note: String,
}

fn local_time(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map_or_else(
            || timestamp_ms.to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string(),
        )
}

impl HistoryRow {
    fn from_entry(snapshot: &Snapshot, entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            timestamp_ms: entry.timestamp_ms,
            time: local_time(entry.timestamp_ms),
            kind: entry.kind,
            points: entry.signed_points(),
            title: resolve_ref_title(snapshot, entry),
            ref_kind: entry.reference.kind_str(),
            ref_id: entry.reference.id().to_string(),
            note: entry.note.clone(),
        }
    }
}

impl Renderable for HistoryRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {:>+5}  {}", self.time, self.points, self.title)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.timestamp_ms, self.kind, self.points, self.ref_id, self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["TS", "TYPE", "POINTS", "REF", "TITLE"]
    }
}

fn history_rows(
    snapshot: &Snapshot,
    user_id: &str,
    filter: &LedgerFilter,
    now_ms: i64,
) -> Vec<HistoryRow> {
    filter_ledger(snapshot, user_id, filter, now_ms)
        .into_iter()
        .map(|entry| HistoryRow::from_entry(snapshot, entry))
        .collect()
}

pub fn run_history(args: &HistoryArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let household = Household::open(project_root, output)?;
    let snapshot = household.load();
    let user_id = household.resolve_user(&snapshot, args.user.as_deref())?;
    let filter = LedgerFilter {
        kind: args.kind,
        window: args.range,
        category: args
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    };
    let rows = history_rows(&snapshot, &user_id, &filter, SystemClock.now_ms());
    tracing::debug!(user = %user_id, range = %args.range, rows = rows.len(), "history");
    if rows.is_empty() && output == OutputMode::Pretty {
        println!("No entries in the last {}.", args.range);
        return Ok(());
    }
    render_list(&rows, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::clock::{FixedClock, MS_PER_DAY};
    use hearth_core::ops;

    fn sample() -> Snapshot {
        let clock = FixedClock::at(10 * MS_PER_DAY);
        let snapshot = ops::earn_event(&Snapshot::default(), &clock, "will", "tidy_room", "")
            .expect("earn")
            .state;
        clock.advance(1_000);
        let snapshot = ops::quick_adjust(&snapshot, &clock, "will", 20, "birthday")
            .expect("adjust")
            .state;
        clock.advance(1_000);
        ops::redeem(&snapshot, &clock, "will", "dessert_pick", "")
            .expect("redeem")
            .state
    }

    #[test]
    fn rows_are_newest_first_with_titles() {
        let snapshot = sample();
        let now = 10 * MS_PER_DAY + 5_000;
        let rows = history_rows(&snapshot, "will", &LedgerFilter::default(), now);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Pick family dessert", "birthday", "Tidy room"]);
        assert_eq!(rows[0].points, -4);
    }

    #[test]
    fn type_and_category_filters() {
        let snapshot = sample();
        let now = 10 * MS_PER_DAY + 5_000;
        let spends = LedgerFilter {
            kind: Some(EntryKind::Spend),
            ..LedgerFilter::default()
        };
        assert_eq!(history_rows(&snapshot, "will", &spends, now).len(), 1);

        let category = snapshot.events_for("will")[0].category.clone();
        let by_category = LedgerFilter {
            category: Some(category),
            ..LedgerFilter::default()
        };
        let rows = history_rows(&snapshot, "will", &by_category, now);
        assert!(rows.iter().all(|r| r.ref_kind == "event"));
    }

    #[test]
    fn window_excludes_old_rows() {
        let snapshot = sample();
        let later = 10 * MS_PER_DAY + 8 * MS_PER_DAY;
        assert!(history_rows(&snapshot, "will", &LedgerFilter::default(), later).is_empty());
        let all = LedgerFilter {
            window: Window::All,
            ..LedgerFilter::default()
        };
        assert_eq!(history_rows(&snapshot, "will", &all, later).len(), 3);
    }
}

//! Most-used events and most-redeemed rewards.
//!
//! Ranking: occurrence count descending, then most recent use descending,
//! then title ascending ignoring case. Items with no history pad the list in
//! catalog order.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::model::{CatalogItem, EntryKind, Event, LedgerEntry, Reference, Reward, Snapshot};

pub const DEFAULT_TOP_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
struct Usage {
    count: u32,
    latest_ms: i64,
}

fn usage_by_id<'a>(
    rows: impl Iterator<Item = &'a LedgerEntry>,
    pick: impl Fn(&'a LedgerEntry) -> Option<&'a str>,
) -> HashMap<&'a str, Usage> {
    let mut stats: HashMap<&str, Usage> = HashMap::new();
    for row in rows {
        let Some(id) = pick(row) else {
            continue;
        };
        let stat = stats.entry(id).or_default();
        stat.count += 1;
        stat.latest_ms = stat.latest_ms.max(row.timestamp_ms);
    }
    stats
}

fn rank<'a, T: CatalogItem + Clone>(
    items: &'a [T],
    stats: &HashMap<&str, Usage>,
    limit: usize,
) -> Vec<T> {
    let enabled: Vec<&'a T> = items.iter().filter(|item| item.enabled()).collect();
    let mut used: Vec<(&'a T, Usage)> = enabled
        .iter()
        .filter_map(|item| stats.get(item.id()).map(|stat| (*item, *stat)))
        .collect();
    used.sort_by_cached_key(|(item, stat)| {
        (
            Reverse(stat.count),
            Reverse(stat.latest_ms),
            item.title().to_lowercase(),
        )
    });

    let mut picked: Vec<&'a T> = used.into_iter().map(|(item, _)| item).take(limit).collect();
    for item in enabled {
        if picked.len() >= limit {
            break;
        }
        if !picked.iter().any(|p| p.id() == item.id()) {
            picked.push(item);
        }
    }
    picked.into_iter().cloned().collect()
}

/// Enabled events the user earns from most often.
#[must_use]
pub fn top_events(snapshot: &Snapshot, user_id: &str, limit: usize) -> Vec<Event> {
    let stats = usage_by_id(snapshot.ledger_for(user_id), |row| match (&row.kind, &row.reference) {
        (EntryKind::Earn, Reference::Event(id)) => Some(id.as_str()),
        _ => None,
    });
    rank(snapshot.events_for(user_id), &stats, limit)
}

/// Enabled rewards the user redeems most often.
#[must_use]
pub fn top_rewards(snapshot: &Snapshot, user_id: &str, limit: usize) -> Vec<Reward> {
    let stats = usage_by_id(snapshot.ledger_for(user_id), |row| match (&row.kind, &row.reference) {
        (EntryKind::Spend, Reference::Reward(id)) => Some(id.as_str()),
        _ => None,
    });
    rank(snapshot.rewards_for(user_id), &stats, limit)
}

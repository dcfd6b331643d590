//! Ledger filtering for history listings.

use std::fmt;
use std::str::FromStr;

use crate::clock::MS_PER_DAY;
use crate::model::{EntryKind, LedgerEntry, Reference, Snapshot};

/// Time window anchored to the current wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Window {
    #[default]
    Last7Days,
    Last30Days,
    All,
}

impl Window {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::All => "all",
        }
    }

    /// Oldest timestamp included when the window ends at `now_ms`.
    #[must_use]
    pub const fn earliest_ms(self, now_ms: i64) -> i64 {
        match self {
            Self::Last7Days => now_ms - 7 * MS_PER_DAY,
            Self::Last30Days => now_ms - 30 * MS_PER_DAY,
            Self::All => i64::MIN,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown range '{0}' (expected 7d, 30d or all)")]
pub struct UnknownWindow(pub String);

impl FromStr for Window {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7" | "7d" => Ok(Self::Last7Days),
            "30" | "30d" => Ok(Self::Last30Days),
            "all" => Ok(Self::All),
            other => Err(UnknownWindow(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// `None` keeps both kinds.
    pub kind: Option<EntryKind>,
    pub window: Window,
    /// Category of the referenced event or reward. Rows without a catalog
    /// reference never match a category.
    pub category: Option<String>,
}

fn referenced_category<'a>(snapshot: &'a Snapshot, entry: &LedgerEntry) -> Option<&'a str> {
    match &entry.reference {
        Reference::Event(id) => snapshot
            .events_for(&entry.user_id)
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.category.as_str()),
        Reference::Reward(id) => snapshot
            .rewards_for(&entry.user_id)
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.category.as_str()),
        Reference::None => None,
    }
}

/// Rows sorted by timestamp, newest first. Equal timestamps keep input order.
#[must_use]
pub fn sort_newest_first<'a>(
    rows: impl IntoIterator<Item = &'a LedgerEntry>,
) -> Vec<&'a LedgerEntry> {
    let mut rows: Vec<&LedgerEntry> = rows.into_iter().collect();
    rows.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    rows
}

/// One user's ledger rows that pass `filter`, newest first.
#[must_use]
pub fn filter_ledger<'a>(
    snapshot: &'a Snapshot,
    user_id: &str,
    filter: &LedgerFilter,
    now_ms: i64,
) -> Vec<&'a LedgerEntry> {
    let earliest = filter.window.earliest_ms(now_ms);
    let rows = snapshot.ledger.iter().filter(|entry| {
        entry.user_id == user_id
            && filter.kind.is_none_or(|kind| entry.kind == kind)
            && entry.timestamp_ms >= earliest
            && filter.category.as_deref().is_none_or(|category| {
                referenced_category(snapshot, entry) == Some(category)
            })
    });
    sort_newest_first(rows)
}

/// Display title for a ledger row: the referenced item's current title,
/// then the row note, then the raw reference id.
#[must_use]
pub fn resolve_ref_title(snapshot: &Snapshot, entry: &LedgerEntry) -> String {
    let current = match &entry.reference {
        Reference::Event(id) => snapshot
            .events_for(&entry.user_id)
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.title.as_str()),
        Reference::Reward(id) => snapshot
            .rewards_for(&entry.user_id)
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.title.as_str()),
        Reference::None => None,
    };
    current
        .filter(|title| !title.is_empty())
        .or_else(|| Some(entry.note.as_str()).filter(|note| !note.is_empty()))
        .unwrap_or_else(|| entry.reference.id())
        .to_string()
}

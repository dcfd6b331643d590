//! Ledger rows.
//!
//! The ledger is append-only. A user's balance is never stored; it is always
//! summed from their rows (see [`crate::views::totals`]).
//!
//! On the wire a row keeps the flat layout written by earlier releases
//! (`ts`, `type`, `ref_kind`, `ref_id`); in memory the reference is a
//! [`Reference`] sum type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Earn,
    Spend,
}

/// Error returned when parsing an unknown entry kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntryKind {
    pub raw: String,
}

impl fmt::Display for UnknownEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entry kind '{}': expected earn or spend", self.raw)
    }
}

impl std::error::Error for UnknownEntryKind {}

impl EntryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Spend => "spend",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = UnknownEntryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earn" => Ok(Self::Earn),
            "spend" => Ok(Self::Spend),
            _ => Err(UnknownEntryKind { raw: s.to_string() }),
        }
    }
}

/// What a ledger row points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// An event id in the owning user's catalog (or a pseudo id such as `custom`).
    Event(String),
    /// A reward id in the owning user's catalog.
    Reward(String),
    /// Ad-hoc rows with no catalog item behind them.
    None,
}

impl Reference {
    /// Wire discriminant for `ref_kind`.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Reward(_) => "reward",
            Self::None => "none",
        }
    }

    /// Referenced id, empty for [`Reference::None`].
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Event(id) | Self::Reward(id) => id,
            Self::None => "",
        }
    }

    /// Rebuild a reference from its wire pair. Unknown kinds map to `None`.
    #[must_use]
    pub fn from_parts(kind: &str, id: &str) -> Self {
        match kind {
            "event" => Self::Event(id.to_string()),
            "reward" => Self::Reward(id.to_string()),
            _ => Self::None,
        }
    }
}

/// One immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LedgerRow", into = "LedgerRow")]
pub struct LedgerEntry {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub user_id: String,
    pub kind: EntryKind,
    pub reference: Reference,
    /// Always a magnitude; direction lives in `kind`.
    pub points: u32,
    pub note: String,
}

impl LedgerEntry {
    /// Signed contribution of this row to a balance.
    #[must_use]
    pub fn signed_points(&self) -> i64 {
        match self.kind {
            EntryKind::Earn => i64::from(self.points),
            EntryKind::Spend => -i64::from(self.points),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LedgerRow {
    id: String,
    ts: i64,
    user_id: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    ref_kind: String,
    #[serde(default)]
    ref_id: String,
    points: u32,
    #[serde(default)]
    note: String,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        Self {
            reference: Reference::from_parts(&row.ref_kind, &row.ref_id),
            id: row.id,
            timestamp_ms: row.ts,
            user_id: row.user_id,
            kind: row.kind,
            points: row.points,
            note: row.note,
        }
    }
}

impl From<LedgerEntry> for LedgerRow {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            ref_kind: entry.reference.kind_str().to_string(),
            ref_id: entry.reference.id().to_string(),
            id: entry.id,
            ts: entry.timestamp_ms,
            user_id: entry.user_id,
            kind: entry.kind,
            points: entry.points,
            note: entry.note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerEntry {
        LedgerEntry {
            id: "e-1".into(),
            timestamp_ms: 1_700_000_000_000,
            user_id: "will".into(),
            kind: EntryKind::Spend,
            reference: Reference::Reward("movie_choice".into()),
            points: 8,
            note: "Choose movie tonight".into(),
        }
    }

    #[test]
    fn serializes_flat_wire_layout() {
        let value = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(value["ts"], 1_700_000_000_000_i64);
        assert_eq!(value["type"], "spend");
        assert_eq!(value["ref_kind"], "reward");
        assert_eq!(value["ref_id"], "movie_choice");
    }

    #[test]
    fn wire_layout_reads_back() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        let back: LedgerEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sample());
    }

    #[test]
    fn unknown_ref_kind_becomes_none() {
        assert_eq!(Reference::from_parts("badge", "x"), Reference::None);
        assert_eq!(Reference::None.id(), "");
    }

    #[test]
    fn signed_points_follow_kind() {
        let mut entry = sample();
        assert_eq!(entry.signed_points(), -8);
        entry.kind = EntryKind::Earn;
        assert_eq!(entry.signed_points(), 8);
    }

    #[test]
    fn entry_kind_rejects_unknown() {
        let err = "refund".parse::<EntryKind>().unwrap_err();
        assert_eq!(err.raw, "refund");
        assert!(err.to_string().contains("expected earn or spend"));
    }
}

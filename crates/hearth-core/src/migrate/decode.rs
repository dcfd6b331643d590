//! Lenient field readers over untyped JSON.
//!
//! Stored documents were written by several releases and occasionally edited
//! by hand. These helpers read one field at a time and return `None` instead
//! of failing, so a single bad row never poisons the rest of a document.

use serde_json::{Map, Value};

use crate::model::catalog::FALLBACK_CATEGORY;
use crate::model::{EntryKind, Event, LedgerEntry, Reference, Reward};

use super::rules::MigrationRules;

/// Strings as-is, numbers rendered, anything else absent.
pub fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String content, empty for anything that is not a string.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

pub fn finite(value: Option<&Value>) -> Option<f64> {
    value?.as_f64().filter(|n| n.is_finite())
}

/// Millisecond timestamp. Integers are read exactly; finite floats are truncated.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn timestamp(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        let n = value.as_f64().filter(|n| n.is_finite())?.trunc();
        (n >= i64::MIN as f64 && n < i64::MAX as f64).then_some(n as i64)
    })
}

/// Non-negative finite number floored to `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn whole_u32(value: Option<&Value>) -> Option<u32> {
    let n = finite(value)?.floor();
    if n < 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

/// JSON truthiness: `true`, non-zero numbers and non-empty strings.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

fn category(row: &Map<String, Value>) -> String {
    let raw = text(row.get("category"));
    if raw.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        raw
    }
}

/// Decode one event row. Rows without an id or with non-positive points are dropped.
pub fn event(value: &Value) -> Option<Event> {
    let row = value.as_object()?;
    let id = id_string(row.get("id")).filter(|id| !id.is_empty())?;
    let points = whole_u32(row.get("points")).filter(|p| *p > 0)?;
    Some(Event {
        id,
        category: category(row),
        title: text(row.get("title")),
        points,
        enabled: truthy(row.get("enabled")),
        description: text(row.get("description")),
    })
}

/// Decode one reward row. A missing threshold means "always unlocked".
pub fn reward(value: &Value) -> Option<Reward> {
    let row = value.as_object()?;
    let id = id_string(row.get("id")).filter(|id| !id.is_empty())?;
    let cost = whole_u32(row.get("cost")).filter(|c| *c > 0)?;
    let unlock_at_total = match row.get("unlock_at_total") {
        None | Some(Value::Null) => 0,
        present => whole_u32(present)?,
    };
    Some(Reward {
        id,
        category: category(row),
        title: text(row.get("title")),
        cost,
        unlock_at_total,
        enabled: truthy(row.get("enabled")),
    })
}

/// Decode one ledger row, rewriting renamed user ids.
///
/// `position` seeds a stable id for legacy rows that were stored without one.
pub fn ledger_entry(value: &Value, position: usize, rules: &MigrationRules) -> Option<LedgerEntry> {
    let row = value.as_object()?;
    let Some(Value::String(raw_user)) = row.get("user_id") else {
        return None;
    };
    let kind = row.get("type")?.as_str()?.parse::<EntryKind>().ok()?;
    let points = whole_u32(row.get("points"))?;
    let ts = timestamp(row.get("ts"))?;

    let id = id_string(row.get("id"))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("legacy-{ts}-{position}"));
    let reference = Reference::from_parts(
        &text(row.get("ref_kind")),
        &id_string(row.get("ref_id")).unwrap_or_default(),
    );

    Some(LedgerEntry {
        id,
        timestamp_ms: ts,
        user_id: rules.resolve_id(raw_user).to_string(),
        kind,
        reference,
        points,
        note: text(row.get("note")),
    })
}

//! Create, update and delete events and rewards in one user's catalog.
//!
//! Upserts keyed by an existing id replace that row in place, keeping its
//! position. Anything else is appended under a new id derived from the
//! supplied id or the title.

use std::collections::HashSet;
use tracing::debug;

use super::{CommandError, Outcome, require_user};
use crate::clock::Clock;
use crate::model::catalog::FALLBACK_CATEGORY;
use crate::model::{CatalogItem, Event, Reward, Snapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    /// Existing id to update; a new id is derived when it matches nothing.
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub description: String,
    pub points: i64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardDraft {
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub cost: i64,
    pub unlock_at_total: i64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    Created,
    Updated,
}

impl UpsertMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    pub item: T,
    pub mode: UpsertMode,
}

/// Lowercase, collapse every run of non `[a-z0-9]` characters into a single
/// `_`, and trim separators from both ends.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;
    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }
    out
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[usize::try_from(n % 36).unwrap_or_default()]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Collision-free id for a new row: the slug, or `slug_2`, `slug_3`, ...
fn unique_id<T: CatalogItem>(
    items: &[T],
    seed_text: &str,
    prefix: &str,
    clock: &impl Clock,
) -> String {
    let slug = slugify(seed_text);
    let seed = if slug.is_empty() {
        let stamp = u64::try_from(clock.now_ms()).unwrap_or_default();
        format!("{prefix}_{}", base36(stamp))
    } else {
        slug
    };
    let used: HashSet<&str> = items.iter().map(CatalogItem::id).collect();
    if !used.contains(seed.as_str()) {
        return seed;
    }
    (2_u64..)
        .map(|i| format!("{seed}_{i}"))
        .find(|candidate| !used.contains(candidate.as_str()))
        .unwrap_or(seed)
}

fn normalized_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Place `item` at the row with its id, or append it.
fn place<T: CatalogItem + Clone>(rows: &[T], item: T, mode: UpsertMode) -> Vec<T> {
    match mode {
        UpsertMode::Updated => rows
            .iter()
            .map(|row| {
                if row.id() == item.id() {
                    item.clone()
                } else {
                    row.clone()
                }
            })
            .collect(),
        UpsertMode::Created => {
            let mut next = rows.to_vec();
            next.push(item);
            next
        }
    }
}

/// Resolve the target id and mode for an upsert.
fn resolve_target<T: CatalogItem>(
    rows: &[T],
    requested: Option<&str>,
    title: &str,
    prefix: &str,
    clock: &impl Clock,
) -> (String, UpsertMode) {
    let requested = requested.map(str::trim).unwrap_or_default();
    if !requested.is_empty() && rows.iter().any(|row| row.id() == requested) {
        return (requested.to_string(), UpsertMode::Updated);
    }
    let seed = if requested.is_empty() { title } else { requested };
    (unique_id(rows, seed, prefix, clock), UpsertMode::Created)
}

/// Create an event, or replace the one whose id matches `draft.id` in place.
///
/// # Errors
///
/// Returns [`CommandError::TitleRequired`] for a blank title and
/// [`CommandError::InvalidPoints`] unless points are a positive integer.
pub fn upsert_event(
    snapshot: &Snapshot,
    clock: &impl Clock,
    user_id: &str,
    draft: &EventDraft,
) -> Result<Outcome<Upserted<Event>>, CommandError> {
    require_user(snapshot, user_id)?;
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(CommandError::TitleRequired("Event"));
    }
    let points = u32::try_from(draft.points)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(CommandError::InvalidPoints(
            "Event points must be a positive integer.",
        ))?;

    let rows = snapshot.events_for(user_id);
    let (id, mode) = resolve_target(rows, draft.id.as_deref(), title, "event", clock);
    let item = Event {
        id,
        category: normalized_category(&draft.category),
        title: title.to_string(),
        points,
        enabled: draft.enabled,
        description: draft.description.trim().to_string(),
    };
    debug!(user = user_id, id = %item.id, mode = mode.as_str(), "upsert event");
    let next = place(rows, item.clone(), mode);
    Ok(Outcome::new(
        snapshot.with_events(user_id, next),
        Upserted { item, mode },
    ))
}

/// Create a reward, or replace the one whose id matches `draft.id` in place.
///
/// # Errors
///
/// Fails on a blank title, a non-positive cost or a negative unlock
/// threshold.
pub fn upsert_reward(
    snapshot: &Snapshot,
    clock: &impl Clock,
    user_id: &str,
    draft: &RewardDraft,
) -> Result<Outcome<Upserted<Reward>>, CommandError> {
    require_user(snapshot, user_id)?;
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(CommandError::TitleRequired("Reward"));
    }
    let cost = u32::try_from(draft.cost)
        .ok()
        .filter(|c| *c > 0)
        .ok_or(CommandError::InvalidPoints(
            "Reward cost must be a positive integer.",
        ))?;
    let unlock_at_total =
        u32::try_from(draft.unlock_at_total).map_err(|_| CommandError::InvalidThreshold)?;

    let rows = snapshot.rewards_for(user_id);
    let (id, mode) = resolve_target(rows, draft.id.as_deref(), title, "reward", clock);
    let item = Reward {
        id,
        category: normalized_category(&draft.category),
        title: title.to_string(),
        cost,
        unlock_at_total,
        enabled: draft.enabled,
    };
    debug!(user = user_id, id = %item.id, mode = mode.as_str(), "upsert reward");
    let next = place(rows, item.clone(), mode);
    Ok(Outcome::new(
        snapshot.with_rewards(user_id, next),
        Upserted { item, mode },
    ))
}

pub fn delete_event(
    snapshot: &Snapshot,
    user_id: &str,
    event_id: &str,
) -> Result<Outcome<Event>, CommandError> {
    require_user(snapshot, user_id)?;
    let target = event_id.trim();
    let rows = snapshot.events_for(user_id);
    let removed = rows
        .iter()
        .find(|row| row.id == target)
        .cloned()
        .ok_or_else(|| CommandError::EventNotFound {
            event_id: target.to_string(),
        })?;
    let next = rows.iter().filter(|row| row.id != target).cloned().collect();
    Ok(Outcome::new(snapshot.with_events(user_id, next), removed))
}

pub fn delete_reward(
    snapshot: &Snapshot,
    user_id: &str,
    reward_id: &str,
) -> Result<Outcome<Reward>, CommandError> {
    require_user(snapshot, user_id)?;
    let target = reward_id.trim();
    let rows = snapshot.rewards_for(user_id);
    let removed = rows
        .iter()
        .find(|row| row.id == target)
        .cloned()
        .ok_or_else(|| CommandError::RewardNotFound {
            reward_id: target.to_string(),
        })?;
    let next = rows.iter().filter(|row| row.id != target).cloned().collect();
    Ok(Outcome::new(snapshot.with_rewards(user_id, next), removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn draft(title: &str, points: i64) -> EventDraft {
        EventDraft {
            title: title.into(),
            category: "Chores".into(),
            points,
            enabled: true,
            ..EventDraft::default()
        }
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Feed the Cat!! "), "feed_the_cat");
        assert_eq!(slugify("--Read 15 min--"), "read_15_min");
        assert_eq!(slugify("Crème brûlée"), "cr_me_br_l_e");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn create_appends_with_slug_id() {
        let clock = FixedClock::at(0);
        let snapshot = Snapshot::default();
        let outcome = upsert_event(&snapshot, &clock, "will", &draft("Feed the cat", 2)).expect("create");
        assert_eq!(outcome.value.mode, UpsertMode::Created);
        assert_eq!(outcome.value.item.id, "feed_the_cat");
        let events = outcome.state.events_for("will");
        assert_eq!(events.last().map(|e| e.id.as_str()), Some("feed_the_cat"));
        assert_eq!(events.len(), snapshot.events_for("will").len() + 1);
    }

    #[test]
    fn colliding_titles_get_numeric_suffix() {
        let clock = FixedClock::at(0);
        let snapshot = Snapshot::default();
        let first = upsert_event(&snapshot, &clock, "will", &draft("Tidy room", 1)).expect("first");
        assert_eq!(first.value.item.id, "tidy_room_2");
        let second = upsert_event(&first.state, &clock, "will", &draft("Tidy room", 1)).expect("second");
        assert_eq!(second.value.item.id, "tidy_room_3");
    }

    #[test]
    fn update_keeps_position() {
        let clock = FixedClock::at(0);
        let snapshot = Snapshot::default();
        let mut edit = draft("Set the table nicely", 5);
        edit.id = Some("set_table".into());
        let outcome = upsert_event(&snapshot, &clock, "will", &edit).expect("update");
        assert_eq!(outcome.value.mode, UpsertMode::Updated);

        let before = snapshot.events_for("will");
        let after = outcome.state.events_for("will");
        assert_eq!(before.len(), after.len());
        let index = before.iter().position(|e| e.id == "set_table").expect("present");
        assert_eq!(after[index].title, "Set the table nicely");
        assert_eq!(after[index].points, 5);
        assert_eq!(before[index].points, 2, "input snapshot untouched");
    }

    #[test]
    fn blank_title_and_bad_points_are_rejected() {
        let clock = FixedClock::at(0);
        let snapshot = Snapshot::default();
        assert_eq!(
            upsert_event(&snapshot, &clock, "will", &draft("   ", 1)),
            Err(CommandError::TitleRequired("Event"))
        );
        assert!(matches!(
            upsert_event(&snapshot, &clock, "will", &draft("Nap", 0)),
            Err(CommandError::InvalidPoints(_))
        ));
    }

    #[test]
    fn blank_category_falls_back() {
        let clock = FixedClock::at(0);
        let mut d = draft("Water plants", 1);
        d.category = "  ".into();
        let outcome = upsert_event(&Snapshot::default(), &clock, "mom", &d).expect("create");
        assert_eq!(outcome.value.item.category, FALLBACK_CATEGORY);
    }

    #[test]
    fn unslugifiable_title_uses_timestamp_id() {
        let clock = FixedClock::at(36);
        let outcome = upsert_event(&Snapshot::default(), &clock, "mom", &draft("???", 1)).expect("create");
        assert_eq!(outcome.value.item.id, "event_10");
    }

    #[test]
    fn reward_validation() {
        let clock = FixedClock::at(0);
        let snapshot = Snapshot::default();
        let mut d = RewardDraft {
            title: "Park trip".into(),
            cost: 6,
            unlock_at_total: -1,
            enabled: true,
            ..RewardDraft::default()
        };
        assert_eq!(
            upsert_reward(&snapshot, &clock, "will", &d),
            Err(CommandError::InvalidThreshold)
        );
        d.unlock_at_total = 15;
        let outcome = upsert_reward(&snapshot, &clock, "will", &d).expect("create");
        assert_eq!(outcome.value.item.id, "park_trip");
        assert_eq!(outcome.value.item.unlock_at_total, 15);
        assert_eq!(outcome.value.item.category, FALLBACK_CATEGORY);

        d.cost = 0;
        assert!(matches!(
            upsert_reward(&snapshot, &clock, "will", &d),
            Err(CommandError::InvalidPoints(_))
        ));
    }

    #[test]
    fn delete_removes_only_target_user_row() {
        let snapshot = Snapshot::default();
        let outcome = delete_reward(&snapshot, "will", "friend_call").expect("delete");
        assert!(outcome.state.rewards_for("will").iter().all(|r| r.id != "friend_call"));
        assert!(outcome.state.rewards_for("mom").iter().any(|r| r.id == "friend_call"));
        assert!(matches!(
            delete_reward(&outcome.state, "will", "friend_call"),
            Err(CommandError::RewardNotFound { .. })
        ));
        assert!(matches!(
            delete_event(&snapshot, "will", "nope"),
            Err(CommandError::EventNotFound { .. })
        ));
    }
}

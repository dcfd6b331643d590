//! Operations that append to the ledger, plus active-user selection.

use tracing::debug;

use super::{CommandError, Outcome, require_user};
use crate::clock::Clock;
use crate::model::{EntryKind, LedgerEntry, Reference, Snapshot};
use crate::views::totals::totals;

/// Points earned from an event, or ad hoc when `event_id` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EarnRequest {
    pub user_id: String,
    pub event_id: Option<String>,
    pub points: f64,
    /// Defaults to the event title when empty.
    pub note: String,
}

/// Make `user_id` the active user.
///
/// # Errors
///
/// Returns [`CommandError::UserNotFound`] when the id is not in the roster.
pub fn set_active_user(snapshot: &Snapshot, user_id: &str) -> Result<Outcome<()>, CommandError> {
    require_user(snapshot, user_id)?;
    let mut settings = snapshot.settings.clone();
    settings.active_user_id = user_id.to_string();
    Ok(Outcome::new(snapshot.with_settings(settings), ()))
}

/// Append an `earn` row. Fractional points are floored.
///
/// # Errors
///
/// Returns [`CommandError::UserNotFound`] for an unknown user and
/// [`CommandError::InvalidPoints`] when the floored amount is below 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn earn(
    snapshot: &Snapshot,
    clock: &impl Clock,
    request: &EarnRequest,
) -> Result<Outcome<LedgerEntry>, CommandError> {
    require_user(snapshot, &request.user_id)?;
    if !request.points.is_finite() || request.points <= 0.0 {
        return Err(CommandError::InvalidPoints(
            "Points must be a positive number.",
        ));
    }
    let floored = request.points.floor();
    if floored < 1.0 || floored > f64::from(u32::MAX) {
        return Err(CommandError::InvalidPoints(
            "Points must be a whole number of at least 1.",
        ));
    }

    let event_id = request
        .event_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let event = event_id.and_then(|id| {
        snapshot
            .events_for(&request.user_id)
            .iter()
            .find(|e| e.id == id)
    });
    let note = if request.note.trim().is_empty() {
        event.map(|e| e.title.clone()).unwrap_or_default()
    } else {
        request.note.trim().to_string()
    };

    let entry = LedgerEntry {
        id: clock.new_entry_id(),
        timestamp_ms: clock.now_ms(),
        user_id: request.user_id.clone(),
        kind: EntryKind::Earn,
        reference: event_id.map_or(Reference::None, |id| Reference::Event(id.to_string())),
        points: floored as u32,
        note,
    };
    debug!(user = %entry.user_id, points = entry.points, "earn");
    Ok(Outcome::new(snapshot.with_entry(entry.clone()), entry))
}

/// Earn the configured points for an enabled event in the user's catalog.
///
/// # Errors
///
/// Returns [`CommandError::EventNotFound`] when the event is missing or
/// disabled.
pub fn earn_event(
    snapshot: &Snapshot,
    clock: &impl Clock,
    user_id: &str,
    event_id: &str,
    note: &str,
) -> Result<Outcome<LedgerEntry>, CommandError> {
    require_user(snapshot, user_id)?;
    let event = snapshot
        .events_for(user_id)
        .iter()
        .find(|e| e.id == event_id && e.enabled)
        .ok_or_else(|| CommandError::EventNotFound {
            event_id: event_id.to_string(),
        })?;
    earn(
        snapshot,
        clock,
        &EarnRequest {
            user_id: user_id.to_string(),
            event_id: Some(event.id.clone()),
            points: f64::from(event.points),
            note: note.to_string(),
        },
    )
}

/// Signed manual correction: positive amounts earn, negative amounts spend.
///
/// # Errors
///
/// Returns [`CommandError::InvalidPoints`] for a zero amount or one whose
/// magnitude does not fit a ledger row.
pub fn quick_adjust(
    snapshot: &Snapshot,
    clock: &impl Clock,
    user_id: &str,
    amount: i64,
    note: &str,
) -> Result<Outcome<LedgerEntry>, CommandError> {
    require_user(snapshot, user_id)?;
    if amount == 0 {
        return Err(CommandError::InvalidPoints(
            "Points must be a non-zero integer.",
        ));
    }
    let points = u32::try_from(amount.unsigned_abs()).map_err(|_| {
        CommandError::InvalidPoints("Points adjustment is too large.")
    })?;
    let kind = if amount > 0 {
        EntryKind::Earn
    } else {
        EntryKind::Spend
    };
    let note = if note.trim().is_empty() {
        format!("Quick adjust {amount:+}")
    } else {
        note.trim().to_string()
    };

    let entry = LedgerEntry {
        id: clock.new_entry_id(),
        timestamp_ms: clock.now_ms(),
        user_id: user_id.to_string(),
        kind,
        reference: Reference::None,
        points,
        note,
    };
    debug!(user = %entry.user_id, amount, "quick adjust");
    Ok(Outcome::new(snapshot.with_entry(entry.clone()), entry))
}

/// Spend a reward's cost.
///
/// The reward must be enabled, unlocked by lifetime earnings, and affordable
/// from the current balance.
///
/// # Errors
///
/// Returns [`CommandError::RewardLocked`] or
/// [`CommandError::InsufficientBalance`] when the rules above fail.
pub fn redeem(
    snapshot: &Snapshot,
    clock: &impl Clock,
    user_id: &str,
    reward_id: &str,
    note: &str,
) -> Result<Outcome<LedgerEntry>, CommandError> {
    require_user(snapshot, user_id)?;
    let reward = snapshot
        .rewards_for(user_id)
        .iter()
        .find(|r| r.id == reward_id && r.enabled)
        .ok_or_else(|| CommandError::RewardNotFound {
            reward_id: reward_id.to_string(),
        })?;

    let sums = totals(snapshot, user_id);
    if sums.earned_total < i64::from(reward.unlock_at_total) {
        return Err(CommandError::RewardLocked {
            earned_total: sums.earned_total,
            unlock_at_total: reward.unlock_at_total,
        });
    }
    if sums.balance < i64::from(reward.cost) {
        return Err(CommandError::InsufficientBalance {
            balance: sums.balance,
            cost: reward.cost,
        });
    }

    let entry = LedgerEntry {
        id: clock.new_entry_id(),
        timestamp_ms: clock.now_ms(),
        user_id: user_id.to_string(),
        kind: EntryKind::Spend,
        reference: Reference::Reward(reward.id.clone()),
        points: reward.cost,
        note: if note.trim().is_empty() {
            reward.title.clone()
        } else {
            note.trim().to_string()
        },
    };
    debug!(user = %entry.user_id, reward = %reward.id, cost = reward.cost, "redeem");
    Ok(Outcome::new(snapshot.with_entry(entry.clone()), entry))
}

//! Seed roster, starter catalogs and default settings.
//!
//! Every call builds fresh values, so no two users (and no two snapshots)
//! ever share a catalog row.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{CURRENT_VERSION, Event, Reward, Settings, Snapshot, User};

/// Sync endpoint used when none is configured or the stored one is blank.
pub const DEFAULT_SYNC_URL: &str = "http://127.0.0.1:8787";

fn event(id: &str, category: &str, title: &str, points: u32, description: &str) -> Event {
    Event {
        id: id.to_string(),
        category: category.to_string(),
        title: title.to_string(),
        points,
        enabled: true,
        description: description.to_string(),
    }
}

fn reward(id: &str, category: &str, title: &str, cost: u32, unlock_at_total: u32) -> Reward {
    Reward {
        id: id.to_string(),
        category: category.to_string(),
        title: title.to_string(),
        cost,
        unlock_at_total,
        enabled: true,
    }
}

/// Starter event catalog handed to every user.
#[must_use]
pub fn seed_events() -> Vec<Event> {
    vec![
        event("eat_veg", "Food", "Ate a vegetable", 1, "Any green or colorful veggie."),
        event("drink_water", "Food", "Drank water", 1, "Finished one full cup."),
        event("set_table", "Chores", "Set the table", 2, "Ready before meal."),
        event("tidy_room", "Chores", "Tidy room", 3, "Room tidy check passed."),
        event("read_15", "Learning", "Read 15 minutes", 2, "Book or educational reading."),
        event("math_practice", "Learning", "Math practice", 3, "Completed assigned practice."),
        event("help_others", "Other", "Helped someone kindly", 2, "Parent verified helpful act."),
        event("exercise", "Other", "Exercise session", 2, "At least 15 active minutes."),
    ]
}

/// Starter reward catalog handed to every user.
#[must_use]
pub fn seed_rewards() -> Vec<Reward> {
    vec![
        reward("minigame_1", "Game", "Play a mini game", 2, 0),
        reward("dessert_pick", "Family", "Pick family dessert", 4, 0),
        reward("me_time_5", "Me-time", "Me time 5 min", 3, 10),
        reward("movie_choice", "Family", "Choose movie tonight", 8, 10),
        reward("extra_game_15", "Game", "Extra game time 15 min", 10, 20),
        reward("stay_up_15", "Me-time", "Stay up 15 min later", 12, 20),
        reward("friend_call", "Other", "Friend video call", 16, 50),
        reward("weekend_pick", "Family", "Pick weekend activity", 20, 50),
    ]
}

#[must_use]
pub fn seed_users() -> Vec<User> {
    vec![
        User::new("mom", "Mom"),
        User::new("dad", "Dad"),
        User::new("will", "Willow"),
        User::new("grandpa", "Grandpa"),
        User::new("grandma", "Grandma"),
        User::new("niece", "Niece"),
    ]
}

#[must_use]
pub fn default_settings(active_user_id: &str) -> Settings {
    Settings {
        active_user_id: active_user_id.to_string(),
        parent_pin_hash: String::new(),
        sound_enabled: false,
        sync_endpoint_url: DEFAULT_SYNC_URL.to_string(),
    }
}

/// A fresh snapshot: seed roster, per-user copies of the starter catalogs,
/// an empty ledger and default settings.
#[must_use]
pub fn default_snapshot() -> Snapshot {
    let users = seed_users();
    let mut events_by_user = BTreeMap::new();
    let mut rewards_by_user = BTreeMap::new();
    for user in &users {
        events_by_user.insert(user.id.clone(), Arc::new(seed_events()));
        rewards_by_user.insert(user.id.clone(), Arc::new(seed_rewards()));
    }
    let active = users.first().map_or("", |u| u.id.as_str()).to_string();

    Snapshot {
        version: CURRENT_VERSION,
        users: Arc::new(users),
        events_by_user,
        rewards_by_user,
        ledger: Arc::new(Vec::new()),
        settings: default_settings(&active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_user_gets_a_catalog() {
        let snapshot = default_snapshot();
        assert_eq!(snapshot.version, CURRENT_VERSION);
        assert!(snapshot.ledger.is_empty());
        for user in snapshot.users.iter() {
            assert_eq!(snapshot.events_for(&user.id).len(), 8);
            assert_eq!(snapshot.rewards_for(&user.id).len(), 8);
        }
    }

    #[test]
    fn catalogs_are_not_shared_between_users() {
        let snapshot = default_snapshot();
        assert!(!Arc::ptr_eq(
            &snapshot.events_by_user["mom"],
            &snapshot.events_by_user["dad"]
        ));

        let edited = snapshot.with_events("mom", Vec::new());
        assert!(edited.events_for("mom").is_empty());
        assert_eq!(edited.events_for("dad"), seed_events().as_slice());
    }

    #[test]
    fn default_settings_have_no_pin() {
        let snapshot = default_snapshot();
        assert_eq!(snapshot.settings.active_user_id, "mom");
        assert!(snapshot.settings.parent_pin_hash.is_empty());
        assert!(!snapshot.settings.sound_enabled);
        assert_eq!(snapshot.settings.sync_endpoint_url, DEFAULT_SYNC_URL);
    }

    #[test]
    fn event_ids_are_unique_within_catalog() {
        let events = seed_events();
        let mut ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), events.len());
    }
}

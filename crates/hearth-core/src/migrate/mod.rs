//! Document validation and schema migration.
//!
//! Any JSON value can be migrated. Migration never fails: the whole document
//! is discarded only when it is not an object or predates
//! [`MIN_SUPPORTED_VERSION`]; otherwise each malformed substructure falls
//! back to its default on its own.
//!
//! # Policy
//!
//! 1. Unsupported or missing version: fresh defaults.
//! 2. Roster: input users (or defaults), renamed, name-fixed, deduplicated,
//!    then topped up with any missing default users.
//! 3. Settings: defaults overlaid with input fields; active user repaired.
//! 4. Catalogs rebuilt per user, with legacy and template fallbacks.
//! 5. Ledger rows that cannot be read are dropped.
//! 6. Version stamped to [`CURRENT_VERSION`].

pub mod decode;
pub mod rules;

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::defaults;
use crate::model::{
    CURRENT_VERSION, CatalogItem, LedgerEntry, MIN_SUPPORTED_VERSION, Reward, Settings, Snapshot,
    User,
};

pub use rules::MigrationRules;

/// Minimal shape check for documents arriving from storage or import.
///
/// Field types inside collections are not inspected; migration handles those.
#[must_use]
pub fn validate(raw: &Value) -> bool {
    let Some(doc) = raw.as_object() else {
        return false;
    };
    let has_users = doc.get("users").is_some_and(Value::is_array);
    let has_events = doc.get("events_by_user").is_some_and(Value::is_object);
    let has_rewards = doc.get("rewards_by_user").is_some_and(Value::is_object)
        || doc.get("rewards").is_some_and(Value::is_array);
    let has_ledger = doc.get("ledger").is_some_and(Value::is_array);
    let has_settings = doc.get("settings").is_some_and(Value::is_object);

    has_users && has_events && has_rewards && has_ledger && has_settings
}

/// Migrate with the built-in [`MigrationRules`].
#[must_use]
pub fn migrate(raw: &Value) -> Snapshot {
    migrate_with(raw, &MigrationRules::default())
}

/// Upgrade an arbitrary document to the current schema.
#[must_use]
pub fn migrate_with(raw: &Value, rules: &MigrationRules) -> Snapshot {
    let Some(doc) = raw.as_object() else {
        debug!("migration input is not an object; using defaults");
        return defaults::default_snapshot();
    };
    if !is_supported_version(doc.get("version")) {
        debug!(version = ?doc.get("version"), "unsupported document version; using defaults");
        return defaults::default_snapshot();
    }

    let users = build_roster(doc.get("users"), rules);
    let settings = merge_settings(doc.get("settings"), &users, rules);

    let raw_events = doc.get("events_by_user").and_then(Value::as_object);
    let raw_rewards = doc.get("rewards_by_user").and_then(Value::as_object);
    let legacy_rewards: Vec<Reward> = doc
        .get("rewards")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(decode::reward).collect())
        .unwrap_or_default();

    let mut events_by_user = BTreeMap::new();
    let mut rewards_by_user = BTreeMap::new();
    for user in &users {
        let events = catalog_rows(raw_events, &user.id, rules, decode::event)
            .unwrap_or_else(defaults::seed_events);
        let rewards = catalog_rows(raw_rewards, &user.id, rules, decode::reward)
            .or_else(|| (!legacy_rewards.is_empty()).then(|| legacy_rewards.clone()))
            .unwrap_or_else(defaults::seed_rewards);
        events_by_user.insert(user.id.clone(), Arc::new(events));
        rewards_by_user.insert(user.id.clone(), Arc::new(rewards));
    }
    apply_templates(&mut events_by_user, raw_events, rules);
    apply_templates(&mut rewards_by_user, raw_rewards, rules);

    let ledger = filter_ledger(doc.get("ledger"), rules);

    Snapshot {
        version: CURRENT_VERSION,
        users: Arc::new(users),
        events_by_user,
        rewards_by_user,
        ledger: Arc::new(ledger),
        settings,
    }
}

fn is_supported_version(version: Option<&Value>) -> bool {
    decode::finite(version).is_some_and(|v| v >= f64::from(MIN_SUPPORTED_VERSION))
}

fn build_roster(raw_users: Option<&Value>, rules: &MigrationRules) -> Vec<User> {
    let defaults = defaults::seed_users();
    let source: Vec<Value> = match raw_users.and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => rows.clone(),
        _ => defaults
            .iter()
            .filter_map(|u| serde_json::to_value(u).ok())
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut users = Vec::with_capacity(source.len());
    for row in &source {
        let Some(row) = row.as_object() else {
            continue;
        };
        let Some(original_id) = decode::id_string(row.get("id")).filter(|id| !id.is_empty())
        else {
            continue;
        };
        let id = rules.resolve_id(&original_id).to_string();
        if !seen.insert(id.clone()) {
            continue;
        }

        let default_name = defaults
            .iter()
            .find(|u| u.id == id)
            .map_or_else(|| id.clone(), |u| u.name.clone());
        let raw_name = decode::text(row.get("name"));
        let name = if raw_name.is_empty() {
            default_name
        } else {
            rules
                .corrected_name(&id, &raw_name)
                .map_or(raw_name, str::to_string)
        };
        users.push(User { id, name });
    }

    for user in defaults {
        if seen.insert(user.id.clone()) {
            users.push(user);
        }
    }
    users
}

fn merge_settings(raw: Option<&Value>, users: &[User], rules: &MigrationRules) -> Settings {
    let first = users.first().map_or("", |u| u.id.as_str());
    let mut settings = defaults::default_settings(first);
    let empty = Map::new();
    let input = raw.and_then(Value::as_object).unwrap_or(&empty);

    if let Some(active) = decode::id_string(input.get("active_user_id")) {
        settings.active_user_id = rules.resolve_id(&active).to_string();
    }
    if let Some(Value::String(hash)) = input.get("parent_pin_hash") {
        settings.parent_pin_hash.clone_from(hash);
    }
    if let Some(Value::Bool(sound)) = input.get("sound_enabled") {
        settings.sound_enabled = *sound;
    }
    let url = decode::text(
        input
            .get("github_sync_url")
            .or_else(|| input.get("sync_endpoint_url")),
    );
    settings.sync_endpoint_url = if url.is_empty() {
        rules.sync_url.clone()
    } else {
        url
    };

    if !users.iter().any(|u| u.id == settings.active_user_id) {
        settings.active_user_id = first.to_string();
    }
    settings
}

/// Rows stored for `user_id` (or one of its legacy ids), decoded and
/// deduplicated by id. `None` when the input has no array for the user.
fn catalog_rows<T: CatalogItem>(
    raw: Option<&Map<String, Value>>,
    user_id: &str,
    rules: &MigrationRules,
    decode_row: fn(&Value) -> Option<T>,
) -> Option<Vec<T>> {
    let map = raw?;
    let rows = std::iter::once(user_id)
        .chain(rules.legacy_ids_of(user_id))
        .find_map(|key| map.get(key).and_then(Value::as_array))?;

    let mut seen = HashSet::new();
    Some(
        rows.iter()
            .filter_map(decode_row)
            .filter(|row| seen.insert(row.id().to_string()))
            .collect(),
    )
}

fn apply_templates<T: Clone>(
    catalogs: &mut BTreeMap<String, Arc<Vec<T>>>,
    raw: Option<&Map<String, Value>>,
    rules: &MigrationRules,
) {
    for template in &rules.templates {
        let had_explicit = raw
            .and_then(|map| map.get(&template.target))
            .is_some_and(Value::is_array);
        if had_explicit || !catalogs.contains_key(&template.target) {
            continue;
        }
        if let Some(source) = catalogs.get(&template.source) {
            let copy = Arc::new(source.as_ref().clone());
            debug!(user = %template.target, from = %template.source, "copying template catalog");
            catalogs.insert(template.target.clone(), copy);
        }
    }
}

fn filter_ledger(raw: Option<&Value>, rules: &MigrationRules) -> Vec<LedgerEntry> {
    let Some(rows) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    let kept: Vec<LedgerEntry> = rows
        .iter()
        .enumerate()
        .filter_map(|(position, row)| decode::ledger_entry(row, position, rules))
        .collect();
    let dropped = rows.len() - kept.len();
    if dropped > 0 {
        warn!(dropped, kept = kept.len(), "dropped unreadable ledger rows");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_SYNC_URL;
    use serde_json::json;

    fn modern_doc() -> Value {
        serde_json::to_value(defaults::default_snapshot()).expect("serialize defaults")
    }

    #[test]
    fn validate_accepts_modern_and_legacy_rewards() {
        assert!(validate(&modern_doc()));

        let mut legacy = modern_doc();
        let obj = legacy.as_object_mut().expect("object");
        obj.remove("rewards_by_user");
        obj.insert("rewards".into(), json!([]));
        assert!(validate(&legacy));
    }

    #[test]
    fn validate_rejects_missing_pieces() {
        assert!(!validate(&json!([])));
        assert!(!validate(&json!({"users": []})));

        let mut doc = modern_doc();
        doc.as_object_mut().expect("object").remove("settings");
        assert!(!validate(&doc));
    }

    #[test]
    fn non_object_and_old_versions_reset_to_defaults() {
        let fresh = defaults::default_snapshot();
        assert_eq!(migrate(&json!("hello")), fresh);
        assert_eq!(migrate(&json!({"users": [{"id": "x", "name": "X"}]})), fresh);
        assert_eq!(migrate(&json!({"version": 1, "users": []})), fresh);
    }

    #[test]
    fn guest_is_renamed_everywhere() {
        let doc = json!({
            "version": 2,
            "users": [{"id": "guest", "name": "Guest"}, {"id": "will", "name": "will"}],
            "events_by_user": {"guest": [{"id": "nap", "title": "Nap", "category": "Rest", "points": 1, "enabled": true}]},
            "rewards_by_user": {},
            "ledger": [{"id": "a", "ts": 1, "user_id": "guest", "type": "earn", "points": 1, "ref_kind": "event", "ref_id": "nap"}],
            "settings": {"active_user_id": "guest"}
        });
        let snapshot = migrate(&doc);

        assert_eq!(snapshot.users[0], User::new("grandpa", "Grandpa"));
        assert_eq!(snapshot.users[1], User::new("will", "Willow"));
        assert_eq!(snapshot.events_for("grandpa")[0].id, "nap");
        assert_eq!(snapshot.ledger[0].user_id, "grandpa");
        assert_eq!(snapshot.settings.active_user_id, "grandpa");
        assert!(snapshot.user("guest").is_none());
    }

    #[test]
    fn roster_is_deduplicated_and_topped_up() {
        let doc = json!({
            "version": 2,
            "users": [{"id": "dad", "name": "Papa"}, {"id": "dad", "name": "Other"}, "junk", {"name": "no id"}],
            "events_by_user": {}, "rewards_by_user": {}, "ledger": [], "settings": {}
        });
        let snapshot = migrate(&doc);
        let ids: Vec<_> = snapshot.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["dad", "mom", "will", "grandpa", "grandma", "niece"]);
        assert_eq!(snapshot.users[0].name, "Papa");
        assert_eq!(snapshot.settings.active_user_id, "dad");
    }

    #[test]
    fn legacy_flat_rewards_seed_every_user() {
        let doc = json!({
            "version": 2,
            "users": [{"id": "mom", "name": "Mom"}],
            "events_by_user": {},
            "rewards": [{"id": "ice_cream", "title": "Ice cream", "category": "Treat", "cost": 5, "unlock_at_total": 0, "enabled": true}],
            "ledger": [], "settings": {}
        });
        let snapshot = migrate(&doc);
        for user in snapshot.users.iter() {
            assert_eq!(snapshot.rewards_for(&user.id).len(), 1, "user {}", user.id);
            assert_eq!(snapshot.rewards_for(&user.id)[0].id, "ice_cream");
        }
    }

    #[test]
    fn new_members_copy_the_template_catalog() {
        let custom = json!([{"id": "piano", "title": "Piano", "category": "Music", "points": 4, "enabled": true}]);
        let doc = json!({
            "version": 2,
            "users": [{"id": "will", "name": "Willow"}],
            "events_by_user": {"will": custom, "niece": []},
            "rewards_by_user": {},
            "ledger": [], "settings": {}
        });
        let snapshot = migrate(&doc);
        assert_eq!(snapshot.events_for("grandma")[0].id, "piano");
        assert!(snapshot.events_for("niece").is_empty(), "explicit catalog is kept");
        assert_eq!(snapshot.events_for("mom"), defaults::seed_events().as_slice());
        assert!(!Arc::ptr_eq(
            &snapshot.events_by_user["grandma"],
            &snapshot.events_by_user["will"]
        ));
    }

    #[test]
    fn unreadable_ledger_rows_are_dropped() {
        let mut doc = modern_doc();
        doc["ledger"] = json!([
            null,
            {"id": "ok", "ts": 10, "user_id": "mom", "type": "earn", "points": 3},
            {"id": "bad", "ts": "yesterday", "user_id": "mom", "type": "earn", "points": 3}
        ]);
        let snapshot = migrate(&doc);
        assert_eq!(snapshot.ledger.len(), 1);
        assert_eq!(snapshot.ledger[0].id, "ok");
    }

    #[test]
    fn blank_sync_url_and_unknown_active_user_are_repaired() {
        let mut doc = modern_doc();
        doc["settings"] = json!({"active_user_id": "ghost", "github_sync_url": "  ", "sound_enabled": true});
        let snapshot = migrate(&doc);
        assert_eq!(snapshot.settings.active_user_id, "mom");
        assert_eq!(snapshot.settings.sync_endpoint_url, DEFAULT_SYNC_URL);
        assert!(snapshot.settings.sound_enabled);
    }

    #[test]
    fn migrating_current_document_is_stable() {
        let once = migrate(&modern_doc());
        let twice = migrate(&serde_json::to_value(&once).expect("serialize"));
        assert_eq!(once, twice);
    }

    #[test]
    fn custom_rules_replace_builtin_tables() {
        let doc = json!({
            "version": 2,
            "users": [{"id": "guest", "name": "guest"}],
            "events_by_user": {}, "rewards_by_user": {}, "ledger": [], "settings": {}
        });
        let snapshot = migrate_with(&doc, &MigrationRules::empty());
        assert_eq!(snapshot.users[0], User::new("guest", "guest"));
    }

    #[test]
    fn blank_sync_url_uses_configured_default() {
        let mut doc = modern_doc();
        doc["settings"] = json!({"github_sync_url": ""});
        let rules = MigrationRules::default().with_sync_url("https://relay.example/sync");
        let snapshot = migrate_with(&doc, &rules);
        assert_eq!(snapshot.settings.sync_endpoint_url, "https://relay.example/sync");

        doc["settings"] = json!({"github_sync_url": "http://kept.example"});
        let snapshot = migrate_with(&doc, &rules);
        assert_eq!(snapshot.settings.sync_endpoint_url, "http://kept.example");
    }
}

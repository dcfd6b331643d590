//! Scenario tests for hearth-core: the household behaviors a parent and a
//! child actually run into, end to end through ops, views and migration.

use hearth_core::Snapshot;
use hearth_core::clock::{FixedClock, MS_PER_DAY};
use hearth_core::migrate::{self, MigrationRules};
use hearth_core::model::{EntryKind, Reference};
use hearth_core::ops::{
    self, CommandError, EarnRequest, EventDraft, RewardDraft, UpsertMode, parse_import,
};
use hearth_core::store::{MemoryStore, SnapshotStore};
use hearth_core::views::{self, LedgerFilter, Window};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn adjust(snapshot: &Snapshot, clock: &FixedClock, user: &str, amount: i64) -> Snapshot {
    ops::quick_adjust(snapshot, clock, user, amount, "")
        .expect("adjust")
        .state
}

fn reward_draft(title: &str, cost: i64, unlock_at_total: i64) -> RewardDraft {
    RewardDraft {
        id: None,
        title: title.to_string(),
        category: "Treats".to_string(),
        cost,
        unlock_at_total,
        enabled: true,
    }
}

// ---------------------------------------------------------------------------
// Ledger rules
// ---------------------------------------------------------------------------

#[test]
fn operations_never_touch_their_input() {
    let clock = FixedClock::at(1_000);
    let original = Snapshot::default();
    let before = original.clone();

    let _ = ops::earn_event(&original, &clock, "will", "tidy_room", "").expect("earn");
    let _ = ops::quick_adjust(&original, &clock, "will", -2, "").expect("adjust");
    let _ = ops::set_active_user(&original, "dad").expect("switch");
    let _ = ops::set_parent_pin(&original, "1234").expect("pin");
    let _ = ops::delete_event(&original, "will", "tidy_room").expect("delete");
    assert!(ops::redeem(&original, &clock, "will", "friend_call", "").is_err());

    assert_eq!(original, before);
}

#[test]
fn balance_is_earned_minus_spent() {
    let clock = FixedClock::at(1_000);
    let mut snapshot = adjust(&Snapshot::default(), &clock, "will", 30);
    snapshot = ops::earn_event(&snapshot, &clock, "will", "read_15", "")
        .expect("earn")
        .state;
    snapshot = ops::redeem(&snapshot, &clock, "will", "movie_choice", "")
        .expect("redeem")
        .state;
    snapshot = adjust(&snapshot, &clock, "will", -3);

    let totals = views::totals(&snapshot, "will");
    assert_eq!(totals.earned_total, 32);
    assert_eq!(totals.spent_total, 11);
    assert_eq!(totals.balance, totals.earned_total - totals.spent_total);
    assert_eq!(views::totals(&snapshot, "mom").balance, 0);
}

#[test]
fn locked_reward_is_rejected_whatever_the_balance() {
    let clock = FixedClock::at(1_000);
    let snapshot = ops::upsert_reward(
        &Snapshot::default(),
        &clock,
        "will",
        &reward_draft("Ice cream", 3, 10),
    )
    .expect("upsert")
    .state;
    let snapshot = adjust(&snapshot, &clock, "will", 5);

    let err = ops::redeem(&snapshot, &clock, "will", "ice_cream", "").expect_err("locked");
    assert_eq!(
        err,
        CommandError::RewardLocked {
            earned_total: 5,
            unlock_at_total: 10,
        }
    );
    assert_eq!(snapshot.ledger.len(), 1);
}

#[test]
fn quick_adjust_writes_magnitudes() {
    let clock = FixedClock::at(1_000);
    let plus = ops::quick_adjust(&Snapshot::default(), &clock, "will", 5, "").expect("plus");
    let minus = ops::quick_adjust(&plus.state, &clock, "will", -3, "").expect("minus");

    assert_eq!(plus.value.kind, EntryKind::Earn);
    assert_eq!(plus.value.points, 5);
    assert_eq!(minus.value.kind, EntryKind::Spend);
    assert_eq!(minus.value.points, 3);
    assert_eq!(minus.value.reference, Reference::None);
    assert_eq!(views::totals(&minus.state, "will").balance, 2);
}

#[test]
fn ad_hoc_earn_floors_fractions() {
    let clock = FixedClock::at(1_000);
    let request = EarnRequest {
        user_id: "will".to_string(),
        event_id: None,
        points: 3.9,
        note: "Helped grandma".to_string(),
    };
    let outcome = ops::earn(&Snapshot::default(), &clock, &request).expect("earn");
    assert_eq!(outcome.value.points, 3);
    assert_eq!(outcome.value.note, "Helped grandma");
}

// ---------------------------------------------------------------------------
// Catalog management
// ---------------------------------------------------------------------------

#[test]
fn blank_titles_are_rejected_and_updates_keep_position() {
    let clock = FixedClock::at(1_000);
    let snapshot = Snapshot::default();
    let blank = EventDraft {
        id: None,
        title: "   ".to_string(),
        category: String::new(),
        description: String::new(),
        points: 2,
        enabled: true,
    };
    assert_eq!(
        ops::upsert_event(&snapshot, &clock, "will", &blank),
        Err(CommandError::TitleRequired("Event"))
    );

    let position = |s: &Snapshot| {
        s.events_for("will")
            .iter()
            .position(|e| e.id == "set_table")
            .expect("set_table")
    };
    let edit = EventDraft {
        id: Some("set_table".to_string()),
        title: "Set and clear the table".to_string(),
        points: 5,
        ..blank
    };
    let updated = ops::upsert_event(&snapshot, &clock, "will", &edit).expect("update");
    assert_eq!(updated.value.mode, UpsertMode::Updated);
    assert_eq!(position(&updated.state), position(&snapshot));
    assert_eq!(
        updated.state.events_for("will").len(),
        snapshot.events_for("will").len()
    );
    // Other users keep the seed row.
    assert_eq!(snapshot.events_for("mom"), updated.state.events_for("mom"));
}

#[test]
fn unlock_progress_at_an_exact_threshold() {
    let clock = FixedClock::at(1_000);
    let snapshot = adjust(&Snapshot::default(), &clock, "will", 20);
    let progress = views::unlock_progress(&snapshot, "will");
    assert_eq!(progress.next_threshold, Some(50));
    assert!(progress.percent.abs() < f64::EPSILON);

    let snapshot = adjust(&snapshot, &clock, "will", 30);
    let progress = views::unlock_progress(&snapshot, "will");
    assert_eq!(progress.next_threshold, None);
    assert!((progress.percent - 100.0).abs() < f64::EPSILON);
}

#[test]
fn history_window_and_kind_filter() {
    let clock = FixedClock::at(40 * MS_PER_DAY);
    let snapshot = adjust(&Snapshot::default(), &clock, "will", 10);
    clock.advance(10 * MS_PER_DAY);
    let snapshot = ops::redeem(&snapshot, &clock, "will", "dessert_pick", "")
        .expect("redeem")
        .state;
    let now = 50 * MS_PER_DAY;

    let recent = views::filter_ledger(&snapshot, "will", &LedgerFilter::default(), now);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].kind, EntryKind::Spend);

    let month = LedgerFilter {
        window: Window::Last30Days,
        ..LedgerFilter::default()
    };
    let rows = views::filter_ledger(&snapshot, "will", &month, now);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].timestamp_ms > rows[1].timestamp_ms);
}

// ---------------------------------------------------------------------------
// Parent PIN
// ---------------------------------------------------------------------------

#[test]
fn pin_format_and_verification() {
    let snapshot = Snapshot::default();
    assert!(ops::set_parent_pin(&snapshot, "12a4").is_err());
    assert!(ops::set_parent_pin(&snapshot, "123").is_err());

    let locked = ops::set_parent_pin(&snapshot, "0000").expect("set");
    assert!(ops::has_pin(&locked));
    assert!(ops::verify_pin(&locked, "0000"));
    assert!(!ops::verify_pin(&locked, "0001"));

    let cleared = ops::set_parent_pin(&locked, "").expect("clear");
    assert!(!ops::has_pin(&cleared));
    assert!(ops::verify_pin(&cleared, "anything"));
}

// ---------------------------------------------------------------------------
// Persistence and migration
// ---------------------------------------------------------------------------

#[test]
fn old_or_missing_versions_load_defaults() {
    let mut doc = serde_json::to_value(Snapshot::default()).expect("to_value");
    doc["ledger"] = json!([{
        "id": "a", "ts": 1, "user_id": "will", "type": "earn",
        "ref_kind": "none", "ref_id": "", "points": 4, "note": ""
    }]);

    let mut v1 = doc.clone();
    v1["version"] = json!(1);
    assert_eq!(migrate::migrate(&v1), Snapshot::default());

    let mut unversioned = doc.clone();
    if let Some(map) = unversioned.as_object_mut() {
        map.remove("version");
    }
    assert_eq!(migrate::migrate(&unversioned), Snapshot::default());

    assert_eq!(migrate::migrate(&doc).ledger.len(), 1);
}

#[test]
fn migration_is_idempotent_on_current_documents() {
    let clock = FixedClock::at(1_000);
    let snapshot = adjust(&Snapshot::default(), &clock, "will", 7);
    let once = migrate::migrate(&serde_json::to_value(&snapshot).expect("to_value"));
    let twice = migrate::migrate(&serde_json::to_value(&once).expect("to_value"));
    assert_eq!(once, twice);
    assert_eq!(once, snapshot);
}

#[test]
fn failed_import_leaves_the_store_alone() {
    let clock = FixedClock::at(1_000);
    let store = MemoryStore::new();
    let snapshot = adjust(&Snapshot::default(), &clock, "will", 3);
    store.save(&snapshot).expect("save");

    assert!(parse_import("{not json").is_err());
    assert_eq!(store.load(), snapshot);

    let exported = ops::export(&snapshot).expect("export");
    let imported = parse_import(&exported).expect("import");
    assert_eq!(imported, snapshot);
}

#[test]
fn rename_rules_apply_to_stored_ids() {
    let mut doc = serde_json::to_value(Snapshot::default()).expect("to_value");
    doc["users"] = json!([{ "id": "kid", "name": "Kid" }]);
    doc["settings"]["active_user_id"] = json!("kid");
    doc["events_by_user"] = json!({});
    doc["rewards_by_user"] = json!({});
    doc["ledger"] = json!([]);

    let rules: MigrationRules = toml::from_str(
        r#"
        [[renames]]
        from = "kid"
        to = "will"
        "#,
    )
    .expect("rules");
    let snapshot = migrate::migrate_with(&doc, &rules);
    assert!(snapshot.has_user("will"));
    assert!(!snapshot.has_user("kid"));
    assert_eq!(snapshot.settings.active_user_id, "will");
}

#[test]
fn empty_rules_keep_legacy_ids() {
    let mut doc = serde_json::to_value(Snapshot::default()).expect("to_value");
    doc["users"] = json!([{ "id": "guest", "name": "guest" }]);

    let kept = migrate::migrate_with(&doc, &MigrationRules::empty());
    assert!(kept.has_user("guest"));
    assert_eq!(kept.user("guest").map(|u| u.name.as_str()), Some("guest"));

    let renamed = migrate::migrate(&doc);
    assert!(!renamed.has_user("guest"));
    assert_eq!(renamed.user("grandpa").map(|u| u.name.as_str()), Some("Grandpa"));
}

//! The root aggregate persisted as one unit.
//!
//! Per-user catalogs and the ledger sit behind [`Arc`] so that producing a
//! new snapshot only copies the collection an operation touches. Every other
//! collection is shared with the previous snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::{Event, Reward};
use super::ledger::LedgerEntry;

/// Schema version stamped on every migrated snapshot.
pub const CURRENT_VERSION: u32 = 2;

/// Documents older than this are discarded by migration.
pub const MIN_SUPPORTED_VERSION: u32 = 2;

/// A household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub active_user_id: String,
    /// Empty when no parent PIN is set.
    pub parent_pin_hash: String,
    pub sound_enabled: bool,
    #[serde(rename = "github_sync_url", alias = "sync_endpoint_url")]
    pub sync_endpoint_url: String,
}

pub type Catalog<T> = BTreeMap<String, Arc<Vec<T>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub users: Arc<Vec<User>>,
    pub events_by_user: Catalog<Event>,
    pub rewards_by_user: Catalog<Reward>,
    pub ledger: Arc<Vec<LedgerEntry>>,
    pub settings: Settings,
}

impl Snapshot {
    #[must_use]
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    #[must_use]
    pub fn has_user(&self, user_id: &str) -> bool {
        self.user(user_id).is_some()
    }

    /// The active user, falling back to the first user when the setting is stale.
    #[must_use]
    pub fn active_user(&self) -> Option<&User> {
        self.user(&self.settings.active_user_id)
            .or_else(|| self.users.first())
    }

    /// The user's events, empty when the user has no catalog.
    #[must_use]
    pub fn events_for(&self, user_id: &str) -> &[Event] {
        self.events_by_user
            .get(user_id)
            .map_or(&[] as &[Event], |rows| rows.as_slice())
    }

    /// The user's rewards, empty when the user has no catalog.
    #[must_use]
    pub fn rewards_for(&self, user_id: &str) -> &[Reward] {
        self.rewards_by_user
            .get(user_id)
            .map_or(&[] as &[Reward], |rows| rows.as_slice())
    }

    /// Ledger rows belonging to one user, in stored order.
    pub fn ledger_for<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a LedgerEntry> {
        self.ledger.iter().filter(move |row| row.user_id == user_id)
    }

    /// New snapshot with `entry` appended; every other collection is shared.
    #[must_use]
    pub fn with_entry(&self, entry: LedgerEntry) -> Self {
        let mut ledger = Vec::with_capacity(self.ledger.len() + 1);
        ledger.extend(self.ledger.iter().cloned());
        ledger.push(entry);
        Self {
            ledger: Arc::new(ledger),
            ..self.clone()
        }
    }

    /// New snapshot with one user's event list replaced.
    #[must_use]
    pub fn with_events(&self, user_id: &str, events: Vec<Event>) -> Self {
        let mut next = self.clone();
        next.events_by_user
            .insert(user_id.to_string(), Arc::new(events));
        next
    }

    /// New snapshot with one user's reward list replaced.
    #[must_use]
    pub fn with_rewards(&self, user_id: &str, rewards: Vec<Reward>) -> Self {
        let mut next = self.clone();
        next.rewards_by_user
            .insert(user_id.to_string(), Arc::new(rewards));
        next
    }

    /// New snapshot with settings replaced.
    #[must_use]
    pub fn with_settings(&self, settings: Settings) -> Self {
        Self {
            settings,
            ..self.clone()
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        crate::defaults::default_snapshot()
    }
}

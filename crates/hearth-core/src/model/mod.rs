//! Persisted data model: the [`Snapshot`] root aggregate and the rows it holds.

pub mod catalog;
pub mod ledger;
pub mod snapshot;

pub use catalog::{CatalogItem, Event, Reward};
pub use ledger::{EntryKind, LedgerEntry, Reference};
pub use snapshot::{CURRENT_VERSION, MIN_SUPPORTED_VERSION, Settings, Snapshot, User};

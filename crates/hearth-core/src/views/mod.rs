//! Read-only projections over a [`Snapshot`](crate::model::Snapshot).
//!
//! Nothing here is cached. Callers recompute after every mutation.

pub mod category;
pub mod history;
pub mod progress;
pub mod ranking;
pub mod totals;

pub use category::{
    all_event_categories, all_reward_categories, group_by_category, list_categories,
};
pub use history::{
    LedgerFilter, UnknownWindow, Window, filter_ledger, resolve_ref_title, sort_newest_first,
};
pub use progress::{UnlockProgress, unlock_progress};
pub use ranking::{DEFAULT_TOP_LIMIT, top_events, top_rewards};
pub use totals::{DaySummary, Totals, today_summary, today_summary_at, totals};

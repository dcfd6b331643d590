//! Mutation operations.
//!
//! Every operation borrows the current [`Snapshot`] and returns a new one
//! inside an [`Outcome`], or a [`CommandError`] describing why nothing
//! changed. The input snapshot is never modified.

pub mod catalog;
pub mod ledger;
pub mod pin;
pub mod settings;
pub mod transfer;

use crate::error::ErrorCode;
use crate::model::Snapshot;

pub use catalog::{
    EventDraft, RewardDraft, UpsertMode, Upserted, delete_event, delete_reward, slugify,
    upsert_event, upsert_reward,
};
pub use ledger::{EarnRequest, earn, earn_event, quick_adjust, redeem, set_active_user};
pub use pin::{PinError, has_pin, hash_pin, set_parent_pin, verify_pin};
pub use settings::{set_sound_enabled, set_sync_url};
pub use transfer::{ImportError, export, parse_import, parse_import_with, reset};

/// A successful operation: the replacement snapshot plus what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub state: Snapshot,
    pub value: T,
}

impl<T> Outcome<T> {
    pub const fn new(state: Snapshot, value: T) -> Self {
        Self { state, value }
    }
}

/// A rejected command. The caller's snapshot is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("User not found.")]
    UserNotFound { user_id: String },

    #[error("Event not found.")]
    EventNotFound { event_id: String },

    #[error("Reward not found.")]
    RewardNotFound { reward_id: String },

    #[error("{0}")]
    InvalidPoints(&'static str),

    #[error("{0} title is required.")]
    TitleRequired(&'static str),

    #[error("Unlock threshold must be 0 or higher.")]
    InvalidThreshold,

    #[error("Reward is still locked.")]
    RewardLocked { earned_total: i64, unlock_at_total: u32 },

    #[error("Not enough balance points.")]
    InsufficientBalance { balance: i64, cost: u32 },

    #[error("Sync URL must start with http:// or https://")]
    InvalidSyncUrl,
}

impl CommandError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UserNotFound { .. } => ErrorCode::UserNotFound,
            Self::EventNotFound { .. } => ErrorCode::EventNotFound,
            Self::RewardNotFound { .. } => ErrorCode::RewardNotFound,
            Self::InvalidPoints(_) => ErrorCode::InvalidPoints,
            Self::TitleRequired(_) => ErrorCode::InvalidTitle,
            Self::InvalidThreshold => ErrorCode::InvalidThreshold,
            Self::RewardLocked { .. } => ErrorCode::RewardLocked,
            Self::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            Self::InvalidSyncUrl => ErrorCode::InvalidSyncUrl,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub(crate) fn require_user(snapshot: &Snapshot, user_id: &str) -> Result<(), CommandError> {
    if snapshot.has_user(user_id) {
        Ok(())
    } else {
        Err(CommandError::UserNotFound {
            user_id: user_id.to_string(),
        })
    }
}

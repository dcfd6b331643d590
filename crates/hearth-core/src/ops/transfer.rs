//! Whole-snapshot export, import and reset.

use serde_json::Value;
use tracing::info;

use crate::defaults;
use crate::error::ErrorCode;
use crate::migrate::{self, MigrationRules};
use crate::model::Snapshot;

/// Import failures. Either one leaves the caller's snapshot in place.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Could not parse file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid file format.")]
    Shape,
}

impl ImportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ImportParseFailed,
            Self::Shape => ErrorCode::ImportShapeInvalid,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Pretty-printed JSON document in the same layout as the state file.
///
/// # Errors
///
/// Fails only if serialization itself fails.
pub fn export(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

/// Parse, validate and migrate an exported document with the built-in rules.
///
/// # Errors
///
/// See [`parse_import_with`].
pub fn parse_import(text: &str) -> Result<Snapshot, ImportError> {
    parse_import_with(text, &MigrationRules::default())
}

/// Like [`parse_import`] with project migration rules.
///
/// # Errors
///
/// Returns [`ImportError::Parse`] for text that is not JSON and
/// [`ImportError::Shape`] when the document lacks the snapshot sections.
pub fn parse_import_with(text: &str, rules: &MigrationRules) -> Result<Snapshot, ImportError> {
    let raw: Value = serde_json::from_str(text)?;
    if !migrate::validate(&raw) {
        return Err(ImportError::Shape);
    }
    let snapshot = migrate::migrate_with(&raw, rules);
    info!(
        users = snapshot.users.len(),
        entries = snapshot.ledger.len(),
        "imported snapshot"
    );
    Ok(snapshot)
}

/// Fresh seed state. The previous snapshot is simply dropped by the caller.
#[must_use]
pub fn reset() -> Snapshot {
    defaults::default_snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ops::quick_adjust;

    #[test]
    fn export_then_import_preserves_state() {
        let clock = FixedClock::at(1_700_000_000_000);
        let snapshot = quick_adjust(&Snapshot::default(), &clock, "will", 7, "chores")
            .expect("adjust")
            .state;
        let text = export(&snapshot).expect("export");
        assert!(text.contains("\"github_sync_url\""));
        assert!(text.contains("\"ref_kind\": \"none\""));
        let back = parse_import(&text).expect("import");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn import_rejects_bad_json() {
        let err = parse_import("{not json").expect_err("parse");
        assert!(matches!(err, ImportError::Parse(_)));
        assert_eq!(err.code(), ErrorCode::ImportParseFailed);
    }

    #[test]
    fn import_rejects_wrong_shape() {
        let err = parse_import(r#"{"users": []}"#).expect_err("shape");
        assert!(matches!(err, ImportError::Shape));
        assert_eq!(err.to_string(), "Invalid file format.");
    }

    #[test]
    fn reset_returns_defaults() {
        assert_eq!(reset(), Snapshot::default());
    }
}

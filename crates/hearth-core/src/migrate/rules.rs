//! Configurable tables that drive roster reconciliation during migration.
//!
//! The defaults reproduce the household's own history (the `guest` seat
//! became `grandpa`, early documents stored lowercase placeholder names, and
//! `grandma`/`niece` joined with a copy of Willow's catalog). A project can
//! replace any table from `[migration]` in `.hearth/config.toml`.

use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_SYNC_URL;

/// A legacy user id remapped to its replacement wherever it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRename {
    pub from: String,
    pub to: String,
}

/// Replace a placeholder display name for one user id.
///
/// Only applies when the stored name equals `legacy_name` ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFix {
    pub user_id: String,
    pub legacy_name: String,
    pub name: String,
}

/// A user introduced by a schema upgrade whose catalogs start as a copy of
/// another user's, unless the input already carried catalogs for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCopy {
    pub target: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationRules {
    pub renames: Vec<IdRename>,
    pub name_fixes: Vec<NameFix>,
    pub templates: Vec<TemplateCopy>,
    /// Replaces a blank sync URL. Set from `[sync] default_url`, not `[migration]`.
    #[serde(skip, default = "default_sync_url")]
    pub sync_url: String,
}

fn default_sync_url() -> String {
    DEFAULT_SYNC_URL.to_string()
}

impl Default for MigrationRules {
    fn default() -> Self {
        Self {
            renames: vec![IdRename {
                from: "guest".into(),
                to: "grandpa".into(),
            }],
            name_fixes: vec![
                NameFix {
                    user_id: "will".into(),
                    legacy_name: "will".into(),
                    name: "Willow".into(),
                },
                NameFix {
                    user_id: "grandpa".into(),
                    legacy_name: "guest".into(),
                    name: "Grandpa".into(),
                },
            ],
            templates: vec![
                TemplateCopy {
                    target: "grandma".into(),
                    source: "will".into(),
                },
                TemplateCopy {
                    target: "niece".into(),
                    source: "will".into(),
                },
            ],
            sync_url: default_sync_url(),
        }
    }
}

impl MigrationRules {
    /// Rules that change nothing: no renames, fixes or templates.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            renames: Vec::new(),
            name_fixes: Vec::new(),
            templates: Vec::new(),
            sync_url: default_sync_url(),
        }
    }

    /// Use `url` for documents whose sync URL is blank. A blank `url` keeps the built-in one.
    #[must_use]
    pub fn with_sync_url(mut self, url: &str) -> Self {
        let url = url.trim();
        if !url.is_empty() {
            self.sync_url = url.to_string();
        }
        self
    }

    /// Map a legacy id to its replacement; other ids pass through.
    #[must_use]
    pub fn resolve_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|rule| rule.from == id)
            .map_or(id, |rule| rule.to.as_str())
    }

    /// Legacy ids that were renamed to `id`.
    pub fn legacy_ids_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> {
        self.renames
            .iter()
            .filter(move |rule| rule.to == id)
            .map(|rule| rule.from.as_str())
    }

    /// Corrected display name for `user_id`, if `name` is a known placeholder.
    #[must_use]
    pub fn corrected_name(&self, user_id: &str, name: &str) -> Option<&str> {
        self.name_fixes
            .iter()
            .find(|fix| fix.user_id == user_id && fix.legacy_name.eq_ignore_ascii_case(name))
            .map(|fix| fix.name.as_str())
    }
}

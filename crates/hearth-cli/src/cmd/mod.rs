//! Command handlers.
//!
//! Each `run_*` opens the household in the project root, applies one core
//! operation and renders the outcome. Failures are rendered to stderr here
//! and surface to `main` as [`Reported`] so they are not printed twice.

pub mod adjust;
pub mod catalog;
pub mod categories;
pub mod earn;
pub mod history;
pub mod init;
pub mod pin;
pub mod redeem;
pub mod settings;
pub mod status;
pub mod transfer;
pub mod users;

use anyhow::Result;
use hearth_core::config::{self, ProjectConfig};
use hearth_core::ops::{self, CommandError};
use hearth_core::store::{JsonFileStore, SnapshotStore};
use hearth_core::{ErrorCode, Snapshot};
use std::fmt;
use std::path::Path;

use crate::output::{CliError, OutputMode, render_error};

/// An error that has already been shown to the user.
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

/// Render a coded error and return it as [`Reported`].
pub fn fail(output: OutputMode, message: impl Into<String>, code: ErrorCode) -> anyhow::Error {
    let message = message.into();
    if let Err(err) = render_error(output, &CliError::coded(message.clone(), code)) {
        tracing::warn!(error = %err, "failed to render error");
    }
    anyhow::Error::new(Reported(message))
}

pub fn command_failed(output: OutputMode, err: &CommandError) -> anyhow::Error {
    fail(output, err.to_string(), err.code())
}

/// Store configured for a project, whether or not it exists yet.
pub fn store_for(project_root: &Path, config: &ProjectConfig) -> JsonFileStore {
    JsonFileStore::new(config::state_path(project_root, config))
        .with_lock_timeout(config.store.lock_timeout())
        .with_rules(
            config
                .migration
                .clone()
                .with_sync_url(&config.sync.default_url),
        )
}

pub fn load_config(project_root: &Path, output: OutputMode) -> Result<ProjectConfig> {
    config::load_project_config(project_root)
        .map_err(|err| fail(output, format!("{err:#}"), ErrorCode::ConfigParseError))
}

/// Reject the command when a parent PIN is set and `pin` does not match it.
pub fn require_parent(snapshot: &Snapshot, pin: Option<&str>, output: OutputMode) -> Result<()> {
    if ops::verify_pin(snapshot, pin.unwrap_or_default()) {
        Ok(())
    } else {
        Err(fail(
            output,
            "Parent PIN required for this command.",
            ErrorCode::PinRejected,
        ))
    }
}

/// An initialized household: project config plus its state file.
pub struct Household {
    pub config: ProjectConfig,
    pub store: JsonFileStore,
    output: OutputMode,
}

impl Household {
    pub fn open(project_root: &Path, output: OutputMode) -> Result<Self> {
        let config = load_config(project_root, output)?;
        let store = store_for(project_root, &config);
        if !store.exists() {
            return Err(fail(
                output,
                format!("No household state at {}.", store.path().display()),
                ErrorCode::NotInitialized,
            ));
        }
        Ok(Self {
            config,
            store,
            output,
        })
    }

    pub fn load(&self) -> Snapshot {
        self.store.load()
    }

    /// `requested`, or the active user when none is given.
    pub fn resolve_user(&self, snapshot: &Snapshot, requested: Option<&str>) -> Result<String> {
        let user_id = match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => snapshot
                .active_user()
                .map(|user| user.id.clone())
                .unwrap_or_default(),
        };
        if snapshot.has_user(&user_id) {
            Ok(user_id)
        } else {
            Err(command_failed(
                self.output,
                &CommandError::UserNotFound { user_id },
            ))
        }
    }

    /// Lock the state file, apply `change` to the current snapshot and save
    /// the result. Nothing is written when `change` fails.
    pub fn mutate<T>(&self, change: impl FnOnce(&Snapshot) -> Result<(Snapshot, T)>) -> Result<T> {
        let guard = self
            .store
            .lock_for_write()
            .map_err(|err| fail(self.output, err.to_string(), err.code()))?;
        let current = self.store.load_held(&guard);
        let (next, value) = change(&current)?;
        self.store
            .save(&next)
            .map_err(|err| fail(self.output, err.to_string(), err.code()))?;
        drop(guard);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_requires_state_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Household::open(dir.path(), OutputMode::Json)
            .err()
            .expect("missing state");
        assert!(err.downcast_ref::<Reported>().is_some());
    }

    #[test]
    fn mutate_saves_only_on_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ProjectConfig::default();
        store_for(dir.path(), &config)
            .save(&Snapshot::default())
            .expect("seed");
        let household = Household::open(dir.path(), OutputMode::Json).expect("open");

        let switched = household.mutate(|snapshot| {
            let outcome = ops::set_active_user(snapshot, "dad")
                .map_err(|err| command_failed(OutputMode::Json, &err))?;
            Ok((outcome.state, "dad"))
        });
        assert_eq!(switched.expect("switch"), "dad");
        assert_eq!(household.load().settings.active_user_id, "dad");

        let failed: Result<()> =
            household.mutate(|_| Err(fail(OutputMode::Json, "nope", ErrorCode::InvalidPoints)));
        assert!(failed.is_err());
        assert_eq!(household.load().settings.active_user_id, "dad");
    }

    #[test]
    fn store_repairs_blank_sync_url_from_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ProjectConfig::default();
        config.sync.default_url = "https://relay.example/sync".into();
        let store = store_for(dir.path(), &config);

        let mut settings = Snapshot::default().settings;
        settings.sync_endpoint_url = String::new();
        store
            .save(&Snapshot::default().with_settings(settings))
            .expect("save");
        assert_eq!(store.load().settings.sync_endpoint_url, "https://relay.example/sync");
    }

    #[test]
    fn parent_pin_gate() {
        let locked = ops::set_parent_pin(&Snapshot::default(), "4321").expect("pin");
        assert!(require_parent(&Snapshot::default(), None, OutputMode::Json).is_ok());
        assert!(require_parent(&locked, None, OutputMode::Json).is_err());
        assert!(require_parent(&locked, Some("0000"), OutputMode::Json).is_err());
        assert!(require_parent(&locked, Some("4321"), OutputMode::Json).is_ok());
    }
}

//! Snapshot persistence.
//!
//! [`SnapshotStore::load`] never fails: unreadable, unparsable or invalid
//! state falls back to defaults through migration. Saves replace the whole
//! file atomically (write to a sibling temp file, then rename).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::defaults;
use crate::error::ErrorCode;
use crate::lock::{LockError, StoreReadLock, StoreWriteLock};
use crate::migrate::{self, MigrationRules};
use crate::model::Snapshot;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2_000);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("in-memory store is poisoned by an earlier panic")]
    Poisoned,
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Write { .. } | Self::Serialize(_) | Self::Poisoned => {
                ErrorCode::StoreWriteFailed
            }
            Self::Lock(err) => err.code(),
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Load/save contract between the core and durable storage.
pub trait SnapshotStore {
    /// Current snapshot, or fresh defaults when nothing usable is stored.
    fn load(&self) -> Snapshot;

    /// Persist `snapshot` wholesale.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Decode stored text the same way for every backend.
fn decode_state(text: &str, rules: &MigrationRules) -> Option<Snapshot> {
    let raw: Value = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "stored state is not valid JSON; using defaults");
            return None;
        }
    };
    if !migrate::validate(&raw) {
        warn!("stored state failed shape validation; using defaults");
        return None;
    }
    Some(migrate::migrate_with(&raw, rules))
}

/// JSON file on disk guarded by an advisory lock file next to it.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    rules: MigrationRules,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            rules: MigrationRules::default(),
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: MigrationRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    #[must_use]
    pub const fn rules(&self) -> &MigrationRules {
        &self.rules
    }

    /// Hold the writer lock across a load/modify/save sequence.
    ///
    /// # Errors
    ///
    /// See [`StoreWriteLock::acquire`].
    pub fn lock_for_write(&self) -> Result<StoreWriteLock, LockError> {
        StoreWriteLock::acquire(&self.lock_path, self.lock_timeout)
    }

    /// Load while the caller already holds the writer lock.
    #[must_use]
    pub fn load_held(&self, _held: &StoreWriteLock) -> Snapshot {
        self.decode_text(fs::read_to_string(&self.path))
    }

    fn read_text(&self) -> io::Result<String> {
        match StoreReadLock::acquire(&self.lock_path, self.lock_timeout) {
            Ok(_guard) => fs::read_to_string(&self.path),
            // Saves are atomic renames; a late reader still sees a whole file.
            Err(LockError::Timeout { waited, .. }) => {
                debug!(?waited, "read lock timed out; reading anyway");
                fs::read_to_string(&self.path)
            }
            Err(LockError::Io(err)) => Err(err),
        }
    }

    fn decode_text(&self, text: io::Result<String>) -> Snapshot {
        let text = match text {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file; using defaults");
                return defaults::default_snapshot();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read state; using defaults"
                );
                return defaults::default_snapshot();
            }
        };
        decode_state(&text, &self.rules).unwrap_or_else(defaults::default_snapshot)
    }

    fn write_atomic(&self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Snapshot {
        self.decode_text(self.read_text())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(snapshot)?;
        self.write_atomic(&text).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            entries = snapshot.ledger.len(),
            "saved state"
        );
        Ok(())
    }
}

/// In-process store holding serialized text, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: Mutex<Option<String>>,
    rules: MigrationRules,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw stored text.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
            rules: MigrationRules::default(),
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.text.lock().ok().and_then(|guard| guard.clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Snapshot {
        self.text()
            .and_then(|text| decode_state(&text, &self.rules))
            .unwrap_or_else(defaults::default_snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let text = serde_json::to_string(snapshot)?;
        let mut guard = self.text.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(text);
        Ok(())
    }
}

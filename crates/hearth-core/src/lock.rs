//! Advisory file locks around the state file.
//!
//! Writers hold an exclusive lock for the whole read-modify-write cycle of
//! one command; plain reads take a shared lock. Both wait up to a configured
//! timeout before giving up with [`LockError::Timeout`].

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::StoreWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let attempt = match kind {
                LockKind::Shared => FileExt::try_lock_shared(&file),
                LockKind::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if attempt.is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Held by a command that will rewrite the state file.
#[derive(Debug)]
pub struct StoreWriteLock {
    guard: FileGuard,
}

impl StoreWriteLock {
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] when another process holds a conflicting
    /// lock for longer than `timeout`, or [`LockError::Io`] when the lock file
    /// cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Exclusive)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

/// Held while reading the state file. Any number of readers may share it.
#[derive(Debug)]
pub struct StoreReadLock {
    guard: FileGuard,
}

impl StoreReadLock {
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] when another process holds a conflicting
    /// lock for longer than `timeout`, or [`LockError::Io`] when the lock file
    /// cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Shared)?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.path
    }
}

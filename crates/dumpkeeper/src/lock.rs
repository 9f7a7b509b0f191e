//! Advisory lock on a backup directory.
//!
//! Dropping and reloading a schema is not atomic, so dumps and restores of
//! the same backup directory must not overlap. The lock is an OS-level
//! advisory lock on `.dumpkeeper.lock`; the OS releases it if the process
//! dies.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use dumpkeeper_core::backup::LOCK_FILE_NAME;

use crate::error::{BackupError, Result};

/// Exclusive hold on a backup directory, released on drop.
#[derive(Debug)]
pub struct BackupLock {
    file: File,
    path: PathBuf,
}

impl BackupLock {
    /// Takes the lock without waiting.
    ///
    /// Fails with [`BackupError::Locked`] when another dump or restore holds
    /// it. The directory must exist.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Acquired backup lock");
                Ok(Self { file, path })
            }
            Err(TryLockError::WouldBlock) => Err(BackupError::Locked { path }),
            Err(TryLockError::Error(e)) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BackupLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release backup lock");
        }
    }
}

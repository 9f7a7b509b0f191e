//! Validated runtime configuration.

use std::path::PathBuf;

use dumpkeeper_core::ConnectionInfo;

use crate::error::{BackupError, Result};

/// Backup directory used when none is configured.
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Where the database lives and where its dumps go.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub connection: ConnectionInfo,
    pub backup_dir: PathBuf,
}

impl BackupConfig {
    /// Parses the database URL and validates the backup directory.
    pub fn new(database_url: &str, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let backup_dir = backup_dir.into();
        if backup_dir.as_os_str().is_empty() {
            return Err(BackupError::Config(
                "backup directory must not be empty".to_string(),
            ));
        }

        let connection = ConnectionInfo::parse(database_url.trim())?;

        Ok(Self {
            connection,
            backup_dir,
        })
    }
}

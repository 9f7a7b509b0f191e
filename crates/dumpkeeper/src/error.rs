//! Backup error types.

use std::fmt;
use std::path::PathBuf;

use dumpkeeper_core::CoreError;
use thiserror::Error;

/// Result type alias for backup operations.
pub type Result<T> = std::result::Result<T, BackupError>;

/// Errors that can occur while dumping or restoring a database.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("No dump strategy registered for dialect '{dialect}'")]
    UnknownDialect { dialect: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Restore point not found: {id}")]
    RestorePointNotFound { id: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Backup directory is locked by another dump or restore: {}", path.display())]
    Locked { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of [`BackupError`] for callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the configuration; retrying will not help.
    Configuration,
    /// The request named something that does not exist.
    NotFound,
    /// An external dump or load tool failed.
    ExternalTool,
    /// Another dump or restore holds the backup directory.
    Conflict,
    /// Local filesystem or serialization problem.
    Io,
}

impl BackupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownDialect { .. } | Self::Config(_) | Self::Core(_) => {
                ErrorKind::Configuration
            }
            Self::RestorePointNotFound { .. } => ErrorKind::NotFound,
            Self::ToolFailed { .. } | Self::ToolSpawn { .. } | Self::Sqlite(_) => {
                ErrorKind::ExternalTool
            }
            Self::Locked { .. } => ErrorKind::Conflict,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}

impl ErrorKind {
    /// Process exit code used by the CLI for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Io => 1,
            Self::Configuration => 2,
            Self::NotFound => 3,
            Self::ExternalTool => 4,
            Self::Conflict => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::NotFound => "not-found",
            Self::ExternalTool => "external-tool",
            Self::Conflict => "conflict",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

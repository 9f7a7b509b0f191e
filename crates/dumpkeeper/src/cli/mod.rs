//! CLI command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dumpkeeper_core::backup::{parse_metadata, Metadata};
use serde_json::Value;

use crate::config::DEFAULT_BACKUP_DIR;
use crate::error::Result;

/// Point-in-time dumps and restores of SQLite and PostgreSQL databases.
#[derive(Debug, Parser)]
#[command(name = "dumpkeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database URL, e.g. `sqlite:///app.db` or `postgresql://user@host/db`.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Directory holding dumps, metadata and the last-restore marker.
    #[arg(long, env = "DUMPKEEPER_BACKUP_DIR", default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump the database into the backup directory.
    Dump {
        /// Metadata entry stored with the dump. Repeatable.
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        meta: Vec<(String, String)>,

        /// Metadata as a JSON object. `--meta` entries override its keys.
        #[arg(long, value_name = "JSON")]
        meta_json: Option<String>,
    },
    /// List restore points, oldest first.
    List,
    /// Replace the database contents with a restore point.
    Restore {
        /// Restore point ID as shown by `list`.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Show when the database was last restored.
    LastRestore,
    /// List supported dialects and whether their tools are installed.
    Dialects,
}

/// Parses a `KEY=VALUE` pair. The value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Merges `--meta-json` and `--meta` into one metadata object.
pub fn build_metadata(meta: &[(String, String)], meta_json: Option<&str>) -> Result<Metadata> {
    let mut metadata = match meta_json {
        Some(text) => parse_metadata(text)?,
        None => Metadata::new(),
    };

    for (key, value) in meta {
        metadata.insert(key.clone(), Value::String(value.clone()));
    }

    Ok(metadata)
}

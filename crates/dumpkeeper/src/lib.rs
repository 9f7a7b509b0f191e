//! dumpkeeper - point-in-time dumps and restores of SQL databases.
//!
//! The binary is a thin shell over [`BackupApi`]; everything it does is
//! available to library callers as well.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod strategy;

pub use api::{dump_database, load_database, BackupApi};
pub use config::BackupConfig;
pub use error::{BackupError, ErrorKind, Result};
pub use strategy::{DumpStrategy, StrategyRegistry};

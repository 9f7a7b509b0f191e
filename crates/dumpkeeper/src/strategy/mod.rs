//! Per-dialect dump, load and drop strategies.
//!
//! Each supported database product implements [`DumpStrategy`] once. The
//! [`StrategyRegistry`] maps dialect names to implementations so that the
//! orchestrator never branches on the dialect itself.

mod postgres;
mod process;
mod registry;
mod sqlite;

use std::io::Write;
use std::path::Path;

use dumpkeeper_core::ConnectionInfo;

use crate::error::Result;

pub use postgres::PostgresStrategy;
pub use process::tool_available;
pub use registry::StrategyRegistry;
pub use sqlite::SqliteStrategy;

/// Dump and restore operations for one database dialect.
pub trait DumpStrategy: Send + Sync {
    /// Dialect name this strategy handles, as produced by
    /// [`ConnectionInfo::dialect`].
    fn dialect(&self) -> &'static str;

    /// External programs this strategy shells out to.
    fn tools(&self) -> &'static [&'static str];

    /// Writes a plain SQL dump of the database to `out`.
    fn dump(&self, connection: &ConnectionInfo, out: &mut dyn Write) -> Result<()>;

    /// Replays an uncompressed SQL script into the database.
    fn load(&self, connection: &ConnectionInfo, script: &Path) -> Result<()>;

    /// Drops every user schema object so that a dump can be replayed.
    fn drop_schema(&self, connection: &ConnectionInfo) -> Result<()>;
}

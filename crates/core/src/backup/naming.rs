//! File naming inside a backup directory.
//!
//! Dumps are named `<database>.dump.<YYYYMMDD-HHMM>.gz`, metadata sidecars
//! `<dumpfile>.meta` and markers `<database>.last_restore`. These functions
//! only build and parse names; they never touch the filesystem.

use chrono::NaiveDateTime;
use md5::{Digest, Md5};

/// `strftime` format of the timestamp embedded in dump file names.
pub const DUMP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Infix between the database name and the timestamp.
const DUMP_INFIX: &str = ".dump.";

/// Extension of compressed dumps.
const DUMP_EXTENSION: &str = ".gz";

/// Extension appended to a dump file name for its metadata sidecar.
pub const META_EXTENSION: &str = ".meta";

/// Name of the advisory lock file held during dumps and restores.
pub const LOCK_FILE_NAME: &str = ".dumpkeeper.lock";

/// The parts of a dump file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFileName {
    pub database: String,
    pub timestamp: NaiveDateTime,
}

/// Builds `<database>.dump.<YYYYMMDD-HHMM>.gz`.
pub fn dump_file_name(database: &str, at: NaiveDateTime) -> String {
    format!(
        "{database}{DUMP_INFIX}{}{DUMP_EXTENSION}",
        at.format(DUMP_TIMESTAMP_FORMAT)
    )
}

/// Parses a dump file name, returning `None` for anything else.
pub fn parse_dump_file_name(file_name: &str) -> Option<DumpFileName> {
    let stem = file_name.strip_suffix(DUMP_EXTENSION)?;
    let (database, stamp) = stem.rsplit_once(DUMP_INFIX)?;
    if database.is_empty() {
        return None;
    }

    let timestamp = NaiveDateTime::parse_from_str(stamp, DUMP_TIMESTAMP_FORMAT).ok()?;

    Some(DumpFileName {
        database: database.to_string(),
        timestamp,
    })
}

/// Sidecar file name for a dump file.
pub fn meta_file_name(dump_file_name: &str) -> String {
    format!("{dump_file_name}{META_EXTENSION}")
}

/// Marker file name recording the last restore of a database.
pub fn last_restore_file_name(database: &str) -> String {
    format!("{database}.last_restore")
}

/// Restore point ID: hex MD5 of the dump's base file name.
///
/// IDs depend on the name only, so the same file always has the same ID.
pub fn restore_point_id(file_name: &str) -> String {
    format!("{:x}", Md5::digest(file_name.as_bytes()))
}

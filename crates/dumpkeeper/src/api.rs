//! Backup and restore orchestration.
//!
//! [`BackupApi`] is bound to one database and one backup directory. It picks
//! the dialect's [`DumpStrategy`], keeps the directory's bookkeeping (dump
//! files, metadata sidecars, the last-restore marker) and serialises dumps
//! and restores through [`BackupLock`].

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use dumpkeeper_core::backup::{
    dump_file_name, format_marker, last_restore_file_name, meta_file_name, parse_marker,
    parse_metadata, restore_point_id, Metadata, RestorePoint,
};
use dumpkeeper_core::ConnectionInfo;
use flate2::{bufread::GzDecoder, write::GzEncoder, Compression};
use tempfile::NamedTempFile;

use crate::config::BackupConfig;
use crate::error::{BackupError, Result};
use crate::lock::BackupLock;
use crate::strategy::{DumpStrategy, StrategyRegistry};

/// Suffix of dumps still being written.
const PARTIAL_SUFFIX: &str = ".partial";

/// One-stop shop for dumps and restores of a single database.
pub struct BackupApi {
    connection: ConnectionInfo,
    registry: StrategyRegistry,
    backup_dir: PathBuf,
}

impl BackupApi {
    /// Creates an API using the built-in strategies.
    ///
    /// Nothing touches the filesystem until the first dump.
    pub fn new(connection: ConnectionInfo, backup_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(connection, StrategyRegistry::with_defaults(), backup_dir)
    }

    pub fn with_registry(
        connection: ConnectionInfo,
        registry: StrategyRegistry,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            connection,
            registry,
            backup_dir: backup_dir.into(),
        }
    }

    pub fn from_config(config: BackupConfig) -> Self {
        Self::new(config.connection, config.backup_dir)
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Dumps the database into the backup directory.
    ///
    /// Non-empty `metadata` is stored in a JSON sidecar and returned with the
    /// restore point by [`list_restore_points`](Self::list_restore_points).
    pub fn dump(&self, metadata: Option<&Metadata>) -> Result<RestorePoint> {
        let strategy = self.strategy()?;

        fs::create_dir_all(&self.backup_dir)?;
        let _lock = BackupLock::acquire(&self.backup_dir)?;

        let taken_at = truncate_to_minute(Local::now().naive_local());
        let path = write_dump(strategy, &self.connection, &self.backup_dir, taken_at)?;

        let metadata = metadata.cloned().unwrap_or_default();
        let sidecar = meta_path(&path);
        if metadata.is_empty() {
            remove_if_exists(&sidecar)?;
        } else {
            fs::write(&sidecar, serde_json::to_string(&metadata)?)?;
        }

        let file_name = file_name_of(&path);
        Ok(RestorePoint {
            id: restore_point_id(&file_name),
            database: self.connection.database_name(),
            timestamp: taken_at,
            path,
            metadata,
        })
    }

    /// Scans the backup directory for dumps.
    ///
    /// The order of the returned points is unspecified; see
    /// [`dumpkeeper_core::backup::sort_by_timestamp`].
    pub fn list_restore_points(&self) -> Result<Vec<RestorePoint>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut points = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(mut point) = RestorePoint::from_path(&path, Metadata::new()) else {
                continue;
            };
            point.metadata = read_metadata(&meta_path(&path));
            points.push(point);
        }

        Ok(points)
    }

    /// Finds a restore point by ID.
    pub fn find_restore_point(&self, id: &str) -> Result<RestorePoint> {
        self.list_restore_points()?
            .into_iter()
            .find(|point| point.id == id)
            .ok_or_else(|| BackupError::RestorePointNotFound { id: id.to_string() })
    }

    /// Replaces the database contents with the given restore point and
    /// records the time in the last-restore marker.
    ///
    /// An unknown ID fails before anything in the backup directory changes.
    pub fn restore(&self, id: &str) -> Result<RestorePoint> {
        let strategy = self.strategy()?;
        let point = self.find_restore_point(id)?;

        let _lock = BackupLock::acquire(&self.backup_dir)?;

        tracing::info!(
            id = %point.id,
            path = %point.path.display(),
            connection = %self.connection,
            "Restoring database"
        );
        load_dump(strategy, &self.connection, &point.path)?;

        fs::write(self.last_restore_path(), format_marker(Local::now()))?;

        tracing::info!(id = %point.id, "Restore complete");
        Ok(point)
    }

    /// When the database was last restored, or `None` if it never was.
    pub fn last_restore_time(&self) -> Result<Option<DateTime<Local>>> {
        match fs::read_to_string(self.last_restore_path()) {
            Ok(text) => Ok(Some(parse_marker(&text)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn strategy(&self) -> Result<&dyn DumpStrategy> {
        self.registry.get(self.connection.dialect())
    }

    fn last_restore_path(&self) -> PathBuf {
        self.backup_dir
            .join(last_restore_file_name(&self.connection.database_name()))
    }
}

/// Dumps a database into `backup_dir` without writing metadata.
///
/// Returns the path of the new dump file.
pub fn dump_database(
    connection: &ConnectionInfo,
    registry: &StrategyRegistry,
    backup_dir: &Path,
) -> Result<PathBuf> {
    let strategy = registry.get(connection.dialect())?;

    fs::create_dir_all(backup_dir)?;
    let _lock = BackupLock::acquire(backup_dir)?;

    write_dump(
        strategy,
        connection,
        backup_dir,
        Local::now().naive_local(),
    )
}

/// Drops the database schema and reloads it from `dump_file`.
///
/// Unlike [`BackupApi::restore`] this leaves no last-restore marker.
pub fn load_database(
    connection: &ConnectionInfo,
    registry: &StrategyRegistry,
    dump_file: &Path,
) -> Result<()> {
    let strategy = registry.get(connection.dialect())?;

    let _lock = match dump_file.parent().filter(|dir| dir.is_dir()) {
        Some(dir) => Some(BackupLock::acquire(dir)?),
        None => None,
    };

    load_dump(strategy, connection, dump_file)
}

/// Streams a gzip-compressed dump into the backup directory.
///
/// Output goes to a hidden temporary file first and is renamed into place
/// only once the tool has succeeded, so a failed dump leaves nothing behind.
fn write_dump(
    strategy: &dyn DumpStrategy,
    connection: &ConnectionInfo,
    backup_dir: &Path,
    taken_at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = backup_dir.join(dump_file_name(&connection.database_name(), taken_at));

    tracing::info!(
        connection = %connection,
        path = %path.display(),
        "Dumping database"
    );

    let partial = tempfile::Builder::new()
        .prefix(".")
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(backup_dir)?;

    let mut encoder = GzEncoder::new(BufWriter::new(partial), Compression::default());
    strategy.dump(connection, &mut encoder)?;
    let partial = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    partial.as_file().sync_all()?;

    if path.exists() {
        tracing::warn!(path = %path.display(), "Replacing dump taken in the same minute");
    }
    partial.persist(&path).map_err(|e| e.error)?;

    tracing::info!(path = %path.display(), "Dump complete");
    Ok(path)
}

/// Decompresses a dump, drops the schema and replays the dump.
///
/// Decompression happens first so that a corrupt archive fails before any
/// data is destroyed.
fn load_dump(
    strategy: &dyn DumpStrategy,
    connection: &ConnectionInfo,
    dump_file: &Path,
) -> Result<()> {
    let script = decompress(dump_file)?;

    tracing::warn!(
        connection = %connection,
        "Destroying all existing data in database"
    );
    strategy.drop_schema(connection)?;
    strategy.load(connection, script.path())
}

fn decompress(dump_file: &Path) -> Result<NamedTempFile> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(dump_file)?));
    let mut script = NamedTempFile::new()?;

    io::copy(&mut decoder, &mut script)?;
    script.flush()?;

    Ok(script)
}

fn read_metadata(sidecar: &Path) -> Metadata {
    let text = match fs::read_to_string(sidecar) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Metadata::new(),
        Err(e) => {
            tracing::warn!(path = %sidecar.display(), error = %e, "Unreadable metadata sidecar");
            return Metadata::new();
        }
    };

    parse_metadata(&text).unwrap_or_else(|e| {
        tracing::warn!(path = %sidecar.display(), error = %e, "Ignoring metadata sidecar");
        Metadata::new()
    })
}

fn meta_path(dump_file: &Path) -> PathBuf {
    dump_file.with_file_name(meta_file_name(&file_name_of(dump_file)))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|at| at.with_nanosecond(0))
        .unwrap_or(at)
}

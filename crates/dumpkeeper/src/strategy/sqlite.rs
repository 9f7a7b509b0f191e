//! SQLite strategy: the `sqlite3` shell for dump and load, rusqlite for drops.

use std::io::Write;
use std::path::Path;

use dumpkeeper_core::{ConnectionInfo, SQLITE};
use rusqlite::Connection;

use super::{process, DumpStrategy};
use crate::error::Result;

const SQLITE3: &str = "sqlite3";

/// Lists user schema objects, views and triggers before tables.
///
/// Only the literal `sqlite_` prefix is reserved; `LIKE` would treat `_` as
/// a wildcard and skip user tables such as `sqlitedata`.
const SELECT_SCHEMA_OBJECTS: &str = r#"
SELECT type, name
FROM sqlite_master
WHERE type IN ('view', 'trigger', 'table')
  AND substr(name, 1, 7) <> 'sqlite_'
ORDER BY CASE type WHEN 'view' THEN 0 WHEN 'trigger' THEN 1 ELSE 2 END, name
"#;

/// Dumps through `echo .dump | sqlite3 <file>` and reloads by piping the
/// script back into `sqlite3`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteStrategy;

impl DumpStrategy for SqliteStrategy {
    fn dialect(&self) -> &'static str {
        SQLITE
    }

    fn tools(&self) -> &'static [&'static str] {
        &[SQLITE3]
    }

    fn dump(&self, connection: &ConnectionInfo, out: &mut dyn Write) -> Result<()> {
        let db_file = Path::new(connection.database());

        // sqlite3 silently creates missing databases; dumping one is a mistake.
        if !db_file.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("SQLite database {} does not exist", db_file.display()),
            )
            .into());
        }

        tracing::debug!(database = %db_file.display(), "Running sqlite3 .dump");

        let expr = duct::cmd!(SQLITE3, db_file).stdin_bytes(".dump\n");
        let written = process::stream_stdout(SQLITE3, expr, out)?;

        tracing::debug!(bytes = written, "sqlite3 dump finished");
        Ok(())
    }

    fn load(&self, connection: &ConnectionInfo, script: &Path) -> Result<()> {
        let db_file = Path::new(connection.database());

        tracing::warn!(
            database = %db_file.display(),
            script = %script.display(),
            "Loading SQLite database, existing data will be replaced"
        );

        let expr = duct::cmd!(SQLITE3, "-bail", db_file).stdin_path(script);
        process::run(SQLITE3, expr)
    }

    fn drop_schema(&self, connection: &ConnectionInfo) -> Result<()> {
        let db_file = Path::new(connection.database());
        if !db_file.exists() {
            return Ok(());
        }

        let mut conn = Connection::open(db_file)?;
        conn.pragma_update(None, "foreign_keys", "OFF")?;

        let objects = schema_objects(&conn)?;
        let tx = conn.transaction()?;
        for (kind, name) in &objects {
            tx.execute_batch(&drop_statement(kind, name))?;
        }
        tx.commit()?;

        // Drops `sqlite_sequence`, which `.dump` output recreates and newer
        // sqlite3 shells refuse to create while it exists.
        conn.execute_batch("VACUUM")?;

        tracing::info!(
            database = %db_file.display(),
            dropped = objects.len(),
            "Dropped SQLite schema objects"
        );
        Ok(())
    }
}

fn schema_objects(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(SELECT_SCHEMA_OBJECTS)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let objects = rows.collect::<std::result::Result<Vec<(String, String)>, _>>()?;
    Ok(objects)
}

/// `DROP <KIND> IF EXISTS "<name>"` with the identifier quoted.
fn drop_statement(kind: &str, name: &str) -> String {
    format!(
        "DROP {} IF EXISTS \"{}\"",
        kind.to_ascii_uppercase(),
        name.replace('"', "\"\"")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;

    fn seeded_database(dir: &Path) -> ConnectionInfo {
        let path = dir.join("app.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE parents (id TEXT PRIMARY KEY);
            CREATE TABLE "odd ""name""" (id TEXT PRIMARY KEY, parent TEXT REFERENCES parents(id));
            CREATE INDEX idx_odd_parent ON "odd ""name"""(parent);
            CREATE VIEW parent_ids AS SELECT id FROM parents;
            CREATE TRIGGER parents_ai AFTER INSERT ON parents BEGIN SELECT 1; END;
            CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT, n INTEGER);
            CREATE TABLE sqlitedata (k TEXT PRIMARY KEY, v TEXT);
            INSERT INTO parents (id) VALUES ('p1');
            INSERT INTO counters (n) VALUES (1);
            INSERT INTO sqlitedata (k, v) VALUES ('a', 'b');
            "#,
        )
        .unwrap();
        ConnectionInfo::sqlite(path)
    }

    fn object_count(connection: &ConnectionInfo) -> i64 {
        let conn = Connection::open(connection.database()).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE substr(name, 1, 7) <> 'sqlite_'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn has_object(connection: &ConnectionInfo, name: &str) -> bool {
        let conn = Connection::open(connection.database()).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count > 0
    }

    #[test]
    fn test_drop_statement_quotes_identifiers() {
        assert_eq!(
            drop_statement("table", "odd \"name\""),
            "DROP TABLE IF EXISTS \"odd \"\"name\"\"\""
        );
        assert_eq!(drop_statement("view", "v"), "DROP VIEW IF EXISTS \"v\"");
    }

    #[test]
    fn test_drop_schema_removes_all_user_objects() {
        let dir = tempfile::tempdir().unwrap();
        let connection = seeded_database(dir.path());
        assert!(object_count(&connection) > 0);

        SqliteStrategy.drop_schema(&connection).unwrap();

        assert_eq!(object_count(&connection), 0);
        assert!(!has_object(&connection, "sqlite_sequence"));
    }

    #[test]
    fn test_drop_schema_drops_tables_named_like_internal_ones() {
        let dir = tempfile::tempdir().unwrap();
        let connection = seeded_database(dir.path());
        assert!(has_object(&connection, "sqlitedata"));

        SqliteStrategy.drop_schema(&connection).unwrap();

        assert!(!has_object(&connection, "sqlitedata"));
    }

    #[test]
    fn test_drop_schema_on_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let connection = ConnectionInfo::sqlite(dir.path().join("missing.db"));

        SqliteStrategy.drop_schema(&connection).unwrap();

        assert!(!dir.path().join("missing.db").exists());
    }

    #[test]
    fn test_dump_missing_database_fails_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let connection = ConnectionInfo::sqlite(dir.path().join("missing.db"));
        let mut out = Vec::new();

        let result = SqliteStrategy.dump(&connection, &mut out);

        assert!(matches!(result, Err(BackupError::Io(_))));
        assert!(!dir.path().join("missing.db").exists());
        assert!(out.is_empty());
    }

    #[test]
    fn test_dump_and_load_round_trip() {
        if !process::tool_available(SQLITE3) {
            eprintln!("skipping: sqlite3 not found in PATH");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let connection = seeded_database(dir.path());

        let mut script = Vec::new();
        SqliteStrategy.dump(&connection, &mut script).unwrap();
        let script_path = dir.path().join("dump.sql");
        std::fs::write(&script_path, &script).unwrap();

        SqliteStrategy.drop_schema(&connection).unwrap();
        SqliteStrategy.load(&connection, &script_path).unwrap();

        let conn = Connection::open(connection.database()).unwrap();
        let id: String = conn
            .query_row("SELECT id FROM parent_ids", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, "p1");
        let n: i64 = conn
            .query_row("SELECT n FROM counters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 1);
        let v: String = conn
            .query_row("SELECT v FROM sqlitedata WHERE k = 'a'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, "b");
    }

    #[test]
    fn test_load_bad_script_fails() {
        if !process::tool_available(SQLITE3) {
            eprintln!("skipping: sqlite3 not found in PATH");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let connection = ConnectionInfo::sqlite(dir.path().join("app.db"));
        let script_path = dir.path().join("bad.sql");
        std::fs::write(&script_path, "THIS IS NOT SQL;\n").unwrap();

        let result = SqliteStrategy.load(&connection, &script_path);

        assert!(matches!(result, Err(BackupError::ToolFailed { .. })));
    }
}

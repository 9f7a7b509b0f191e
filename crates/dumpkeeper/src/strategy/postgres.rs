//! PostgreSQL strategy: `pg_dump` for dumps, `psql` for everything else.
//!
//! Connection parameters are passed as discrete flags and the password only
//! through the child's `PGPASSWORD` variable, so it never shows up in a
//! process listing or a log line.

use std::io::Write;
use std::path::Path;

use dumpkeeper_core::{ConnectionInfo, POSTGRESQL};
use duct::Expression;

use super::{process, DumpStrategy};
use crate::error::Result;

const PG_DUMP: &str = "pg_dump";
const PSQL: &str = "psql";
const PASSWORD_VAR: &str = "PGPASSWORD";

/// Disconnects every other session of the current database.
const TERMINATE_BACKENDS: &str = "SELECT pg_terminate_backend(pid) \
FROM pg_stat_activity \
WHERE datname = current_database() AND pid <> pg_backend_pid();";

/// Drops every non-system schema and recreates an empty `public`.
const DROP_SCHEMAS: &str = r#"DO $$
DECLARE
    s record;
BEGIN
    FOR s IN
        SELECT nspname FROM pg_namespace
        WHERE nspname NOT LIKE 'pg\_%' AND nspname <> 'information_schema'
    LOOP
        EXECUTE format('DROP SCHEMA %I CASCADE', s.nspname);
    END LOOP;
END
$$;
CREATE SCHEMA public;"#;

/// Dumps with `pg_dump` as plain SQL and restores with `psql`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresStrategy;

impl PostgresStrategy {
    /// Terminates all other connections to the target database.
    ///
    /// An in-use database cannot have its schema dropped or reloaded
    /// without blocking, so this runs before both.
    pub fn terminate_backends(&self, connection: &ConnectionInfo) -> Result<()> {
        tracing::info!(
            database = connection.database(),
            "Terminating other connections"
        );
        process::run(PSQL, psql_command(connection, &["-c", TERMINATE_BACKENDS]))
    }
}

impl DumpStrategy for PostgresStrategy {
    fn dialect(&self) -> &'static str {
        POSTGRESQL
    }

    fn tools(&self) -> &'static [&'static str] {
        &[PG_DUMP, PSQL]
    }

    fn dump(&self, connection: &ConnectionInfo, out: &mut dyn Write) -> Result<()> {
        let args = pg_dump_args(connection);
        tracing::debug!(connection = %connection, ?args, "Running pg_dump");

        let expr = with_password(duct::cmd(PG_DUMP, &args), connection);
        let written = process::stream_stdout(PG_DUMP, expr, out)?;

        tracing::debug!(bytes = written, "pg_dump finished");
        Ok(())
    }

    fn load(&self, connection: &ConnectionInfo, script: &Path) -> Result<()> {
        self.terminate_backends(connection)?;

        tracing::warn!(
            connection = %connection,
            script = %script.display(),
            "Loading PostgreSQL database, existing data will be replaced"
        );

        let expr = psql_command(connection, &[]).stdin_path(script);
        process::run(PSQL, expr)
    }

    fn drop_schema(&self, connection: &ConnectionInfo) -> Result<()> {
        self.terminate_backends(connection)?;

        tracing::warn!(connection = %connection, "Dropping all PostgreSQL schemas");
        process::run(PSQL, psql_command(connection, &["-c", DROP_SCHEMAS]))
    }
}

/// `-h`, `-p` and `-U` flags for whichever parts the URL provides.
fn connection_args(connection: &ConnectionInfo) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(host) = connection.host() {
        args.push("-h".to_string());
        args.push(host.to_string());
    }
    if let Some(port) = connection.port() {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    if let Some(user) = connection.user() {
        args.push("-U".to_string());
        args.push(user.to_string());
    }

    args
}

fn pg_dump_args(connection: &ConnectionInfo) -> Vec<String> {
    let mut args = vec![
        "--no-owner".to_string(),
        "--no-privileges".to_string(),
        "--no-password".to_string(),
    ];
    args.extend(connection_args(connection));
    args.push("-d".to_string());
    args.push(connection.database().to_string());
    args
}

fn psql_args(connection: &ConnectionInfo, extra: &[&str]) -> Vec<String> {
    let mut args = vec![
        "-X".to_string(),
        "-q".to_string(),
        "--no-password".to_string(),
        "-v".to_string(),
        "ON_ERROR_STOP=1".to_string(),
    ];
    args.extend(connection_args(connection));
    args.push("-d".to_string());
    args.push(connection.database().to_string());
    args.extend(extra.iter().map(|arg| arg.to_string()));
    args
}

fn psql_command(connection: &ConnectionInfo, extra: &[&str]) -> Expression {
    with_password(duct::cmd(PSQL, psql_args(connection, extra)), connection)
}

fn with_password(expr: Expression, connection: &ConnectionInfo) -> Expression {
    match connection.password() {
        Some(password) => expr.env(PASSWORD_VAR, password),
        None => expr,
    }
}

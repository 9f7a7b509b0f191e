//! Running the database command line tools.
//!
//! Every tool runs with stderr captured and unchecked exit codes, so a
//! failure is reported as [`BackupError::ToolFailed`] carrying the tool's own
//! error output instead of a bare status.

use std::io::{self, Write};
use std::process::Output;

use duct::Expression;

use crate::error::{BackupError, Result};

/// Runs `expr` to completion, streaming its stdout into `out`.
///
/// Returns the number of bytes copied.
pub(crate) fn stream_stdout(tool: &str, expr: Expression, out: &mut dyn Write) -> Result<u64> {
    let reader = expr
        .stderr_capture()
        .unchecked()
        .reader()
        .map_err(|source| spawn_error(tool, source))?;

    let copied = io::copy(&mut &reader, out)?;

    match reader.try_wait()? {
        Some(output) => check_status(tool, output)?,
        None => {
            return Err(BackupError::ToolFailed {
                tool: tool.to_string(),
                status: "still running".to_string(),
                stderr: "stdout closed before the process exited".to_string(),
            })
        }
    }

    Ok(copied)
}

/// Runs `expr` to completion, discarding stdout.
pub(crate) fn run(tool: &str, expr: Expression) -> Result<()> {
    let output = expr
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|source| spawn_error(tool, source))?;

    check_status(tool, &output)
}

/// Checks whether `tool` can be started at all.
pub fn tool_available(tool: &str) -> bool {
    duct::cmd!(tool, "--version")
        .stdout_null()
        .stderr_null()
        .unchecked()
        .run()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn check_status(tool: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(BackupError::ToolFailed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

fn spawn_error(tool: &str, source: io::Error) -> BackupError {
    BackupError::ToolSpawn {
        tool: tool.to_string(),
        source,
    }
}

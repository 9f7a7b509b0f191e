//! Integration test infrastructure.
//!
//! Runs the dumpkeeper test suite against a real PostgreSQL server in a
//! Docker or Podman container. SQLite tests need only the `sqlite3` binary
//! and run either way.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL, run the tests, stop PostgreSQL
//! cargo xtask integration
//!
//! # Use an already running server
//! DUMPKEEPER_TEST_POSTGRES_URL=postgresql://me@localhost/scratch \
//!     cargo xtask integration --no-docker
//! ```

pub mod containers;
pub mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use containers::{
    detect_runtime, is_running, start_container, stop_container, test_database_url,
    wait_for_health, ContainerRuntime, POSTGRES_SPEC,
};

use crate::prelude::*;

/// Environment variable the PostgreSQL tests read their server from.
pub const POSTGRES_URL_VAR: &str = "DUMPKEEPER_TEST_POSTGRES_URL";

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run integration tests against a real PostgreSQL server.

This command starts a postgres:16-alpine container, waits until it accepts
connections and runs `cargo test -p dumpkeeper` with the server's URL in
DUMPKEEPER_TEST_POSTGRES_URL. The container is stopped afterward.

The tests also need pg_dump, psql and sqlite3 on the host PATH.")]
pub struct IntegrationCommand {
    /// Skip container management and use DUMPKEEPER_TEST_POSTGRES_URL as is.
    #[arg(long)]
    pub no_docker: bool,

    /// Keep the container running after tests complete.
    #[arg(long)]
    pub keep_containers: bool,

    /// Timeout in seconds for container health checks.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let mut started: Option<ContainerRuntime> = None;
    let database_url = if command.no_docker {
        if !global.is_silent() {
            aprintln!(
                "{} {}",
                p_y("⚠️"),
                "Skipping container management (--no-docker)"
            );
        }
        std::env::var(POSTGRES_URL_VAR).ok()
    } else {
        let runtime = detect_runtime().await?;
        if start_postgres_container(command.health_timeout, &global, runtime).await? {
            started = Some(runtime);
        }
        Some(test_database_url(&POSTGRES_SPEC))
    };

    if database_url.is_none() && !global.is_silent() {
        aprintln!(
            "{} {} is not set, PostgreSQL tests will be skipped",
            p_y("⚠️"),
            POSTGRES_URL_VAR
        );
    }

    let passed = run_tests(database_url.as_deref(), &global).await;

    if let Some(runtime) = started {
        if command.keep_containers {
            if !global.is_silent() {
                aprintln!(
                    "{} {}",
                    p_y("⚠️"),
                    "Container left running (--keep-containers)"
                );
            }
        } else {
            stop_postgres_container(&global, runtime).await?;
        }
    }

    aprintln!();
    if passed? {
        aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!"));
        Ok(())
    } else {
        aprintln!("{} {}", p_r("❌"), p_r("Some integration tests failed"));
        Err(IntegrationError::TestFailed(
            "cargo test -p dumpkeeper failed".to_string(),
        ))
    }
}

/// Runs the dumpkeeper tests, returning whether they passed.
async fn run_tests(database_url: Option<&str>, global: &crate::Global) -> Result<bool> {
    if !global.is_silent() {
        aprintln!("{} {}", p_b("🔧"), p_b("Running dumpkeeper tests..."));
    }

    let mut cmd = tokio::process::Command::new("cargo");
    cmd.args(["test", "-p", "dumpkeeper"]);
    if global.is_verbose() {
        cmd.args(["--", "--nocapture"]);
    }
    if let Some(url) = database_url {
        cmd.env(POSTGRES_URL_VAR, url);
    }

    let status = cmd.status().await?;
    Ok(status.success())
}

/// Starts the PostgreSQL container. Returns false if one was already running.
async fn start_postgres_container(
    timeout_secs: u64,
    global: &crate::Global,
    runtime: ContainerRuntime,
) -> Result<bool> {
    if is_running(runtime, POSTGRES_SPEC.name).await? {
        if !global.is_silent() {
            aprintln!("{} {}", p_y("⚠️"), "PostgreSQL container already running");
        }
        return Ok(false);
    }

    if !global.is_silent() {
        aprintln!("{} {}", p_b("🐳"), "Starting PostgreSQL container...");
    }

    start_container(runtime, &POSTGRES_SPEC).await?;

    if !global.is_silent() {
        aprintln!(
            "{} {}",
            p_b("⏳"),
            format!("Waiting for pg_isready (max {}s)...", timeout_secs)
        );
    }

    if let Err(e) =
        wait_for_health(runtime, &POSTGRES_SPEC, Duration::from_secs(timeout_secs)).await
    {
        stop_container(runtime, POSTGRES_SPEC.name).await?;
        return Err(e);
    }

    if !global.is_silent() {
        aprintln!("{} {}", p_g("✅"), "PostgreSQL is ready");
    }

    Ok(true)
}

async fn stop_postgres_container(global: &crate::Global, runtime: ContainerRuntime) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{} {}", p_b("🐳"), "Stopping PostgreSQL container...");
    }

    stop_container(runtime, POSTGRES_SPEC.name).await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_g("✅"), "PostgreSQL container stopped");
    }

    Ok(())
}

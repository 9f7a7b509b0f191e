//! dumpkeeper CLI entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use dumpkeeper::cli::{build_metadata, Cli, Commands, OutputFormat};
use dumpkeeper::output::{dialect_statuses, format_output, pretty};
use dumpkeeper::{BackupApi, BackupConfig, BackupError, StrategyRegistry};
use dumpkeeper_core::backup::sort_by_timestamp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "dumpkeeper=warn"
    } else {
        "dumpkeeper=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<BackupError>()
                .map(|e| e.kind().exit_code())
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Dump {
            ref meta,
            ref meta_json,
        } => {
            let api = backup_api(&cli)?;
            let metadata = build_metadata(meta, meta_json.as_deref())?;
            let point = api.dump(Some(&metadata))?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&point, cli.format)),
                OutputFormat::Pretty => {
                    println!("Created:\n{}", pretty::format_restore_point(&point))
                }
            }
        }
        Commands::List => {
            let api = backup_api(&cli)?;
            let mut points = api.list_restore_points()?;
            sort_by_timestamp(&mut points);
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&points, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_restore_points(&points)),
            }
        }
        Commands::Restore { ref id, yes } => {
            let api = backup_api(&cli)?;
            let point = api.find_restore_point(id)?;
            if !yes {
                let prompt = format!(
                    "Replace all data in {} with the dump taken {}?",
                    api.connection(),
                    point.timestamp.format("%Y-%m-%d %H:%M")
                );
                let confirmed = Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation, pass --yes to skip it")?;
                if !confirmed {
                    if !cli.quiet {
                        eprintln!("Restore cancelled");
                    }
                    return Ok(());
                }
            }

            let point = api.restore(id)?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&point, cli.format)),
                OutputFormat::Pretty => {
                    if !cli.quiet {
                        println!("Restored:\n{}", pretty::format_restore_point(&point))
                    }
                }
            }
        }
        Commands::LastRestore => {
            let api = backup_api(&cli)?;
            let last = api.last_restore_time()?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&last, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_last_restore(last)),
            }
        }
        Commands::Dialects => {
            let dialects = dialect_statuses(&StrategyRegistry::with_defaults());
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&dialects, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_dialects(&dialects)),
            }
        }
    }

    Ok(())
}

/// Builds the API from the global flags. Only `dialects` runs without one.
fn backup_api(cli: &Cli) -> Result<BackupApi, BackupError> {
    let database_url = cli.database_url.as_deref().ok_or_else(|| {
        BackupError::Config("no database URL, set DATABASE_URL or pass --database-url".to_string())
    })?;
    let config = BackupConfig::new(database_url, cli.backup_dir.clone())?;
    Ok(BackupApi::from_config(config))
}

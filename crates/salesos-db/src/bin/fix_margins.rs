//! # fix-margins
//!
//! Recomputes stored margins and rewrites the ones that drifted.
//!
//! ## Usage
//! ```bash
//! # Reconcile every sale
//! cargo run -p salesos-db --bin fix-margins -- --db ./salesos.db
//!
//! # Report only, for one sale
//! cargo run -p salesos-db --bin fix-margins -- --sale <ID> --dry-run
//!
//! # Looser tolerance
//! SALESOS_MARGIN_TOLERANCE=0.05 cargo run -p salesos-db --bin fix-margins
//! ```
//!
//! Flags override `SALESOS_DB_PATH`, `SALESOS_MARGIN_TOLERANCE` and
//! `SALESOS_DRY_RUN`. Exits non-zero if any sale could not be reconciled.

use salesos_core::validation::parse_tolerance;
use salesos_db::config::{ConfigError, ReconcileConfig};
use salesos_db::{Database, DbConfig};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Run {
        config: ReconcileConfig,
        sale_id: Option<String>,
    },
}

fn parse_args(args: &[String], mut config: ReconcileConfig) -> Result<Command, ConfigError> {
    let mut sale_id = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                config.database_path = next_value(args, i, "--db")?.into();
                i += 1;
            }
            "--tolerance" | "-t" => {
                let raw = next_value(args, i, "--tolerance")?;
                config.tolerance = parse_tolerance(&raw)
                    .map_err(|e| ConfigError::InvalidValue("--tolerance".to_string(), e.to_string()))?;
                i += 1;
            }
            "--sale" | "-s" => {
                sale_id = Some(next_value(args, i, "--sale")?);
                i += 1;
            }
            "--dry-run" | "-n" => config.dry_run = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(ConfigError::UnknownArgument(other.to_string())),
        }
        i += 1;
    }

    Ok(Command::Run { config, sale_id })
}

fn next_value(args: &[String], i: usize, flag: &str) -> Result<String, ConfigError> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn print_help() {
    println!("Sales OS margin reconciliation");
    println!();
    println!("Usage: fix-margins [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>          Database file path (env: SALESOS_DB_PATH, default: salesos.db)");
    println!("  -t, --tolerance <AMOUNT> Smallest difference treated as drift (env: SALESOS_MARGIN_TOLERANCE, default: 0.01)");
    println!("  -s, --sale <ID>          Reconcile a single sale");
    println!("  -n, --dry-run            Report drift without writing (env: SALESOS_DRY_RUN)");
    println!("  -h, --help               Show this help message");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,salesos=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "fix-margins failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the run finished but some sales failed.
async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let (config, sale_id) = match parse_args(&args, ReconcileConfig::from_env()?)? {
        Command::Help => {
            print_help();
            return Ok(true);
        }
        Command::Run { config, sale_id } => (config, sale_id),
    };

    execute(config, sale_id).await
}

/// Reconciles one sale or all of them. `Ok(false)` becomes a non-zero exit.
async fn execute(
    config: ReconcileConfig,
    sale_id: Option<String>,
) -> Result<bool, Box<dyn std::error::Error>> {
    info!(
        db = %config.database_path.display(),
        tolerance = %config.tolerance,
        dry_run = config.dry_run,
        "Starting margin reconciliation"
    );

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let fixer = db.margin_fixer(config);

    let ok = match sale_id {
        Some(id) => {
            let report = fixer.fix_margin(&id).await?;
            println!("{} ({}): {}", report.sale_reference, report.sale_id, report.message());
            true
        }
        None => {
            let summary = fixer.fix_all().await?;

            for report in &summary.changes {
                println!("{} ({}): {}", report.sale_reference, report.sale_id, report.message());
            }
            for failure in &summary.failures {
                println!("{}: FAILED {}", failure.sale_id, failure.error);
            }

            println!();
            println!(
                "Checked {}, drifted {}, updated {}, unchanged {}, skipped {}, failed {}",
                summary.checked,
                summary.drifted,
                summary.updated,
                summary.unchanged,
                summary.skipped,
                summary.failed
            );
            if fixer.config().dry_run && summary.drifted > 0 {
                println!("Dry run: nothing was written.");
            }

            !summary.has_failures()
        }
    };

    db.close().await;
    Ok(ok)
}

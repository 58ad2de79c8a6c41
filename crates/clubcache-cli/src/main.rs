//! Clubcache CLI - load club data through the caching repositories and print it as JSON.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clubcache_core::models::Season;
use clubcache_core::{Config, DataService};

#[derive(Parser, Debug)]
#[command(name = "clubcache", version, about = "Club membership and facility data from the command line", long_about = None)]
struct Cli {
    /// Backend base URL, e.g. <https://club.example.com>
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Season (its starting year); omitted means the backend's default
    #[arg(long, global = true)]
    season: Option<i64>,

    /// Also write logs to a daily-rolling file at this path
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Bypass cached data
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List members
    Members,
    /// Show one member's full record
    Member { id: i64 },
    /// List the facilities a member rents
    Rented { member_id: i64 },
    /// List facility types
    Catalog,
    /// List facilities of a type with their rental status
    Facilities { facility_type_id: i64 },
    /// Show the waiting list for a facility type
    Waitlist { facility_type_id: i64 },
    /// List club seasons
    Seasons,
    /// Print the effective configuration
    Config,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // RUST_LOG controls the level (e.g., RUST_LOG=clubcache_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .context("--log-file must name a file")?;
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let mut config = Config::load().context("Failed to load configuration")?;
    config.apply_overrides(cli.api_url.clone(), None);
    info!(api_url = %config.api_base_url, "clubcache starting");

    run(cli, config).await
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let today = Local::now().date_naive();

    match cli.command {
        Command::Seasons => return print_json(&Season::all(today)),
        Command::Config => return print_json(&config.redacted()),
        _ => {}
    }

    let service = DataService::from_config(&config).context("Failed to create API client")?;
    let season = cli.season;
    let force = cli.refresh;

    match cli.command {
        Command::Members => print_json(&service.members().load(season, force).await?),
        Command::Member { id } => {
            print_json(&service.member_detail().load(id, season, force).await?)
        }
        Command::Rented { member_id } => print_json(
            &service
                .rented_facilities()
                .load(member_id, season, force)
                .await?,
        ),
        Command::Catalog => print_json(&service.facilities_catalog().load(force).await?),
        Command::Facilities { facility_type_id } => print_json(
            &service
                .facilities_by_type()
                .load(facility_type_id, season, force)
                .await?,
        ),
        Command::Waitlist { facility_type_id } => {
            print_json(&service.waitlist().load(facility_type_id, force).await?)
        }
        Command::Seasons | Command::Config => Ok(()),
    }
}

//! CLI entry point for the walk advisor.
//!
//! `advise` prints whether the next southbound train can still be reached on
//! foot; `ingest-positions` appends one snapshot of every train on the
//! network to the local SQLite database.

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use cta_walk_advisor::{
    advisory::ArrivalBoard,
    config::{AppConfig, StoreConfig},
    fetch::{BasicClient, auth::UrlParam},
    output::write_board,
    pipeline,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "cta_walk_advisor")]
#[command(about = "Tells you whether the next train is still catchable on foot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch arrivals for the station and print the walk advisory as JSON
    Advise {
        /// Station (map) id to query, overrides CTA_STATION_ID
        #[arg(short, long)]
        station: Option<String>,

        /// Minutes needed to walk to the platform, overrides WALK_MINUTES
        #[arg(short, long)]
        walk_minutes: Option<u32>,

        /// Print Rust debug output instead of JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Fetch live train positions for all configured routes and store them
    IngestPositions {
        /// SQLite database file, overrides DB_FILE
        #[arg(short, long)]
        db: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/cta_walk_advisor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("cta_walk_advisor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    let client = UrlParam::api_key(
        BasicClient::new(config.feed.timeout)?,
        config.feed.api_key.clone(),
    );

    match cli.command {
        Commands::Advise {
            station,
            walk_minutes,
            pretty,
        } => {
            if let Some(station) = station {
                config.feed.station_id = station;
            }
            if let Some(walk_minutes) = walk_minutes {
                config.advisor.walk_minutes = walk_minutes;
            }

            let now = Local::now().naive_local();
            let board = match pipeline::advise(&client, &config.feed, &config.advisor, now).await {
                Ok(board) => board,
                Err(e) => {
                    error!(error = %e, "Arrival board unavailable");
                    ArrivalBoard::unavailable(now, &e)
                }
            };

            write_board(&mut std::io::stdout().lock(), &board, pretty)?;
            if !board.is_available() {
                bail!("arrival board unavailable");
            }
        }
        Commands::IngestPositions { db } => {
            if let Some(db) = db {
                config.store = StoreConfig::from_path(db);
            }

            info!(routes = %config.feed.route_list.join(","), "Fetching train positions");
            let fetched_at = Local::now().naive_local();
            let count =
                pipeline::ingest_positions(&client, &config.feed, &config.store, fetched_at)
                    .await?;
            info!(count, db = %config.store.path.display(), "Loaded trains into snapshot store");
        }
    }

    Ok(())
}

//! Incremental download of Euskalmet station observations.
//!
//! Run with: `cargo run --features cli --bin euskalmet-sync -- C017 C040`

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use euskalmet::{default_config_dir, default_data_dir, Concurrency, Euskalmet};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Downloads new observations of each station into `<data-dir>/<STATION>_OBS_MERGED.csv`.
#[derive(Parser, Debug)]
#[command(name = "euskalmet-sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Station codes, synced one after another.
    #[arg(required = true)]
    stations: Vec<String>,

    /// Fetch the hours of a batch one at a time.
    #[arg(long)]
    sequential: bool,

    /// Resume point instead of the last persisted hour (RFC 3339, or `YYYY-MM-DD HH:MM` in UTC).
    #[arg(long, value_parser = parse_start)]
    start: Option<DateTime<Utc>>,

    /// Directory with settings.toml and privateKey.pem.
    #[arg(long, env = "EUSKALMET_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Directory for sensor catalogs and observation tables.
    #[arg(long, env = "EUSKALMET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_start(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid start '{value}': {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let client = Euskalmet::with_dirs(&config_dir, &data_dir)
        .await
        .with_context(|| format!("Failed to set up client from {}", config_dir.display()))?;

    let concurrency = if args.sequential {
        Concurrency::Sequential
    } else {
        Concurrency::Parallel
    };

    let mut failed = Vec::new();
    for station in &args.stations {
        let report = client
            .sync()
            .station(station)
            .concurrency(concurrency)
            .maybe_start(args.start)
            .call()
            .await
            .with_context(|| format!("Sync of {station} failed"))?;
        println!("{report}");
        if report.batches_failed > 0 {
            failed.push(station.as_str());
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Some batches failed for: {}", failed.join(", "));
    }
    Ok(())
}

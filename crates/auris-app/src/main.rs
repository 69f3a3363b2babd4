//! Auris application binary - composition root.
//!
//! Ties together all Auris crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Initialize storage (SQLite)
//! 3. Build the aggregation pipeline with the configured slot source
//! 4. Either run one device-day aggregation or start the REST API server

mod cli;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;

use auris_aggregate::{Pipeline, RunOutcome, SlotSource};
use auris_api::AppState;
use auris_core::config::{AurisConfig, FetchMode};
use auris_core::error::AurisError;
use auris_core::types::{AggregationResult, SlotSummary, TimeSlot};
use auris_storage::{
    Database, RemoteSlotSource, RemoteSourceConfig, SlotEventRepository, SummaryRepository,
};

use cli::{CliArgs, Command};

/// Select the slot source from config and wire the pipeline.
fn build_pipeline(
    config: &AurisConfig,
    database: &Arc<Database>,
) -> Result<Pipeline, AurisError> {
    let source: Arc<dyn SlotSource> = match config.fetch.mode {
        FetchMode::Batch => Arc::new(SlotEventRepository::new(Arc::clone(database))),
        FetchMode::Remote => Arc::new(RemoteSlotSource::new(RemoteSourceConfig::from_config(
            &config.fetch,
        ))?),
    };
    let sink = Arc::new(SummaryRepository::new(Arc::clone(database)));
    Ok(Pipeline::new(source, sink, &config.aggregation))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = AurisConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Auris v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let db_path = args.resolve_db_path(&config.storage.db_path);
    let database = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    let pipeline = build_pipeline(&config, &database)?;

    match args.command {
        Command::Serve => {
            let state = AppState::new(config, database, pipeline);
            auris_api::start_server(state).await?;
        }
        Command::Run { device_id, date } => {
            run_once(&pipeline, &device_id, &date).await?;
        }
    }

    Ok(())
}

/// Execute one aggregation run and print a human-readable report.
async fn run_once(
    pipeline: &Pipeline,
    device_id: &str,
    date: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| "date must be in YYYY-MM-DD format")?;

    match pipeline.run(device_id, date).await {
        RunOutcome::Completed(result) => {
            print_report(device_id, date, &result);
            Ok(())
        }
        RunOutcome::Failed(failure) => {
            eprintln!("Run failed ({}): {}", failure.reason, failure.message);
            if failure.result.is_some() {
                eprintln!("The aggregation result was computed but could not be saved.");
            }
            Err(format!("aggregation failed: {}", failure.reason).into())
        }
    }
}

fn print_report(device_id: &str, date: NaiveDate, result: &AggregationResult) {
    println!("Aggregation for {} on {}", device_id, date);
    println!(
        "Total events: {}, unique ranked: {}",
        result.total_events(),
        result.summary_ranking.len()
    );

    println!("\nDaily ranking:");
    for (i, entry) in result.summary_ranking.iter().enumerate() {
        match entry.category {
            Some(category) => println!(
                "  {:2}. {} x{} [{}]",
                i + 1,
                entry.event,
                entry.count,
                category
            ),
            None => println!("  {:2}. {} x{}", i + 1, entry.event, entry.count),
        }
    }

    println!(
        "\nActive slots: {}/{}",
        result.active_slot_count(),
        auris_core::types::SLOT_COUNT
    );

    let mut activity: Vec<(TimeSlot, u32)> = result
        .time_blocks
        .iter()
        .filter_map(|(slot, summary)| match summary {
            SlotSummary::Events(events) => {
                Some((*slot, events.iter().map(|e| e.count).sum()))
            }
            _ => None,
        })
        .collect();
    activity.sort_by(|a, b| b.1.cmp(&a.1));

    if !activity.is_empty() {
        println!("Busiest slots:");
        for (slot, count) in activity.iter().take(5) {
            println!("  {}: {} events", slot, count);
        }
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the weather insight pipeline.
//!
//! ```text
//! weather_insights replay feed.jsonl [--config insights.toml] [--json]
//! weather_insights insight feed.jsonl
//! weather_insights stats feed.jsonl [--location Salvador]
//! ```
//!
//! Feeds are JSON lines in the collector's payload format. Set `RUST_LOG`
//! to see per-stage pipeline logging.

mod config;
mod feed;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use weather_insights_ai::fallback::fallback_insight;
use weather_insights_ai::generator::InsightGenerator;
use weather_insights_insight_models::Insight;
use weather_insights_pipeline::Orchestrator;
use weather_insights_reading_models::Reading;
use weather_insights_stats_models::StatisticsSnapshot;
use weather_insights_store::memory::{MemoryInsightStore, MemoryReadingStore};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "weather_insights",
    about = "Replay weather readings through the insight pipeline"
)]
struct Cli {
    /// TOML configuration file with `[ai]` and `[pipeline]` tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every reading in a feed through the pipeline, then print each
    /// location's statistics and recent insights
    Replay {
        /// JSON-lines feed file
        file: PathBuf,
    },
    /// Print the rule-based insight for every reading in a feed
    Insight {
        /// JSON-lines feed file
        file: PathBuf,
    },
    /// Print statistics for the readings in a feed
    Stats {
        /// JSON-lines feed file
        file: PathBuf,
        /// Only this location
        #[arg(long)]
        location: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Replay { file } => replay(&file, config, cli.json).await?,
        Commands::Insight { file } => insight(&file, &config, cli.json).await?,
        Commands::Stats { file, location } => {
            stats(&file, config, location.as_deref(), cli.json).await?;
        }
    }

    Ok(())
}

/// Stores every valid reading of the feed. Invalid readings are logged and
/// skipped.
async fn ingest(file: &Path, store: &MemoryReadingStore) -> Result<Vec<Reading>, feed::FeedError> {
    let mut stored = Vec::new();

    for (i, reading) in feed::load(file).await?.into_iter().enumerate() {
        match store.insert(reading).await {
            Ok(reading) => stored.push(reading),
            Err(e) => log::warn!("Skipping reading {} of {}: {e}", i + 1, file.display()),
        }
    }

    Ok(stored)
}

/// Latest timestamp per location, in first-seen order.
fn latest_by_location(readings: &[Reading]) -> Vec<(String, DateTime<Utc>)> {
    let mut latest: Vec<(String, DateTime<Utc>)> = Vec::new();

    for reading in readings {
        match latest.iter_mut().find(|(loc, _)| *loc == reading.location_id) {
            Some((_, ts)) => *ts = (*ts).max(reading.timestamp),
            None => latest.push((reading.location_id.clone(), reading.timestamp)),
        }
    }

    latest
}

async fn replay(
    file: &Path,
    config: AppConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let readings = Arc::new(MemoryReadingStore::new());
    let insights = Arc::new(MemoryInsightStore::new());
    let orchestrator =
        Orchestrator::from_config(&config.ai, config.pipeline, readings.clone(), insights)?;

    let stored = ingest(file, &readings).await?;

    // History windows end at each reading's own timestamp, so entries later
    // in the feed never show up as a reading's past.
    let mut failures = 0_usize;
    for reading in &stored {
        let task = orchestrator.on_new_reading(reading.clone());
        let reading_id = task.reading_id().to_string();
        if let Err(e) = task.join().await {
            failures += 1;
            log::error!("Reading {reading_id} was not processed: {e}");
        }
    }
    log::info!(
        "Replayed {} readings ({failures} failed)",
        stored.len()
    );

    for (location, as_of) in latest_by_location(&stored) {
        let snapshot = orchestrator.get_statistics_at(&location, as_of).await?;
        let recent = orchestrator.get_recent_insights(Some(&location)).await?;

        if json {
            println!(
                "{}",
                serde_json::json!({ "statistics": snapshot, "insights": recent })
            );
        } else {
            print_statistics(&snapshot);
            print_insights(&recent);
            println!();
        }
    }

    Ok(())
}

async fn insight(
    file: &Path,
    config: &AppConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for (i, reading) in feed::load(file).await?.into_iter().enumerate() {
        if let Err(e) = reading.validate() {
            log::warn!("Skipping reading {} of {}: {e}", i + 1, file.display());
            continue;
        }

        let reading = reading.into_reading((i + 1).to_string());
        let text = fallback_insight(&reading, config.ai.language);

        if json {
            println!(
                "{}",
                serde_json::json!({
                    "locationId": reading.location_id,
                    "timestamp": reading.timestamp,
                    "text": text,
                })
            );
        } else {
            println!(
                "{} {}: {text}",
                reading.timestamp.format("%Y-%m-%d %H:%M"),
                reading.location_id
            );
        }
    }

    Ok(())
}

async fn stats(
    file: &Path,
    config: AppConfig,
    location: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let readings = Arc::new(MemoryReadingStore::new());
    let insights = Arc::new(MemoryInsightStore::new());
    let generator = InsightGenerator::new(&config.ai, None, insights.clone());
    let orchestrator = Orchestrator::new(config.pipeline, readings.clone(), insights, generator);

    let stored = ingest(file, &readings).await?;

    let locations: Vec<(String, DateTime<Utc>)> = latest_by_location(&stored)
        .into_iter()
        .filter(|(loc, _)| location.is_none_or(|wanted| loc == wanted))
        .collect();

    if locations.is_empty() {
        println!("No readings found.");
        return Ok(());
    }

    for (loc, as_of) in locations {
        let snapshot = orchestrator.get_statistics_at(&loc, as_of).await?;
        if json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            print_statistics(&snapshot);
        }
    }

    Ok(())
}

fn print_statistics(snapshot: &StatisticsSnapshot) {
    println!("== {} ==", snapshot.location_id);

    let (Some(avg), Some(min), Some(max)) = (
        snapshot.avg_temperature,
        snapshot.min_temperature,
        snapshot.max_temperature,
    ) else {
        println!("  no data");
        return;
    };

    if let Some(current) = &snapshot.current {
        println!(
            "  current:  {:.1}°C, {:.0}% humidity, {} ({})",
            current.temperature,
            current.humidity_pct,
            current.condition_text,
            current.timestamp.format("%Y-%m-%d %H:%M UTC")
        );
    }
    println!("  average:  {avg:.1}°C");
    println!("  range:    {min:.1}°C .. {max:.1}°C");
    println!("  trend:    {}", snapshot.trend);
    println!("  samples:  {}", snapshot.sample_count);
}

fn print_insights(insights: &[Insight]) {
    if insights.is_empty() {
        println!("  no insights");
        return;
    }

    println!("  recent insights:");
    for insight in insights {
        println!(
            "  - [{}] {} ({})",
            insight.generated_at.format("%Y-%m-%d %H:%M:%S"),
            insight.text,
            insight.origin
        );
    }
}

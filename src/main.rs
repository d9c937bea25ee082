mod config;
mod error;
mod export;
mod models;
mod normalize;
mod pipeline;
mod scrapers;

use anyhow::Context;
use clap::Parser;
use config::ScoutConfig;
use pipeline::ListingPipeline;
use scrapers::snapshot::DEFAULT_SNAPSHOT_FILE;
use scrapers::{ListingFetcher, MapBounds, PageSource, SnapshotCache};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-scout", about = "Scrape for-sale listings into a CSV file")]
struct Cli {
    /// Read the page from the local snapshot instead of the live site
    #[arg(long)]
    offline: bool,

    /// Download the page into the snapshot when the snapshot file is missing
    #[arg(long, requires = "offline")]
    fetch_missing: bool,

    /// Snapshot file used in offline mode
    #[arg(long, default_value = DEFAULT_SNAPSHOT_FILE)]
    snapshot: PathBuf,

    /// CSV file to write (default: housingdata.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print normalized listings as JSON instead of writing CSV
    #[arg(long)]
    passthrough: bool,

    /// Search bounding box as NORTH,EAST,SOUTH,WEST
    #[arg(long, allow_hyphen_values = true, value_parser = parse_bounds)]
    bounds: Option<MapBounds>,

    /// Extra attempts when the request fails
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Comma-separated CSV columns, in order
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,
}

impl Cli {
    fn into_config(self) -> ScoutConfig {
        let mut config = ScoutConfig::default();

        if let Some(bounds) = self.bounds {
            config.fetch.area = config.fetch.area.with_bounds(bounds);
        }
        config.fetch.max_retries = self.retries;
        config.fetch.timeout = Duration::from_secs(self.timeout_secs);
        config.snapshot.path = self.snapshot;
        config.snapshot.fetch_missing = self.fetch_missing;
        config.export.output = self.output;
        if let Some(columns) = self.columns {
            config.export.columns = columns;
        }

        config
    }
}

fn parse_bounds(s: &str) -> Result<MapBounds, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;

    match parts[..] {
        [north, east, south, west] => Ok(MapBounds {
            north,
            east,
            south,
            west,
        }),
        _ => Err(format!("expected 4 coordinates, got {}", parts.len())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so passthrough JSON owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let offline = cli.offline;
    let passthrough = cli.passthrough;
    let config = cli.into_config();

    info!("🏠 Listing Scout");
    info!("===============");

    let fetcher = ListingFetcher::new(config.fetch.clone())?;
    let source: Box<dyn PageSource> = if offline {
        let mut cache = SnapshotCache::new(config.snapshot.path.clone());
        if config.snapshot.fetch_missing {
            cache = cache.with_fallback(Box::new(fetcher));
        }
        info!("Offline mode, reading {}", cache.path().display());
        Box::new(cache)
    } else {
        Box::new(fetcher)
    };

    let pipeline = ListingPipeline::new(config)?;

    if passthrough {
        let collected = pipeline
            .collect(source.as_ref())
            .await
            .context("Failed to collect listings")?;
        println!("{}", serde_json::to_string_pretty(&collected.listings)?);
        info!(
            "✅ {} listings, {} dropped",
            collected.listings.len(),
            collected.report.total_dropped()
        );
        return Ok(());
    }

    let report = pipeline
        .run(source.as_ref())
        .await
        .with_context(|| {
            format!(
                "Scrape of {} failed",
                pipeline.config().fetch.area.search_term
            )
        })?;

    if report.export.is_none() {
        warn!("No CSV file was written");
    }

    Ok(())
}

//! Command-line entry point
//!
//! Collects the race history of one player, optionally persisting fetched
//! windows to the cache. A `speedograph.yaml` in the working directory
//! overrides the default configuration.

use anyhow::{Context, Result};
use clap::Parser;
use speedograph::{Collector, CollectorConfig, FsStore, HttpTransport};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "speedograph.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TypeRacer username to collect races for
    identity: String,

    /// Write fetched windows to the cache directory
    #[arg(long)]
    cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = if Path::new(CONFIG_FILE).exists() {
        info!("Loading configuration from {}", CONFIG_FILE);
        CollectorConfig::from_file(CONFIG_FILE)
            .with_context(|| format!("Failed to load {}", CONFIG_FILE))?
    } else {
        CollectorConfig::default()
    };

    let transport = HttpTransport::new(config.request_timeout())?;
    let mut collector = Collector::new(config, transport, FsStore::new())?;

    let collection = collector
        .collect(&args.identity, args.cache)
        .await
        .with_context(|| format!("Collection for '{}' failed", args.identity))?;

    println!(
        "{}: {} races, {} windows fetched, {} windows failed",
        collection.identity(),
        collection.len(),
        collection.fetched_windows().len(),
        collection.failed_windows().len()
    );

    Ok(())
}

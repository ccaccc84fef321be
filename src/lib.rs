//! Incremental, cache-backed collection of TypeRacer race history.
//!
//! Speedograph fetches a player's races from the TypeRacer games API and keeps
//! one JSON cache file per fetched time window. Later runs read those files,
//! work out which time ranges are still missing and only ask the API for those.
//!
//! # Features
//!
//! - **Incremental**: cached windows are never requested again
//! - **Bounded requests**: gaps are split into windows no larger than the API allows
//! - **Tolerant**: malformed cache files and API responses only affect their own window
//! - **Pluggable**: transport, storage and clock are traits
//!
//! ## Example
//!
//! ```rust,no_run
//! use speedograph::{Collector, CollectorConfig, FsStore, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> speedograph::Result<()> {
//!     let config = CollectorConfig::default();
//!     let transport = HttpTransport::new(config.request_timeout())?;
//!     let mut collector = Collector::new(config, transport, FsStore::new())?;
//!
//!     let collection = collector.collect("fuexfollets", true).await?;
//!     println!("{} races", collection.len());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod interval;
pub mod race;
#[cfg(test)]
mod test_utils;

// Collaborators
pub mod store;
pub mod transport;

// Collection
pub mod cache;
pub mod collector;
pub mod config;

// Core exports
pub use error::*;
pub use interval::{Contained, EpochInterval, RemainderPolicy};
pub use race::{Race, decode_races};

// Collaborator exports
pub use store::{CacheStore, FsStore};
pub use transport::{HttpTransport, Transport};

// Main API exports
pub use cache::{CachedCoverage, cache_file_name, parse_cache_file_name};
pub use collector::{
    Clock, Collection, Collector, CollectorState, FixedClock, SystemClock, compute_gaps,
    subdivide_gaps,
};
pub use config::CollectorConfig;

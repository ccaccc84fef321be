//! Incremental collection of race history
//!
//! A run loads the windows already cached for an identity, works out which
//! parts of `[domain_start, now]` are not covered yet, splits those gaps into
//! API-sized windows and fetches them one after another.
//!
//! # Failure policy
//!
//! - A cache file with a malformed name aborts the run before anything is fetched.
//! - A cache file with malformed content loses its races but stays covered.
//! - A response that is not race JSON is cached as `{}`, so the window counts
//!   as covered and is never requested again.
//! - A transport failure leaves the window uncovered and uncached; it is
//!   reported in [`Collection::failed_windows`] and retried on the next run.
//! - Failing to write a cache file aborts the run. Files written earlier stay
//!   valid for the next run.
//!
//! # Concurrency
//!
//! Windows are fetched strictly in sequence. Two runs for the same identity
//! must not overlap: nothing guards the cache directory, and concurrent runs
//! can write duplicate or overlapping windows.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace, warn};

use crate::cache::{self, CachedCoverage};
use crate::race::decode_races;
use crate::store::CacheStore;
use crate::transport::Transport;
use crate::{CollectorConfig, EpochInterval, Race, RemainderPolicy, Result};

/// Placeholder cached for windows whose response could not be decoded.
const EMPTY_WINDOW: &str = "{}";

/// Source of the current epoch second
pub trait Clock: Send + Sync {
    fn now_epoch(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    }
}

/// A clock frozen at one epoch second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch(&self) -> i64 {
        self.0
    }
}

/// Phase of the current (or last) collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    LoadingCache,
    ComputingGaps,
    Fetching,
    Done,
}

/// Races and coverage gathered by one run for one identity
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    identity: String,
    races: Vec<Race>,
    coverage: Vec<EpochInterval>,
    fetched_windows: Vec<EpochInterval>,
    failed_windows: Vec<EpochInterval>,
}

impl Collection {
    fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            races: Vec::new(),
            coverage: Vec::new(),
            fetched_windows: Vec::new(),
            failed_windows: Vec::new(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Cached races first, in file enumeration order, then fetched races in
    /// window order. Not sorted by time and not deduplicated.
    pub fn races(&self) -> &[Race] {
        &self.races
    }

    pub fn into_races(self) -> Vec<Race> {
        self.races
    }

    /// Every window known to be covered after the run, sorted by start.
    pub fn coverage(&self) -> &[EpochInterval] {
        &self.coverage
    }

    /// Windows requested from the API during this run that yielded a response.
    pub fn fetched_windows(&self) -> &[EpochInterval] {
        &self.fetched_windows
    }

    /// Windows whose request failed; they stay uncovered.
    pub fn failed_windows(&self) -> &[EpochInterval] {
        &self.failed_windows
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }
}

/// Intervals in `[domain_start, now]` not covered by `coverage`.
///
/// The coverage set is sorted here, so directory enumeration order does not
/// matter. Overlapping or out-of-domain coverage is tolerated, and empty
/// gaps are never produced.
pub fn compute_gaps(coverage: &[EpochInterval], domain_start: i64, now: i64) -> Vec<EpochInterval> {
    let mut sorted: Vec<EpochInterval> =
        coverage.iter().copied().filter(|interval| !interval.is_empty()).collect();
    sorted.sort_by_key(|interval| (interval.start, interval.end));

    let mut gaps = Vec::new();
    let mut cursor = domain_start;

    for covered in &sorted {
        if covered.start > cursor {
            let gap = EpochInterval::new(cursor, (covered.start - 1).min(now));
            if !gap.is_empty() {
                gaps.push(gap);
            }
        }
        match covered.end.checked_add(1) {
            Some(next) => cursor = cursor.max(next),
            None => return gaps,
        }
    }

    let trailing = EpochInterval::new(cursor, now);
    if !trailing.is_empty() {
        gaps.push(trailing);
    }

    gaps
}

/// Split every gap into `floor(length / max_window)` parts (at least one),
/// concatenating the results in gap order.
pub fn subdivide_gaps(
    gaps: &[EpochInterval],
    max_window: i64,
    policy: RemainderPolicy,
) -> Vec<EpochInterval> {
    gaps.iter()
        .flat_map(|gap| gap.divide_with(gap.minimum_divisions(max_window), policy))
        .collect()
}

/// Orchestrates incremental collection runs
pub struct Collector<T, S, C = SystemClock> {
    config: CollectorConfig,
    transport: T,
    store: S,
    clock: C,
    state: CollectorState,
}

impl<T, S> Collector<T, S, SystemClock>
where
    T: Transport,
    S: CacheStore,
{
    /// Create a collector using wall-clock time.
    pub fn new(config: CollectorConfig, transport: T, store: S) -> Result<Self> {
        Self::with_clock(config, transport, store, SystemClock)
    }
}

impl<T, S, C> Collector<T, S, C>
where
    T: Transport,
    S: CacheStore,
    C: Clock,
{
    /// Create a collector with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation.
    pub fn with_clock(config: CollectorConfig, transport: T, store: S, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transport, store, clock, state: CollectorState::Idle })
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Cache directory used for `identity`.
    pub fn cache_dir(&self, identity: &str) -> PathBuf {
        self.config.cache_dir(identity)
    }

    /// Read the coverage set and races cached for `identity`.
    pub async fn load_from_cache(&self, identity: &str) -> Result<CachedCoverage> {
        cache::load_from_cache(&self.store, &self.cache_dir(identity), identity).await
    }

    /// Fetch the raw API response for one window.
    pub async fn fetch(&self, identity: &str, interval: &EpochInterval) -> Result<String> {
        let url = self.config.render_url(identity, interval);
        debug!(%interval, "Calling API for window");
        self.transport.fetch_text(&url).await
    }

    /// Persist `content` as the cache entry for `interval`.
    pub async fn cache_file(
        &self,
        identity: &str,
        interval: &EpochInterval,
        content: &str,
    ) -> Result<()> {
        cache::cache_file(&self.store, &self.cache_dir(identity), identity, interval, content).await
    }

    /// Run one incremental collection for `identity`.
    ///
    /// Loads the cache, fetches every uncovered window up to now and, when
    /// `should_cache` is set, writes one cache file per fetched window.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `identity` is not a plain username
    /// - A cache file name does not match the expected format
    /// - The cache directory cannot be read, created or written
    ///
    /// Decode and transport failures are handled per window and do not fail the run.
    pub async fn collect(&mut self, identity: &str, should_cache: bool) -> Result<Collection> {
        CollectorConfig::validate_identity(identity)?;
        info!(identity, should_cache, "Starting collection");

        self.transition(CollectorState::LoadingCache);
        let cached = self.load_from_cache(identity).await?;

        let mut collection = Collection::new(identity);
        collection.races = cached.races;
        collection.coverage = cached.coverage;

        self.transition(CollectorState::ComputingGaps);
        let now = self.clock.now_epoch();
        let gaps = compute_gaps(&collection.coverage, self.config.domain_start_epoch, now);
        let windows =
            subdivide_gaps(&gaps, self.config.max_window_secs, self.config.remainder_policy);
        info!(
            identity,
            now,
            gaps = gaps.len(),
            windows = windows.len(),
            "Computed uncollected windows"
        );

        if should_cache && !windows.is_empty() {
            let dir = self.cache_dir(identity);
            if !self.store.exists(&dir).await? {
                debug!(dir = %dir.display(), "Creating cache directory");
                self.store.ensure_directory(&dir).await?;
            }
        }

        self.transition(CollectorState::Fetching);
        for window in windows {
            let body = match self.fetch(identity, &window).await {
                Ok(body) => body,
                Err(e) if e.is_recoverable() => {
                    warn!(%window, error = %e, "Fetch failed; window left uncovered");
                    collection.failed_windows.push(window);
                    continue;
                }
                Err(e) => return Err(e),
            };
            trace!(%window, bytes = body.len(), "Received window");

            let (races, content) = match decode_races(&body) {
                Ok(races) => (races, body),
                Err(e) => {
                    warn!(%window, error = %e, "Response is not race data; caching empty window");
                    (Vec::new(), EMPTY_WINDOW.to_string())
                }
            };

            if should_cache {
                self.cache_file(identity, &window, &content).await?;
            }

            debug!(%window, races = races.len(), "Collected window");
            collection.races.extend(races);
            collection.coverage.push(window);
            collection.fetched_windows.push(window);
        }

        collection.coverage.sort_by_key(|interval| (interval.start, interval.end));
        self.transition(CollectorState::Done);

        info!(
            identity,
            races = collection.len(),
            fetched = collection.fetched_windows.len(),
            failed = collection.failed_windows.len(),
            "Collection complete"
        );

        Ok(collection)
    }

    fn transition(&mut self, next: CollectorState) {
        debug!(from = ?self.state, to = ?next, "Collector state change");
        self.state = next;
    }
}

//! Cache file naming and loading
//!
//! Each cache file holds the races for exactly one fetched window and is named
//! `{identity}_{start_epoch}_{end_epoch}.json`, so the set of file names alone
//! tells the collector which time ranges are already known.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::race::decode_races;
use crate::store::{CacheStore, cache_path};
use crate::{CollectionError, EpochInterval, Race, Result};

const CACHE_EXTENSION: &str = ".json";

/// Coverage and records recovered from an identity's cache directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedCoverage {
    /// One interval per cache file, in directory enumeration order.
    pub coverage: Vec<EpochInterval>,

    /// Races from every readable cache file, in the same order.
    pub races: Vec<Race>,
}

/// File name for the cache entry of `identity` covering `interval`.
pub fn cache_file_name(identity: &str, interval: &EpochInterval) -> String {
    format!("{}_{}_{}{}", identity, interval.start, interval.end, CACHE_EXTENSION)
}

/// Recover the interval encoded in a cache file name.
///
/// The bounds are split from the right so identities containing `_` still
/// match. The identity prefix must equal `identity`.
pub fn parse_cache_file_name(identity: &str, file_name: &str) -> Result<EpochInterval> {
    let stem = file_name
        .strip_suffix(CACHE_EXTENSION)
        .ok_or_else(|| CollectionError::format_error(file_name, "missing .json extension"))?;

    let mut parts = stem.rsplitn(3, '_');
    let (end, start, prefix) = match (parts.next(), parts.next(), parts.next()) {
        (Some(end), Some(start), Some(prefix)) => (end, start, prefix),
        _ => {
            return Err(CollectionError::format_error(
                file_name,
                "expected {identity}_{start_epoch}_{end_epoch}.json",
            ));
        }
    };

    if prefix != identity {
        return Err(CollectionError::format_error(
            file_name,
            format!("belongs to '{}', expected '{}'", prefix, identity),
        ));
    }

    let start: i64 = start.parse().map_err(|_| {
        CollectionError::format_error(file_name, format!("start epoch '{}' is not an integer", start))
    })?;
    let end: i64 = end.parse().map_err(|_| {
        CollectionError::format_error(file_name, format!("end epoch '{}' is not an integer", end))
    })?;

    Ok(EpochInterval::new(start, end))
}

/// Load every cache file for `identity` from `dir`.
///
/// A file whose name does not parse aborts the load with a format error. A
/// file whose content is not valid race JSON is logged and contributes no
/// races, but its interval still counts as covered so it is never fetched
/// again.
pub async fn load_from_cache<S>(store: &S, dir: &Path, identity: &str) -> Result<CachedCoverage>
where
    S: CacheStore + ?Sized,
{
    let mut cached = CachedCoverage::default();

    for file_name in store.list_files(dir).await? {
        let interval = parse_cache_file_name(identity, &file_name)?;
        debug!(file = %file_name, %interval, "Loading from cache");
        cached.coverage.push(interval);

        let content = match store.read_file(&cache_path(dir, &file_name)).await {
            Ok(content) => content,
            Err(CollectionError::File { source, .. })
                if source.kind() == std::io::ErrorKind::InvalidData =>
            {
                warn!(file = %file_name, error = %source, "Cache file is not UTF-8 text");
                continue;
            }
            Err(e) => return Err(e),
        };

        match decode_races(&content) {
            Ok(races) => cached.races.extend(races),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Cache file does not contain valid race data");
            }
        }
    }

    info!(
        identity,
        files = cached.coverage.len(),
        races = cached.races.len(),
        "Loaded cached windows"
    );

    Ok(cached)
}

/// Write the cache entry for `interval`, replacing any existing file of the same name.
pub async fn cache_file<S>(
    store: &S,
    dir: &Path,
    identity: &str,
    interval: &EpochInterval,
    content: &str,
) -> Result<()>
where
    S: CacheStore + ?Sized,
{
    let file_name = cache_file_name(identity, interval);
    store.write_file(&cache_path(dir, &file_name), content).await?;
    debug!(file = %file_name, bytes = content.len(), "Cached window");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsStore;
    use crate::test_utils::{MemoryStore, race_json};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn dir() -> PathBuf {
        PathBuf::from("cache/racer")
    }

    proptest! {
        #[test]
        fn file_names_parse_back(
            identity in "[a-z][a-z0-9_]{0,15}",
            start in 0i64..4_000_000_000,
            len in 0i64..10_000_000,
        ) {
            let interval = EpochInterval::new(start, start + len);
            let name = cache_file_name(&identity, &interval);
            prop_assert_eq!(parse_cache_file_name(&identity, &name).unwrap(), interval);
        }
    }

    #[test]
    fn file_name_format() {
        let name = cache_file_name("racer", &EpochInterval::new(1000, 1099));
        assert_eq!(name, "racer_1000_1099.json");
    }

    #[test]
    fn identity_with_underscores() {
        let interval = parse_cache_file_name("fast_racer", "fast_racer_5_9.json").unwrap();
        assert_eq!(interval, EpochInterval::new(5, 9));
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "racer_1000_1099.txt",
            "racer_1000.json",
            "racer_abc_1099.json",
            "racer_1000_.json",
            "other_1000_1099.json",
            "notes.json",
        ] {
            let err = parse_cache_file_name("racer", name).unwrap_err();
            assert!(matches!(err, CollectionError::Format { .. }), "{name} should be rejected");
        }
    }

    #[tokio::test]
    async fn loads_intervals_and_races() {
        let store = MemoryStore::new();
        store.insert(dir().join("racer_100_199.json"), format!("[{}]", race_json(150.0)));
        store.insert(
            dir().join("racer_300_399.json"),
            format!("[{}, {}]", race_json(310.0), race_json(320.0)),
        );

        let mut cached = load_from_cache(&store, &dir(), "racer").await.unwrap();
        cached.coverage.sort_by_key(|i| i.start);

        assert_eq!(cached.coverage, vec![EpochInterval::new(100, 199), EpochInterval::new(300, 399)]);
        assert_eq!(cached.races.len(), 3);
    }

    #[tokio::test]
    async fn malformed_content_still_counts_as_covered() {
        let store = MemoryStore::new();
        store.insert(dir().join("racer_1000_1099.json"), "{\"truncated\": ");

        let cached = load_from_cache(&store, &dir(), "racer").await.unwrap();

        assert_eq!(cached.coverage, vec![EpochInterval::new(1000, 1099)]);
        assert!(cached.races.is_empty());
    }

    #[tokio::test]
    async fn non_utf8_content_still_counts_as_covered() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("racer");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("racer_1000_1099.json"), [0xff, 0xfe, b'[', b']']).unwrap();
        std::fs::write(dir.join("racer_1100_1199.json"), format!("[{}]", race_json(1100.0)))
            .unwrap();

        let mut cached = load_from_cache(&FsStore::new(), &dir, "racer").await.unwrap();
        cached.coverage.sort_by_key(|i| i.start);

        assert_eq!(
            cached.coverage,
            vec![EpochInterval::new(1000, 1099), EpochInterval::new(1100, 1199)]
        );
        assert_eq!(cached.races.len(), 1);
    }

    #[tokio::test]
    async fn empty_object_placeholder_loads_without_races() {
        let store = MemoryStore::new();
        store.insert(dir().join("racer_1_2.json"), "{}");

        let cached = load_from_cache(&store, &dir(), "racer").await.unwrap();
        assert_eq!(cached.coverage.len(), 1);
        assert!(cached.races.is_empty());
    }

    #[tokio::test]
    async fn foreign_file_aborts_load() {
        let store = MemoryStore::new();
        store.insert(dir().join("racer_1_2.json"), "[]");
        store.insert(dir().join("README.md"), "notes");

        let err = load_from_cache(&store, &dir(), "racer").await.unwrap_err();
        assert!(matches!(err, CollectionError::Format { .. }));
    }

    #[tokio::test]
    async fn missing_directory_is_empty_cache() {
        let store = MemoryStore::new();
        let cached = load_from_cache(&store, &dir(), "racer").await.unwrap();
        assert_eq!(cached, CachedCoverage::default());
    }

    #[tokio::test]
    async fn cache_file_overwrites() {
        let store = MemoryStore::new();
        let interval = EpochInterval::new(1, 2);

        cache_file(&store, &dir(), "racer", &interval, "[]").await.unwrap();
        cache_file(&store, &dir(), "racer", &interval, "{}").await.unwrap();

        assert_eq!(store.get(dir().join("racer_1_2.json")).as_deref(), Some("{}"));
        assert_eq!(store.paths(), vec![dir().join("racer_1_2.json")]);
    }
}

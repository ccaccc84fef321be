//! In-memory collaborators for unit tests
//!
//! [`MemoryStore`] stands in for the cache directory and [`ScriptedTransport`]
//! stands in for the games API, recording every URL it is asked for.

#![cfg(test)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::store::CacheStore;
use crate::transport::Transport;
use crate::{CollectionError, Result};

/// Cache store holding files in a map keyed by full path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    directories: Mutex<Vec<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.lock().unwrap().insert(path.into(), content.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn has_directory(&self, dir: impl AsRef<Path>) -> bool {
        self.directories.lock().unwrap().iter().any(|d| d == dir.as_ref())
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        // Reverse order so callers cannot rely on sorted enumeration.
        Ok(files
            .keys()
            .rev()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| {
            CollectionError::file_error(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.insert(path, content);
        Ok(())
    }

    async fn ensure_directory(&self, dir: &Path) -> Result<()> {
        let mut directories = self.directories.lock().unwrap();
        if !directories.iter().any(|d| d == dir) {
            directories.push(dir.to_path_buf());
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let in_files = {
            let files = self.files.lock().unwrap();
            files.keys().any(|file| file == path || file.parent() == Some(path))
        };
        Ok(in_files || self.has_directory(path))
    }
}

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Transport answering every request from a closure.
pub struct ScriptedTransport {
    responder: Responder,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self { responder: Box::new(responder), calls: Mutex::new(Vec::new()) }
    }

    /// Answer every request with `body`.
    pub fn always(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::from_fn(move |_| Ok(body.clone()))
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        (self.responder)(url)
    }
}

/// JSON for a single race finished at `timestamp`.
pub fn race_json(timestamp: f64) -> String {
    format!(
        r#"{{"wpm": 100.39, "ac": 0.98, "r": 1, "t": {timestamp}, "sl": "L6", "tid": 4350102, "gn": 2319, "np": 3, "pts": 150.59}}"#
    )
}

/// Pull the `startDate`/`endDate` query parameters back out of a games URL.
pub fn url_bounds(url: &str) -> Option<(i64, i64)> {
    let query = url.split_once('?')?.1;
    let mut start = None;
    let mut end = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("startDate", value)) => start = value.parse().ok(),
            Some(("endDate", value)) => end = value.parse().ok(),
            _ => {}
        }
    }
    Some((start?, end?))
}

//! Collector configuration
//!
//! Paths, URLs and window constants are inputs to the collector rather than
//! behavior it computes. Defaults target the public TypeRacer games API; any
//! field can be overridden from a YAML document:
//!
//! ```yaml
//! cache_dir_template: "/var/lib/speedograph/{identity}"
//! max_window_secs: 604800
//! remainder_policy: extend_last
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CollectionError, EpochInterval, RemainderPolicy, Result};

/// Earliest epoch worth querying: 1 February 2008, before TypeRacer launched.
pub const DEFAULT_DOMAIN_START_EPOCH: i64 = 1_201_845_600;

/// Largest window requested in one API call, roughly three months.
pub const DEFAULT_MAX_WINDOW_SECS: i64 = 2_629_743 * 3;

pub const DEFAULT_CACHE_DIR_TEMPLATE: &str = "data/cache/{identity}";

pub const DEFAULT_API_URL_TEMPLATE: &str = "https://data.typeracer.com/games?playerId=tr:{identity}&universe=play&startDate={start_epoch}&endDate={end_epoch}";

const IDENTITY: &str = "{identity}";
const START_EPOCH: &str = "{start_epoch}";
const END_EPOCH: &str = "{end_epoch}";

/// Settings for a [`Collector`](crate::Collector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// URL with `{identity}`, `{start_epoch}` and `{end_epoch}` placeholders.
    pub api_url_template: String,

    /// Cache directory with an `{identity}` placeholder.
    pub cache_dir_template: String,

    /// First epoch second of the collection domain.
    pub domain_start_epoch: i64,

    /// Window size used to subdivide gaps before fetching.
    pub max_window_secs: i64,

    pub remainder_policy: RemainderPolicy,

    /// Per-request timeout for the HTTP transport; `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_url_template: DEFAULT_API_URL_TEMPLATE.to_string(),
            cache_dir_template: DEFAULT_CACHE_DIR_TEMPLATE.to_string(),
            domain_start_epoch: DEFAULT_DOMAIN_START_EPOCH,
            max_window_secs: DEFAULT_MAX_WINDOW_SECS,
            remainder_policy: RemainderPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl CollectorConfig {
    /// Parse and validate a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CollectorConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| CollectionError::config_error(format!("YAML parsing failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| CollectionError::file_error(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_window_secs <= 0 {
            return Err(CollectionError::config_error(format!(
                "max_window_secs must be positive, got {}",
                self.max_window_secs
            )));
        }

        for placeholder in [IDENTITY, START_EPOCH, END_EPOCH] {
            if !self.api_url_template.contains(placeholder) {
                return Err(CollectionError::config_error(format!(
                    "api_url_template is missing the {} placeholder",
                    placeholder
                )));
            }
        }

        if !self.cache_dir_template.contains(IDENTITY) {
            return Err(CollectionError::config_error(
                "cache_dir_template is missing the {identity} placeholder",
            ));
        }

        Ok(())
    }

    /// Check that `identity` is safe to place in a URL and a directory name.
    ///
    /// Accepts ASCII letters, digits, `_`, `-` and `.`, excluding `.` and `..`.
    pub fn validate_identity(identity: &str) -> Result<()> {
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');

        if identity.is_empty() || identity == "." || identity == ".." {
            return Err(CollectionError::config_error(format!(
                "identity '{}' is not a valid username",
                identity
            )));
        }

        if let Some(c) = identity.chars().find(|c| !allowed(*c)) {
            return Err(CollectionError::config_error(format!(
                "identity '{}' contains unsupported character {:?}",
                identity, c
            )));
        }

        Ok(())
    }

    /// URL for the games `identity` played within `interval`.
    ///
    /// The identity is inserted verbatim; run it through
    /// [`validate_identity`](Self::validate_identity) first.
    pub fn render_url(&self, identity: &str, interval: &EpochInterval) -> String {
        self.api_url_template
            .replace(IDENTITY, identity)
            .replace(START_EPOCH, &interval.start.to_string())
            .replace(END_EPOCH, &interval.end.to_string())
    }

    /// Cache directory for `identity`.
    pub fn cache_dir(&self, identity: &str) -> PathBuf {
        PathBuf::from(self.cache_dir_template.replace(IDENTITY, identity))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

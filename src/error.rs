//! Error types for race collection.
//!
//! All errors implement the `std::error::Error` trait and carry enough context
//! to tell which cache file, URL or configuration value was involved.
//!
//! ## Error Categories
//!
//! - **Format Errors**: A cache filename does not match `{identity}_{start}_{end}.json`
//! - **Decode Errors**: A cache file or API response is not valid race JSON
//! - **Transport Errors**: The remote API could not be reached or answered with a failure
//! - **File Errors**: The cache directory could not be listed, read or written
//! - **Config Errors**: The collector configuration is unusable
//!
//! ## Recovery
//!
//! Decode and transport failures only affect a single window. The collector
//! recovers from them locally and keeps going; everything else aborts the run.
//!
//! ```rust
//! use speedograph::CollectionError;
//!
//! let error = CollectionError::transport_failed("https://example.invalid", "connection reset");
//! if error.is_recoverable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for collection operations.
pub type Result<T, E = CollectionError> = std::result::Result<T, E>;

/// Main error type for collection operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CollectionError {
    #[error("Cache file '{file_name}' does not match the expected format: {reason}")]
    Format { file_name: String, reason: String },

    #[error("Decode error in {context}: {details}")]
    Decode { context: String, details: String },

    #[error("Request to {url} failed: {reason}")]
    Transport {
        url: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cache file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl CollectionError {
    /// Returns whether the collector can recover from this error for a single window.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CollectionError::Decode { .. } => true,
            CollectionError::Transport { .. } => true,
            CollectionError::Format { .. } => false,
            CollectionError::File { .. } => false,
            CollectionError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CollectionError::Format { .. } => vec![
                "Remove files that were not written by speedograph from the cache directory",
                "Check that the cache directory belongs to the requested identity",
            ],
            CollectionError::Decode { .. } => vec![
                "Delete the affected cache file to force the window to be fetched again",
                "Check whether the API changed its response format",
            ],
            CollectionError::Transport { .. } => vec![
                "Check network connectivity",
                "Verify the API URL template in the configuration",
                "Run the collection again; failed windows are retried",
            ],
            CollectionError::File { .. } => vec![
                "Check the cache directory exists and is writable",
                "Ensure sufficient disk space",
                "Check file permissions",
            ],
            CollectionError::Config { .. } => vec![
                "Check the configuration file against the documented defaults",
                "Ensure templates contain all required placeholders",
            ],
        }
    }

    /// Helper constructor for cache filename errors.
    pub fn format_error(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::Format { file_name: file_name.into(), reason: reason.into() }
    }

    /// Helper constructor for decode errors.
    pub fn decode_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        CollectionError::Decode { context: context.into(), details: details.into() }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        CollectionError::Transport { url: url.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        url: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CollectionError::Transport { url: url.into(), reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollectionError::File { path: path.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        CollectionError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for CollectionError {
    fn from(err: std::io::Error) -> Self {
        CollectionError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_json::Error> for CollectionError {
    fn from(err: serde_json::Error) -> Self {
        CollectionError::Decode { context: "JSON".to_string(), details: err.to_string() }
    }
}

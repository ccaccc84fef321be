//! Transport collaborator for the games API

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

use crate::{CollectionError, Result};

/// Trait for fetching raw response bodies
///
/// The collector issues one call per window and awaits it before the next,
/// so implementations never see concurrent requests from a single run.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body at `url` as text
    ///
    /// Returns:
    /// - `Ok(body)` - The request completed with a success status. The body
    ///   may still be malformed; decoding is the caller's concern.
    /// - `Err(CollectionError::Transport { .. })` - Network or HTTP failure
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with an optional per-request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            CollectionError::config_error(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "Requesting games");

        let response = self.client.get(url).send().await.map_err(|e| {
            CollectionError::transport_failed_with_source(url, "request failed", Box::new(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectionError::transport_failed(
                url,
                format!("unexpected HTTP status {}", status),
            ));
        }

        let body = response.text().await.map_err(|e| {
            CollectionError::transport_failed_with_source(url, "failed to read body", Box::new(e))
        })?;

        trace!(url, bytes = body.len(), "Received response body");
        Ok(body)
    }
}

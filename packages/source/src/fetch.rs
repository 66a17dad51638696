//! The `fetch(url) -> JSON` capability.
//!
//! Everything above this module talks to the upstream API through the
//! [`JsonFetcher`] trait so that the pipeline can run against canned
//! responses in tests and against [`HttpFetcher`] in production.

use std::time::Duration;

use async_trait::async_trait;
use ccvi_map_source_models::ResolvedRequest;

use crate::{SourceError, resolve, retry};

/// Per-request timeout for upstream calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a resolved request and returns its JSON body.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// Fetches `request`, returning the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the body is not
    /// JSON.
    async fn fetch_json(&self, request: &ResolvedRequest) -> Result<serde_json::Value, SourceError>;
}

/// [`JsonFetcher`] backed by a shared [`reqwest::Client`] with retry.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ccvi-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn fetch_json(&self, request: &ResolvedRequest) -> Result<serde_json::Value, SourceError> {
        let url = resolve::to_url(request)?;
        log::info!("Fetching {url}");
        let body = retry::send_json(|| self.client.get(url.clone())).await?;
        log::debug!("Received response from {url}");
        Ok(body)
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Upstream CCVI API access.
//!
//! Turns a [`FilterState`](ccvi_map_indicator_models::FilterState) into a
//! request against the IWMI CCVI API ([`resolve`]), fetches it through a
//! [`JsonFetcher`] with retry ([`fetch`], [`retry`]), coerces whatever
//! envelope the endpoint family returns into a flat record list
//! ([`normalize`]), and extracts a bounded indicator value from each
//! record ([`extract`]).

pub mod extract;
pub mod fetch;
pub mod location;
pub mod normalize;
pub mod resolve;
pub mod retry;

pub use fetch::{HttpFetcher, JsonFetcher};

/// Errors that can occur while talking to the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// No endpoint is registered for the indicator.
    #[error("No endpoint found for indicator: {id}")]
    UnknownIndicator {
        /// The unknown indicator id.
        id: String,
    },

    /// A request URL could not be built.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },
}

impl SourceError {
    /// Returns `true` for network-level failures (rejected fetch or
    /// non-2xx status), which are the only errors worth retrying.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Visual encoding and rendering backends.
//!
//! [`encode`] turns a bound record into a color/radius/opacity style and
//! builds legend metadata. [`feature`] assembles the keyed
//! [`VisualFeature`](feature::VisualFeature) set handed to a
//! [`RenderBackend`](backend::RenderBackend).

pub mod backend;
pub mod encode;
pub mod feature;
pub mod viewport;

pub use backend::{BackendConfig, GeoJsonLayerBackend, LayerDiff, RenderBackend};
pub use encode::{Legend, LegendEntry, Style, VulnerabilityLevel};
pub use feature::{Popup, VisualFeature};
pub use viewport::Viewport;

use thiserror::Error;

/// Errors raised by rendering backends.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Backend configuration is unusable.
    #[error("Invalid backend configuration: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },

    /// Feature properties could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View/controller for the CCVI map.
//!
//! The [`DashboardController`] owns the current
//! [`FilterState`](ccvi_map_indicator_models::FilterState), drives the
//! load state machine, and pushes rendered layers into a
//! [`RenderBackend`](ccvi_map_render::RenderBackend). Loading itself lives
//! in [`loader`] so the HTTP server can reuse it without a controller.

pub mod cache;
pub mod config;
pub mod controller;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod report;

pub use cache::TtlCache;
pub use config::DashboardConfig;
pub use controller::{ApplyOutcome, DashboardController, LoadState, StatusBadge};
pub use loader::{CompletedLoad, LayerLoader, LoadedLayer, PendingLoad};

use ccvi_map_indicator::RegistryError;
use ccvi_map_render::RenderError;
use ccvi_map_source::SourceError;
use thiserror::Error;

/// Errors surfaced by the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Upstream request, resolution, or parsing failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The rendering backend rejected the layer.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The embedded indicator registry is invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// CSV export failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

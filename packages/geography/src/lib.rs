#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary datasets and record binding.
//!
//! Parses the upstream `administrative-units` payload into a
//! [`BoundaryDataset`] and joins normalized records to those geometries by
//! name. Records without a matching boundary get a deterministic
//! placeholder point so they still show up on the map.

pub mod bind;
pub mod boundary;

pub use bind::{BoundRecord, bind, placeholder_point};
pub use boundary::{AdministrativeUnit, BoundaryDataset};

use thiserror::Error;

/// Errors that can occur while reading boundary data.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A unit's geometry is not valid `GeoJSON`.
    #[error("Invalid geometry for '{name}': {message}")]
    InvalidGeometry {
        /// Unit name.
        name: String,
        /// Description of what went wrong.
        message: String,
    },
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compile-time registry of CCVI indicators and provinces.
//!
//! Indicator definitions live in TOML files under `indicators/`, one file
//! per parent category, and are embedded at compile time. Each definition
//! names the upstream endpoint, the static query parameters that select
//! the indicator on shared endpoints, and the candidate fields that carry
//! its value in upstream responses.

pub mod registry;

pub use registry::{IndicatorNode, IndicatorRegistry, provinces};

use thiserror::Error;

/// Errors that can occur while loading the embedded registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An embedded TOML file failed to parse.
    #[error("Failed to parse registry file '{name}': {source}")]
    Parse {
        /// Name of the embedded file.
        name: &'static str,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Two definitions share the same id.
    #[error("Duplicate indicator id: {id}")]
    DuplicateId {
        /// The duplicated id.
        id: String,
    },
}

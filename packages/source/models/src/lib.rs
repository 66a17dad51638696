#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record and request types for the upstream CCVI source pipeline.
//!
//! Upstream responses are parsed into [`RawRecord`]s, whose shape is not
//! contractually fixed, and then normalized into [`NormalizedRecord`]s,
//! one per geographic unit, with a value bounded to `[0, 1]`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque JSON object received from the upstream API.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Identifier of a geographic unit. Upstream ids are numeric on some
/// endpoints and textual on others.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric id.
    Int(i64),
    /// Textual id.
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A geographic unit with its extracted indicator value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Unit id (upstream id, or the record's ordinal when absent).
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Name of the administrative region used to join the boundary
    /// dataset.
    pub region_name: String,
    /// Province name, or `"Unknown"`.
    pub province: String,
    /// Indicator value clamped to `[0, 1]`. Equals the no-data sentinel
    /// when `has_data` is `false`.
    pub value: f64,
    /// Whether the upstream record carried a usable value.
    pub has_data: bool,
    /// Enclosing district, when the upstream response provides one.
    pub district_context: Option<String>,
}

/// A fully resolved upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// Endpoint URL without query string.
    pub url: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
}

/// A year option returned by the upstream `location/years` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearOption {
    /// Upstream id.
    pub id: i64,
    /// Year value as sent back in the `year` parameter.
    pub value: String,
    /// Display label.
    pub label: String,
}

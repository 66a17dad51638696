#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the CCVI map server.
//!
//! These types are serialized to JSON for the REST API. Stored rows
//! ([`ClimateIndicator`], [`VulnerabilityRecord`]) double as their API
//! form since the storage layer is in-memory.

use ccvi_map_indicator_models::{AreaClassification, BoundaryLevel, FilterState};
use ccvi_map_render::Legend;
use ccvi_map_render::feature::Popup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    pub healthy: bool,
    pub version: String,
}

/// A climate indicator as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateIndicator {
    pub id: i64,
    pub name: String,
    /// Free-form grouping (e.g. `"exposure"`).
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A stored vulnerability score for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    pub id: i64,
    /// State or province the area belongs to.
    pub state: String,
    /// County, district, or tehsil name.
    pub county: Option<String>,
    /// [`ClimateIndicator::id`] this score is for.
    pub indicator_id: Option<i64>,
    pub score: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Query parameters for `GET /api/vulnerability-data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VulnerabilityQueryParams {
    pub state: Option<String>,
    /// Indicator id.
    pub indicator: Option<String>,
}

/// Filters applied to stored vulnerability data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityFilter {
    pub state: Option<String>,
    pub indicator_id: Option<i64>,
}

/// Export file format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// `POST /api/export-data` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub filters: VulnerabilityFilter,
}

/// A generated export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub format: ExportFormat,
    pub record_count: usize,
    /// CSV text for [`ExportFormat::Csv`], an array of records for
    /// [`ExportFormat::Json`].
    pub content: serde_json::Value,
}

/// `POST /api/export-data` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<ExportData>,
    pub message: String,
}

/// Query parameters for `GET /api/map` and `GET /api/legend`.
///
/// Every parameter is optional; missing ones take the dashboard defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    pub indicator: Option<String>,
    pub boundary: Option<BoundaryLevel>,
    pub province: Option<u32>,
    pub year: Option<i32>,
    pub area_classification: Option<AreaClassification>,
}

impl MapQueryParams {
    /// Fills unset parameters from [`FilterState::default`].
    #[must_use]
    pub fn to_filters(&self) -> FilterState {
        let defaults = FilterState::default();
        FilterState {
            indicator_id: self.indicator.clone().unwrap_or(defaults.indicator_id),
            boundary_level: self.boundary.unwrap_or(defaults.boundary_level),
            region_id: self.province.or(defaults.region_id),
            year: self.year.unwrap_or(defaults.year),
            area_classification: self
                .area_classification
                .unwrap_or(defaults.area_classification),
        }
    }
}

/// Connection status badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    /// `connecting`, `loading`, `connected`, or `error`.
    pub state: String,
    pub label: String,
    pub color: String,
}

/// `GET /api/map` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapResponse {
    pub features: geojson::FeatureCollection,
    pub legend: Legend,
    pub status: ApiStatus,
    /// Upstream URL the values came from.
    pub source_url: String,
    /// Number of features drawn at a placeholder position.
    pub placeholders: usize,
    /// Popup contents keyed like the features.
    pub popups: Vec<Popup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_params_default_to_dashboard_filters() {
        assert_eq!(MapQueryParams::default().to_filters(), FilterState::default());
    }

    #[test]
    fn map_params_override_defaults() {
        let params: MapQueryParams = serde_json::from_value(serde_json::json!({
            "indicator": "exposure",
            "boundary": "tehsils",
            "province": 2,
            "areaClassification": "urban",
        }))
        .unwrap();
        let filters = params.to_filters();
        assert_eq!(filters.indicator_id, "exposure");
        assert_eq!(filters.boundary_level, BoundaryLevel::Tehsils);
        assert_eq!(filters.region_id, Some(2));
        assert_eq!(filters.area_classification, AreaClassification::Urban);
    }

    #[test]
    fn export_request_defaults_to_csv_without_filters() {
        let request: ExportRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.format, ExportFormat::Csv);
        assert_eq!(request.filters, VulnerabilityFilter::default());
    }
}

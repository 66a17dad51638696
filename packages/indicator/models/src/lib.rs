#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Indicator taxonomy, filter state, and registry schema types.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! CCVI map workspace: which indicators exist and how they group under
//! the four composite CCVI components, which boundary levels and area
//! classifications a user can select, and the [`FilterState`] tuple that
//! identifies a single map layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The four composite components of the Climate Change Vulnerability
/// Index. Sub-indicators are grouped under one of the latter three.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IndicatorCategory {
    /// Overall climate vulnerability (the composite index itself).
    Vulnerability,
    /// Ability of people and systems to adjust to climate damage.
    AdaptiveCapacity,
    /// Degree to which a system is affected by climate stimuli.
    Sensitivity,
    /// Presence of people and resources in places that could be affected.
    Exposure,
}

impl IndicatorCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Vulnerability,
            Self::AdaptiveCapacity,
            Self::Sensitivity,
            Self::Exposure,
        ]
    }

    /// Indicator id of the composite indicator for this category.
    #[must_use]
    pub const fn indicator_id(self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerability",
            Self::AdaptiveCapacity => "adaptive-capacity",
            Self::Sensitivity => "sensitivity",
            Self::Exposure => "exposure",
        }
    }
}

/// Granularity of the administrative geography displayed on the map.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BoundaryLevel {
    /// Districts (the primary level).
    #[default]
    Districts,
    /// Tehsils (sub-district, the secondary level).
    Tehsils,
}

impl BoundaryLevel {
    /// Value sent as the upstream `area_type` query parameter.
    #[must_use]
    pub const fn area_type(self) -> &'static str {
        match self {
            Self::Districts => "district",
            Self::Tehsils => "tehsil",
        }
    }

    /// Parses an upstream `area_type` value back into a boundary level.
    #[must_use]
    pub fn from_area_type(value: &str) -> Option<Self> {
        match value {
            "district" => Some(Self::Districts),
            "tehsil" => Some(Self::Tehsils),
            _ => None,
        }
    }

    /// Value sent as the `level` parameter of the administrative-units
    /// endpoint.
    #[must_use]
    pub const fn unit_level(self) -> &'static str {
        self.area_type()
    }
}

/// Rural/urban filter applied upstream before records are returned.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AreaClassification {
    /// No filtering.
    #[default]
    All,
    /// Rural areas only.
    Rural,
    /// Urban areas only.
    Urban,
}

impl AreaClassification {
    /// Value of the `area_classification` query parameter, or `None` when
    /// the parameter must be omitted entirely.
    #[must_use]
    pub const fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Rural => Some("rural"),
            Self::Urban => Some("urban"),
        }
    }

    /// Human-readable label used in legend summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Areas",
            Self::Rural => "Rural",
            Self::Urban => "Urban",
        }
    }
}

/// Public description of a single indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDescriptor {
    /// Stable identifier (e.g. `"avg-precipitation"`).
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Longer description.
    pub description: String,
    /// Composite component this indicator belongs to, if it is a leaf.
    pub parent_category: Option<IndicatorCategory>,
}

/// An indicator definition as declared in the embedded registry TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    /// Stable identifier (e.g. `"avg-precipitation"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Upstream endpoint path relative to the API base URL
    /// (e.g. `"climate/climate/statistics"`).
    pub endpoint: String,
    /// Indicator-specific query parameters appended after the filter
    /// parameters (e.g. `metric = "precipitation"`).
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Ordered candidate field names holding this indicator's value.
    #[serde(default)]
    pub value_fields: Vec<String>,
    /// Filled from the enclosing [`IndicatorGroup`] when loaded.
    #[serde(default)]
    pub parent_category: Option<IndicatorCategory>,
}

impl IndicatorDefinition {
    /// Returns the public descriptor for this definition.
    #[must_use]
    pub fn descriptor(&self) -> IndicatorDescriptor {
        IndicatorDescriptor {
            id: self.id.clone(),
            display_name: self.name.clone(),
            description: self.description.clone(),
            parent_category: self.parent_category,
        }
    }
}

/// A registry TOML file: a list of indicators sharing a parent category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorGroup {
    /// Parent category of every indicator in this file. Absent for the
    /// composite indicators themselves.
    pub category: Option<IndicatorCategory>,
    /// Indicators declared in this file.
    pub indicators: Vec<IndicatorDefinition>,
}

/// A Pakistani province or territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    /// Upstream province id, used as the `province` query parameter.
    pub id: u32,
    /// Province name.
    pub name: String,
    /// Two-letter province code.
    pub code: String,
}

/// The complete set of user selections that identifies one map layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Selected indicator id.
    pub indicator_id: String,
    /// Selected boundary level.
    pub boundary_level: BoundaryLevel,
    /// Selected province id, if any.
    pub region_id: Option<u32>,
    /// Selected year.
    pub year: i32,
    /// Selected area classification.
    pub area_classification: AreaClassification,
}

/// Year selected when the dashboard first opens.
pub const DEFAULT_YEAR: i32 = 2023;

impl Default for FilterState {
    fn default() -> Self {
        Self {
            indicator_id: IndicatorCategory::Vulnerability.indicator_id().to_string(),
            boundary_level: BoundaryLevel::default(),
            region_id: None,
            year: DEFAULT_YEAR,
            area_classification: AreaClassification::default(),
        }
    }
}

impl FilterState {
    /// Canonical serialization of the filter tuple, used as the memoization
    /// key for indicator payloads.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.indicator_id,
            self.boundary_level,
            self.region_id.map_or_else(String::new, |id| id.to_string()),
            self.year,
            self.area_classification,
        )
    }

    /// Memoization key for the boundary dataset, which only depends on the
    /// boundary level and province.
    #[must_use]
    pub fn boundary_cache_key(&self) -> String {
        format!(
            "{}|{}",
            self.boundary_level,
            self.region_id.map_or_else(String::new, |id| id.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_level_round_trips_through_area_type() {
        for level in [BoundaryLevel::Districts, BoundaryLevel::Tehsils] {
            assert_eq!(BoundaryLevel::from_area_type(level.area_type()), Some(level));
        }
        assert_eq!(BoundaryLevel::from_area_type("province"), None);
    }

    #[test]
    fn boundary_level_parses_ui_names() {
        assert_eq!("tehsils".parse::<BoundaryLevel>().unwrap(), BoundaryLevel::Tehsils);
        assert_eq!(BoundaryLevel::Districts.to_string(), "districts");
    }

    #[test]
    fn all_classification_has_no_query_value() {
        assert_eq!(AreaClassification::All.query_value(), None);
        assert_eq!(AreaClassification::Rural.query_value(), Some("rural"));
        assert_eq!(AreaClassification::Urban.query_value(), Some("urban"));
    }

    #[test]
    fn category_serializes_kebab_case() {
        assert_eq!(IndicatorCategory::AdaptiveCapacity.to_string(), "adaptive-capacity");
        assert_eq!(
            "adaptive-capacity".parse::<IndicatorCategory>().unwrap(),
            IndicatorCategory::AdaptiveCapacity
        );
    }

    #[test]
    fn cache_key_distinguishes_every_field() {
        let base = FilterState::default();
        let variants = [
            FilterState {
                indicator_id: "exposure".to_string(),
                ..base.clone()
            },
            FilterState {
                boundary_level: BoundaryLevel::Tehsils,
                ..base.clone()
            },
            FilterState {
                region_id: Some(2),
                ..base.clone()
            },
            FilterState {
                year: 2022,
                ..base.clone()
            },
            FilterState {
                area_classification: AreaClassification::Urban,
                ..base.clone()
            },
        ];
        for variant in &variants {
            assert_ne!(variant.cache_key(), base.cache_key());
        }
    }

    #[test]
    fn boundary_cache_key_ignores_indicator_and_year() {
        let a = FilterState::default();
        let b = FilterState {
            indicator_id: "livestock".to_string(),
            year: 2019,
            ..FilterState::default()
        };
        assert_eq!(a.boundary_cache_key(), b.boundary_cache_key());
    }
}

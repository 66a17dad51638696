//! Keyed visual features and their `GeoJSON` form.

use std::collections::BTreeSet;

use ccvi_map_geography::BoundRecord;
use ccvi_map_geography_models::LngLat;
use ccvi_map_source_models::NormalizedRecord;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{RenderError, encode::Style};

/// A record ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualFeature {
    /// Unique within a feature set. Derived from the record id.
    pub key: String,
    pub geometry: geojson::Geometry,
    pub anchor: LngLat,
    pub placeholder: bool,
    pub properties: NormalizedRecord,
    pub style: Style,
}

impl VisualFeature {
    /// Converts into a `GeoJSON` feature whose properties carry the record
    /// fields plus the style.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Json`] if the properties fail to serialize.
    pub fn to_geojson(&self) -> Result<geojson::Feature, RenderError> {
        let mut properties = match serde_json::to_value(&self.properties)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        properties.insert("key".to_string(), Value::String(self.key.clone()));
        properties.insert("placeholder".to_string(), Value::Bool(self.placeholder));
        properties.insert("style".to_string(), serde_json::to_value(self.style)?);

        Ok(geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: Some(geojson::feature::Id::String(self.key.clone())),
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Encodes bound records. Keys are the record ids; repeated ids get a
/// `-2`, `-3`, ... suffix so every key in the result is unique.
#[must_use]
pub fn encode_features(bound: &[BoundRecord]) -> Vec<VisualFeature> {
    let mut seen = BTreeSet::new();
    bound
        .iter()
        .map(|b| {
            let base = b.record.id.to_string();
            let mut key = base.clone();
            let mut n = 1;
            while !seen.insert(key.clone()) {
                n += 1;
                key = format!("{base}-{n}");
            }
            VisualFeature {
                key,
                geometry: b.geometry.clone(),
                anchor: b.anchor,
                placeholder: b.placeholder,
                style: Style::of(b.record.value, b.record.has_data),
                properties: b.record.clone(),
            }
        })
        .collect()
}

/// Collects features into a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if any feature fails to serialize.
pub fn feature_collection(features: &[VisualFeature]) -> Result<geojson::FeatureCollection, RenderError> {
    Ok(geojson::FeatureCollection {
        bbox: None,
        features: features
            .iter()
            .map(VisualFeature::to_geojson)
            .collect::<Result<_, _>>()?,
        foreign_members: None,
    })
}

/// Contents of the popup shown for a selected feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub key: String,
    pub anchor: LngLat,
    pub title: String,
    pub lines: Vec<String>,
}

impl Popup {
    #[must_use]
    pub fn for_feature(feature: &VisualFeature, indicator_name: &str) -> Self {
        let record = &feature.properties;
        let value = if record.has_data {
            format!("{:.3}", record.value)
        } else {
            crate::encode::NO_DATA_LABEL.to_string()
        };
        Self {
            key: feature.key.clone(),
            anchor: feature.anchor,
            title: record.name.clone(),
            lines: vec![
                format!(
                    "District: {}",
                    record.district_context.as_deref().unwrap_or("Unknown")
                ),
                format!("Province: {}", record.province),
                format!("{indicator_name}: {value}"),
            ],
        }
    }
}

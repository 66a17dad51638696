//! Response envelope normalization.
//!
//! The CCVI endpoint families disagree on envelope structure. Responses
//! are classified into a [`ResponseShape`] and flattened into an ordered
//! list of [`RawRecord`]s. Shapes are tried in priority order:
//!
//! 1. a bare JSON array;
//! 2. an object with a `data` array;
//! 3. an object with a `results` array;
//! 4. an object holding a per-region map (e.g. `tehsil_vulnerability`),
//!    keyed by region name and valued by an object of named metrics.
//!
//! Anything else is logged and treated as an empty result.
//!
//! Per-region maps come out sorted by region name, not in response order,
//! because `serde_json::Map` is ordered by key.

use ccvi_map_source_models::RawRecord;
use serde_json::Value;

/// Suffix preferred when several fields look like per-region maps.
const REGION_MAP_SUFFIX: &str = "_vulnerability";

/// Field that receives the region key when a per-region map is flattened.
const REGION_NAME_FIELD: &str = "name";

/// Parent fields copied onto each flattened region. Ids and metrics stay
/// with the parent.
const REGION_CONTEXT_FIELDS: &[&str] = &["district", "district_name", "province", "province_name"];

/// The recognized envelope of an upstream response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseShape<'a> {
    /// The response is itself an array of records.
    BareArray(&'a [Value]),
    /// Records are in the `data` field.
    DataEnvelope(&'a [Value]),
    /// Records are in the `results` field.
    ResultsEnvelope(&'a [Value]),
    /// Records are the entries of a per-region map under `key`; the
    /// administrative context fields of `parent` are copied onto every
    /// record.
    RegionMap {
        /// Field holding the per-region map.
        key: &'a str,
        /// The enclosing response object.
        parent: &'a serde_json::Map<String, Value>,
    },
    /// None of the above.
    Unrecognized,
}

impl<'a> ResponseShape<'a> {
    /// Classifies a response body.
    #[must_use]
    pub fn classify(response: &'a Value) -> Self {
        let object = match response {
            Value::Array(items) => return Self::BareArray(items),
            Value::Object(object) => object,
            _ => return Self::Unrecognized,
        };

        if let Some(Value::Array(items)) = object.get("data") {
            return Self::DataEnvelope(items);
        }
        if let Some(Value::Array(items)) = object.get("results") {
            return Self::ResultsEnvelope(items);
        }

        let mut candidates = object
            .iter()
            .filter(|(_, value)| is_region_map(value))
            .map(|(key, _)| key.as_str());
        let first = candidates.next();
        let preferred = first
            .filter(|key| key.ends_with(REGION_MAP_SUFFIX))
            .or_else(|| candidates.find(|key| key.ends_with(REGION_MAP_SUFFIX)))
            .or(first);

        preferred.map_or(Self::Unrecognized, |key| Self::RegionMap {
            key,
            parent: object,
        })
    }

    /// Short name used in log messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BareArray(_) => "bare array",
            Self::DataEnvelope(_) => "data envelope",
            Self::ResultsEnvelope(_) => "results envelope",
            Self::RegionMap { .. } => "region map",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Flattens the shape into records. Non-object array elements are
    /// skipped.
    #[must_use]
    pub fn records(self) -> Vec<RawRecord> {
        match self {
            Self::BareArray(items) | Self::DataEnvelope(items) | Self::ResultsEnvelope(items) => {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            }
            Self::RegionMap { key, parent } => flatten_region_map(key, parent),
            Self::Unrecognized => Vec::new(),
        }
    }
}

/// Normalizes any upstream response into an ordered record list.
///
/// Unrecognized shapes yield an empty list and a warning; they are never
/// an error.
#[must_use]
pub fn normalize(response: &Value) -> Vec<RawRecord> {
    let shape = ResponseShape::classify(response);
    if shape == ResponseShape::Unrecognized {
        log::warn!("Unexpected response structure: {}", preview(response));
        return Vec::new();
    }
    let records = shape.records();
    log::debug!("Normalized {} records from {}", records.len(), shape.name());
    records
}

/// A per-region map is a non-empty object whose values are all objects.
fn is_region_map(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| !map.is_empty() && map.values().all(Value::is_object))
}

fn flatten_region_map(key: &str, parent: &serde_json::Map<String, Value>) -> Vec<RawRecord> {
    let Some(Value::Object(regions)) = parent.get(key) else {
        return Vec::new();
    };

    let context: Vec<(&str, &Value)> = REGION_CONTEXT_FIELDS
        .iter()
        .filter_map(|&field| Some((field, parent.get(field).filter(|v| is_scalar(v))?)))
        .collect();

    regions
        .iter()
        .filter_map(|(region_name, metrics)| {
            let mut record = metrics.as_object()?.clone();
            for &(field, value) in &context {
                if !record.contains_key(field) {
                    record.insert(field.to_string(), value.clone());
                }
            }
            record.insert(
                REGION_NAME_FIELD.to_string(),
                Value::String(region_name.clone()),
            );
            Some(record)
        })
        .collect()
}

const fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn preview(value: &Value) -> String {
    const PREVIEW_LEN: usize = 200;
    let text = value.to_string();
    if text.len() > PREVIEW_LEN {
        format!("{}...", text.chars().take(PREVIEW_LEN).collect::<String>())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn names(records: &[RawRecord]) -> Vec<&str> {
        records
            .iter()
            .filter_map(|r| r.get("name").and_then(Value::as_str))
            .collect()
    }

    #[test]
    fn classifies_in_priority_order() {
        let bare = json!([{"name": "A"}]);
        assert!(matches!(ResponseShape::classify(&bare), ResponseShape::BareArray(_)));

        let both = json!({"data": [{"name": "A"}], "results": [{"name": "B"}]});
        assert!(matches!(ResponseShape::classify(&both), ResponseShape::DataEnvelope(_)));

        let results = json!({"results": [{"name": "B"}], "count": 1});
        assert!(matches!(
            ResponseShape::classify(&results),
            ResponseShape::ResultsEnvelope(_)
        ));

        let nested = json!({"district": "Thar", "tehsil_vulnerability": {"A": {"x": 1}}});
        assert!(matches!(
            ResponseShape::classify(&nested),
            ResponseShape::RegionMap { key: "tehsil_vulnerability", .. }
        ));
    }

    #[test]
    fn data_field_that_is_not_an_array_falls_through() {
        let response = json!({"data": {"A": {"value": 0.1}}});
        assert!(matches!(
            ResponseShape::classify(&response),
            ResponseShape::RegionMap { key: "data", .. }
        ));
    }

    #[test]
    fn prefers_vulnerability_suffix_among_region_maps() {
        let response = json!({
            "aggregates": {"mean": {"x": 1}},
            "tehsil_vulnerability": {"A": {"x": 1}},
        });
        assert!(matches!(
            ResponseShape::classify(&response),
            ResponseShape::RegionMap { key: "tehsil_vulnerability", .. }
        ));
    }

    #[test]
    fn flattens_region_map_with_parent_context() {
        let response = json!({
            "district": "Tharparkar",
            "year": 2023,
            "tehsil_vulnerability": {
                "Diplo": {"Vulnerability Index": 0.42},
                "Mithi": {"Vulnerability Index": 0.9, "district": "Override"},
            },
        });
        let records = normalize(&response);

        assert_eq!(names(&records), vec!["Diplo", "Mithi"]);
        assert_eq!(records[0].get("district"), Some(&json!("Tharparkar")));
        assert_eq!(records[0].get("year"), None);
        assert_eq!(records[1].get("district"), Some(&json!("Override")));
        assert!(records.iter().all(|r| !r.contains_key("tehsil_vulnerability")));
    }

    #[test]
    fn region_map_comes_out_sorted_by_name() {
        let response = json!({
            "tehsil_vulnerability": {
                "Nagarparkar": {"Vulnerability Index": 0.3},
                "Chachro": {"Vulnerability Index": 0.5},
                "Mithi": {"Vulnerability Index": 0.9},
            },
        });

        assert_eq!(names(&normalize(&response)), vec!["Chachro", "Mithi", "Nagarparkar"]);
    }

    #[test]
    fn region_map_leaves_parent_ids_and_metrics_behind() {
        let response = json!({
            "id": 12,
            "district_id": 7,
            "district": "Tharparkar",
            "province_name": "Sindh",
            "value": 0.7,
            "tehsil_vulnerability": {
                "Diplo": {"Vulnerability Index": null},
                "Mithi": {"Vulnerability Index": 0.9},
            },
        });
        let records = normalize(&response);

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(!record.contains_key("id"));
            assert!(!record.contains_key("district_id"));
            assert!(!record.contains_key("value"));
            assert_eq!(record.get("district"), Some(&json!("Tharparkar")));
            assert_eq!(record.get("province_name"), Some(&json!("Sindh")));
        }
    }

    #[test]
    fn skips_non_object_elements() {
        let response = json!([{"name": "A"}, 3, null, {"name": "B"}]);
        assert_eq!(names(&normalize(&response)), vec!["A", "B"]);
    }

    #[test]
    fn unrecognized_shapes_are_empty() {
        for response in [
            json!(null),
            json!("error"),
            json!({"message": "not found"}),
            json!({"empty": {}}),
        ] {
            assert!(normalize(&response).is_empty(), "{response}");
        }
    }
}

//! Value extraction and record normalization.
//!
//! Upstream records name their magnitude differently per endpoint family
//! (`vulnerability_index`, `"Vulnerability Index"`, `value`, ...). The
//! indicator registry lists the candidates for each indicator; the first
//! present, finite, numeric candidate wins and is clamped to `[0, 1]`.
//!
//! Absent values are reported as [`Extracted::NoData`] rather than
//! replaced by a synthetic number.

use ccvi_map_indicator_models::{BoundaryLevel, IndicatorDefinition};
use ccvi_map_source_models::{NormalizedRecord, RawRecord, RecordId};
use serde_json::Value;

use crate::normalize;

/// Magnitude used for records without data. Always paired with
/// `has_data = false`.
pub const NO_DATA_SENTINEL: f64 = 0.0;

/// Field consulted after the indicator's own candidates.
const GENERIC_VALUE_FIELD: &str = "value";

const ID_FIELDS: &[&str] = &["id", "district_id", "tehsil_id"];
const NAME_FIELDS: &[&str] = &[
    "name",
    "district_name",
    "tehsil_name",
    "area_name",
    "tehsil",
    "district",
];
const DISTRICT_REGION_FIELDS: &[&str] = &["district_name", "district", "name", "area_name"];
const TEHSIL_REGION_FIELDS: &[&str] = &["tehsil_name", "tehsil", "name", "area_name"];
const PROVINCE_FIELDS: &[&str] = &["province_name", "province"];
const DISTRICT_CONTEXT_FIELDS: &[&str] = &["district", "district_name"];

const UNKNOWN_PROVINCE: &str = "Unknown";

/// Outcome of extracting an indicator value from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extracted {
    /// A finite value clamped to `[0, 1]`.
    Value(f64),
    /// No candidate field carried a usable number.
    NoData,
}

impl Extracted {
    /// The magnitude to encode; [`NO_DATA_SENTINEL`] for `NoData`.
    #[must_use]
    pub const fn magnitude(self) -> f64 {
        match self {
            Self::Value(value) => value,
            Self::NoData => NO_DATA_SENTINEL,
        }
    }

    #[must_use]
    pub const fn has_data(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Coerces a JSON number or numeric string to a finite `f64`.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Extracts the indicator magnitude from `record`.
#[must_use]
pub fn extract_value(record: &RawRecord, definition: &IndicatorDefinition) -> Extracted {
    definition
        .value_fields
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(GENERIC_VALUE_FIELD))
        .find_map(|field| record.get(field).and_then(coerce_number))
        .map_or(Extracted::NoData, |value| Extracted::Value(value.clamp(0.0, 1.0)))
}

/// Builds the normalized view of a single record. `ordinal` is the
/// record's 0-based position and backs the id and name fallbacks.
#[must_use]
pub fn normalize_record(
    record: &RawRecord,
    ordinal: usize,
    definition: &IndicatorDefinition,
    boundary: BoundaryLevel,
) -> NormalizedRecord {
    let id = first_id(record)
        .unwrap_or_else(|| RecordId::Int(i64::try_from(ordinal).unwrap_or(i64::MAX)));
    let name = first_text(record, NAME_FIELDS).unwrap_or_else(|| format!("Area {}", ordinal + 1));
    let region_fields = match boundary {
        BoundaryLevel::Districts => DISTRICT_REGION_FIELDS,
        BoundaryLevel::Tehsils => TEHSIL_REGION_FIELDS,
    };
    let region_name = first_text(record, region_fields).unwrap_or_else(|| name.clone());
    let province =
        first_text(record, PROVINCE_FIELDS).unwrap_or_else(|| UNKNOWN_PROVINCE.to_string());
    let extracted = extract_value(record, definition);

    NormalizedRecord {
        id,
        name,
        region_name,
        province,
        value: extracted.magnitude(),
        has_data: extracted.has_data(),
        district_context: first_text(record, DISTRICT_CONTEXT_FIELDS),
    }
}

/// Normalizes records in order. Ids fall back to the 0-based position,
/// names to the 1-based `Area {n}`.
#[must_use]
pub fn normalize_records(
    records: &[RawRecord],
    definition: &IndicatorDefinition,
    boundary: BoundaryLevel,
) -> Vec<NormalizedRecord> {
    let normalized: Vec<_> = records
        .iter()
        .enumerate()
        .map(|(ordinal, record)| normalize_record(record, ordinal, definition, boundary))
        .collect();

    let missing = normalized.iter().filter(|r| !r.has_data).count();
    if missing > 0 {
        log::debug!(
            "{missing}/{} records for '{}' have no value",
            normalized.len(),
            definition.id
        );
    }
    normalized
}

/// Normalizes an upstream response body straight into records.
#[must_use]
pub fn normalize_response(
    response: &Value,
    definition: &IndicatorDefinition,
    boundary: BoundaryLevel,
) -> Vec<NormalizedRecord> {
    normalize_records(&normalize::normalize(response), definition, boundary)
}

fn first_id(record: &RawRecord) -> Option<RecordId> {
    ID_FIELDS.iter().find_map(|field| match record.get(*field)? {
        Value::Number(n) => n.as_i64().map(RecordId::Int),
        Value::String(s) if !s.trim().is_empty() => Some(RecordId::Text(s.trim().to_string())),
        _ => None,
    })
}

fn first_text(record: &RawRecord, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use ccvi_map_indicator::IndicatorRegistry;
    use serde_json::json;

    use super::*;

    fn definition(id: &str) -> IndicatorDefinition {
        IndicatorRegistry::load().unwrap().get(id).unwrap().clone()
    }

    fn record(value: Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn extracts_and_clamps() {
        let def = definition("vulnerability");
        let cases = [
            (json!({"value": 0}), Extracted::Value(0.0)),
            (json!({"value": 1}), Extracted::Value(1.0)),
            (json!({"value": "0.35"}), Extracted::Value(0.35)),
            (json!({"value": 1.7}), Extracted::Value(1.0)),
            (json!({"value": -0.2}), Extracted::Value(0.0)),
            (json!({"value": null}), Extracted::NoData),
            (json!({"value": "n/a"}), Extracted::NoData),
            (json!({"other": 0.5}), Extracted::NoData),
        ];
        for (input, expected) in cases {
            assert_eq!(extract_value(&record(input.clone()), &def), expected, "{input}");
        }
    }

    #[test]
    fn magnitude_is_always_bounded() {
        for extracted in [Extracted::Value(0.0), Extracted::Value(1.0), Extracted::NoData] {
            let m = extracted.magnitude();
            assert!((0.0..=1.0).contains(&m));
        }
        assert!((Extracted::NoData.magnitude() - NO_DATA_SENTINEL).abs() < f64::EPSILON);
        assert!(!Extracted::NoData.has_data());
    }

    #[test]
    fn indicator_fields_take_precedence_over_generic_value() {
        let def = definition("vulnerability");
        let rec = record(json!({"vulnerability_index": 0.6, "value": 0.1}));
        assert_eq!(extract_value(&rec, &def), Extracted::Value(0.6));

        let rec = record(json!({"vulnerability_index": null, "value": 0.1}));
        assert_eq!(extract_value(&rec, &def), Extracted::Value(0.1));
    }

    #[test]
    fn rejects_non_finite_strings() {
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!(" 0.25 ")), Some(0.25));
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn tehsil_vulnerability_scenario() {
        let response = json!({
            "district": "Tharparkar",
            "tehsil_vulnerability": {
                "A": {"Vulnerability Index": 0.42},
                "B": {"Vulnerability Index": 0.9},
            },
        });
        let records =
            normalize_response(&response, &definition("vulnerability"), BoundaryLevel::Tehsils);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "A");
        assert_eq!(records[0].region_name, "A");
        assert!((records[0].value - 0.42).abs() < f64::EPSILON);
        assert_eq!(records[1].name, "B");
        assert!((records[1].value - 0.9).abs() < f64::EPSILON);
        assert!(records.iter().all(|r| r.has_data));
        assert!(
            records
                .iter()
                .all(|r| r.district_context.as_deref() == Some("Tharparkar"))
        );
    }

    #[test]
    fn tehsil_without_metric_does_not_inherit_district_value() {
        let response = json!({
            "id": 12,
            "district": "Tharparkar",
            "value": 0.7,
            "tehsil_vulnerability": {
                "Diplo": {"Vulnerability Index": null},
                "Mithi": {"Vulnerability Index": 0.9},
            },
        });
        let records =
            normalize_response(&response, &definition("vulnerability"), BoundaryLevel::Tehsils);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Diplo");
        assert!(!records[0].has_data);
        assert!(records[0].value.abs() < f64::EPSILON);
        assert_eq!(records[1].name, "Mithi");
        assert!(records[1].has_data);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn four_shapes_normalize_identically() {
        let rows = json!([
            {"name": "Lahore", "province": "Punjab", "value": 0.3},
            {"name": "Quetta", "province": "Balochistan", "value": 0.7},
        ]);
        let def = definition("exposure");
        let expected = normalize_response(&rows, &def, BoundaryLevel::Districts);

        let data = json!({"data": rows});
        let results = json!({"results": rows, "count": 2});
        let region_map = json!({
            "province_vulnerability": {
                "Lahore": {"province": "Punjab", "value": 0.3},
                "Quetta": {"province": "Balochistan", "value": 0.7},
            },
        });

        for response in [data, results, region_map] {
            assert_eq!(
                normalize_response(&response, &def, BoundaryLevel::Districts),
                expected,
                "{response}"
            );
        }
    }

    #[test]
    fn missing_fields_fall_back() {
        let rec = record(json!({"value": 0.5}));
        let normalized =
            normalize_record(&rec, 4, &definition("vulnerability"), BoundaryLevel::Districts);
        assert_eq!(normalized.id, RecordId::Int(4));
        assert_eq!(normalized.name, "Area 5");
        assert_eq!(normalized.region_name, "Area 5");
        assert_eq!(normalized.province, "Unknown");
        assert_eq!(normalized.district_context, None);
    }

    #[test]
    fn region_name_follows_boundary_level() {
        let rec = record(json!({
            "tehsil_id": 31,
            "tehsil_name": "Mithi",
            "district_name": "Tharparkar",
            "province_name": "Sindh",
            "value": 0.8,
        }));
        let def = definition("vulnerability");

        let tehsil = normalize_record(&rec, 0, &def, BoundaryLevel::Tehsils);
        assert_eq!(tehsil.id, RecordId::Int(31));
        assert_eq!(tehsil.name, "Mithi");
        assert_eq!(tehsil.region_name, "Mithi");
        assert_eq!(tehsil.province, "Sindh");

        let district = normalize_record(&rec, 0, &def, BoundaryLevel::Districts);
        assert_eq!(district.region_name, "Tharparkar");
    }
}

//! Administrative-unit boundary datasets.
//!
//! The endpoint has been seen to wrap units as `{units: [...]}`,
//! `{data: [...]}` or a bare array, and to ship each geometry either inline
//! or as a stringified `GeoJSON` document. Units whose geometry does not
//! parse are dropped with a warning.

use std::collections::BTreeMap;

use ccvi_map_geography_models::LngLat;
use geo::Centroid;
use serde_json::Value;

use crate::GeographyError;

/// A named administrative unit with its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct AdministrativeUnit {
    /// Upstream id, if numeric.
    pub id: Option<i64>,
    /// Unit name as published upstream.
    pub name: String,
    /// Boundary geometry.
    pub geometry: geojson::Geometry,
    /// Centroid of the geometry, used to anchor popups.
    pub anchor: LngLat,
}

/// The set of boundaries for one boundary level, indexed by join key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryDataset {
    units: Vec<AdministrativeUnit>,
    by_key: BTreeMap<String, usize>,
}

impl BoundaryDataset {
    /// Builds a dataset from already parsed units. When two units share a
    /// join key the first one wins.
    #[must_use]
    pub fn new(units: Vec<AdministrativeUnit>) -> Self {
        let mut by_key = BTreeMap::new();
        for (i, unit) in units.iter().enumerate() {
            by_key.entry(join_key(&unit.name)).or_insert(i);
        }
        Self { units, by_key }
    }

    /// Parses an upstream `administrative-units` payload.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(object) => ["units", "data"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_array))
                .map_or(&[][..], Vec::as_slice),
            _ => &[],
        };

        let units: Vec<_> = items
            .iter()
            .filter_map(|item| match parse_unit(item) {
                Ok(unit) => unit,
                Err(e) => {
                    log::warn!("Dropping administrative unit: {e}");
                    None
                }
            })
            .collect();

        log::debug!("Parsed {} of {} administrative units", units.len(), items.len());
        Self::new(units)
    }

    /// Looks up a unit by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&AdministrativeUnit> {
        self.by_key.get(&join_key(name)).map(|&i| &self.units[i])
    }

    #[must_use]
    pub fn units(&self) -> &[AdministrativeUnit] {
        &self.units
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Normalized name used to join records to units.
#[must_use]
pub fn join_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parses one unit. Returns `Ok(None)` for entries that aren't units at
/// all (no name or no geometry).
fn parse_unit(item: &Value) -> Result<Option<AdministrativeUnit>, GeographyError> {
    let Some(object) = item.as_object() else {
        return Ok(None);
    };
    let Some(name) = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return Ok(None);
    };
    let Some(raw_geometry) = object.get("geometry").filter(|g| !g.is_null()) else {
        return Ok(None);
    };

    let geometry = parse_geometry(raw_geometry).map_err(|message| {
        GeographyError::InvalidGeometry {
            name: name.to_string(),
            message,
        }
    })?;
    let anchor = centroid(&geometry).ok_or_else(|| GeographyError::InvalidGeometry {
        name: name.to_string(),
        message: "geometry has no centroid".to_string(),
    })?;

    Ok(Some(AdministrativeUnit {
        id: object.get("id").and_then(Value::as_i64),
        name: name.to_string(),
        geometry,
        anchor,
    }))
}

fn parse_geometry(raw: &Value) -> Result<geojson::Geometry, String> {
    let inline = match raw {
        Value::String(text) => {
            serde_json::from_str::<Value>(text).map_err(|e| e.to_string())?
        }
        other => other.clone(),
    };
    geojson::Geometry::from_json_value(inline).map_err(|e| e.to_string())
}

/// Centroid of a `GeoJSON` geometry, or `None` for empty geometries.
#[must_use]
pub fn centroid(geometry: &geojson::Geometry) -> Option<LngLat> {
    let geometry: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    geometry.centroid().map(|p| LngLat::new(p.x(), p.y()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn square(x: f64, y: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]]],
        })
    }

    #[test]
    fn accepts_all_envelopes() {
        let units = json!([{"id": 1, "name": "Lahore", "geometry": square(74.0, 31.0)}]);
        for payload in [
            units.clone(),
            json!({"units": units.clone()}),
            json!({"data": units.clone()}),
        ] {
            let dataset = BoundaryDataset::from_json(&payload);
            assert_eq!(dataset.len(), 1, "{payload}");
            assert_eq!(dataset.units()[0].id, Some(1));
        }
        assert!(BoundaryDataset::from_json(&json!({"message": "nope"})).is_empty());
    }

    #[test]
    fn parses_stringified_geometry() {
        let payload = json!([{"name": "Quetta", "geometry": square(66.0, 30.0).to_string()}]);
        let dataset = BoundaryDataset::from_json(&payload);
        let unit = dataset.find("quetta").unwrap();
        assert!((unit.anchor.lng - 66.5).abs() < 1e-9);
        assert!((unit.anchor.lat - 30.5).abs() < 1e-9);
    }

    #[test]
    fn drops_invalid_geometries() {
        let payload = json!([
            {"name": "Broken", "geometry": "{not json"},
            {"name": "Wrong", "geometry": {"type": "Polygon"}},
            {"name": "Missing"},
            {"name": "Karachi", "geometry": square(67.0, 24.8)},
        ]);
        let dataset = BoundaryDataset::from_json(&payload);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.units()[0].name, "Karachi");
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let payload = json!([{"name": " Dera Ghazi Khan ", "geometry": square(70.0, 29.0)}]);
        let dataset = BoundaryDataset::from_json(&payload);
        assert!(dataset.find("dera ghazi khan").is_some());
        assert!(dataset.find("DERA GHAZI KHAN  ").is_some());
        assert!(dataset.find("Dera").is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let payload = json!([
            {"id": 1, "name": "Hyderabad", "geometry": square(68.0, 25.0)},
            {"id": 2, "name": "hyderabad", "geometry": square(69.0, 26.0)},
        ]);
        let dataset = BoundaryDataset::from_json(&payload);
        assert_eq!(dataset.find("Hyderabad").unwrap().id, Some(1));
    }
}

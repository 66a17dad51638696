#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary types.
//!
//! Boundaries are districts or tehsils of Pakistan, served by the upstream
//! `administrative-units` endpoint. Records that cannot be joined to a
//! boundary are placed inside [`BoundingBox::PAKISTAN`].

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude.
    pub lng: f64,
    /// Latitude.
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// An axis-aligned longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Extent of Pakistan.
    pub const PAKISTAN: Self = Self {
        min_lng: 60.87,
        min_lat: 23.69,
        max_lng: 77.84,
        max_lat: 37.08,
    };

    /// Maps unit-square coordinates (`u`, `v` in `[0, 1)`) into the box.
    #[must_use]
    pub fn lerp(&self, u: f64, v: f64) -> LngLat {
        LngLat::new(
            (self.max_lng - self.min_lng).mul_add(u, self.min_lng),
            (self.max_lat - self.min_lat).mul_add(v, self.min_lat),
        )
    }

    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        (self.min_lng..=self.max_lng).contains(&point.lng)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_corners_stay_inside() {
        let bbox = BoundingBox::PAKISTAN;
        assert_eq!(bbox.lerp(0.0, 0.0), LngLat::new(60.87, 23.69));
        assert!(bbox.contains(bbox.lerp(0.999, 0.999)));
        assert!(!bbox.contains(LngLat::new(0.0, 0.0)));
    }

    #[test]
    fn bounding_box_serializes_camel_case() {
        let json = serde_json::to_value(BoundingBox::PAKISTAN).unwrap();
        assert!(json.get("minLng").is_some());
        assert!(json.get("maxLat").is_some());
    }
}

//! Record-to-geometry binding.

use ccvi_map_geography_models::{BoundingBox, LngLat};
use ccvi_map_source_models::NormalizedRecord;

use crate::BoundaryDataset;

/// Fractional parts of the plastic number's inverse powers; drive the R2
/// low-discrepancy sequence.
const R2_ALPHA: (f64, f64) = (0.754_877_666_246_692_7, 0.569_840_290_998_053_3);

/// A normalized record with the geometry it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecord {
    pub record: NormalizedRecord,
    pub geometry: geojson::Geometry,
    /// Popup anchor.
    pub anchor: LngLat,
    /// `true` when no boundary matched and the geometry is a synthesized
    /// point.
    pub placeholder: bool,
}

/// Joins each record to its boundary by `region_name`.
///
/// Records without a matching unit get [`placeholder_point`] for their
/// position in `records`, so the same inputs always bind to the same
/// output.
#[must_use]
pub fn bind(
    records: &[NormalizedRecord],
    dataset: &BoundaryDataset,
    bbox: &BoundingBox,
) -> Vec<BoundRecord> {
    let bound: Vec<BoundRecord> = records
        .iter()
        .enumerate()
        .map(|(index, record)| match dataset.find(&record.region_name) {
            Some(unit) => BoundRecord {
                record: record.clone(),
                geometry: unit.geometry.clone(),
                anchor: unit.anchor,
                placeholder: false,
            },
            None => {
                let anchor = placeholder_point(index, bbox);
                BoundRecord {
                    record: record.clone(),
                    geometry: point_geometry(anchor),
                    anchor,
                    placeholder: true,
                }
            }
        })
        .collect();

    let misses = bound.iter().filter(|b| b.placeholder).count();
    if misses > 0 {
        log::debug!(
            "{misses}/{} records had no matching boundary; using placeholder points",
            bound.len()
        );
    }
    bound
}

/// Deterministic point inside `bbox` for the `index`-th unmatched record.
///
/// Uses the R2 sequence, so consecutive indices spread evenly over the box
/// instead of clustering.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn placeholder_point(index: usize, bbox: &BoundingBox) -> LngLat {
    let n = (index + 1) as f64;
    let u = R2_ALPHA.0.mul_add(n, 0.5).fract();
    let v = R2_ALPHA.1.mul_add(n, 0.5).fract();
    bbox.lerp(u, v)
}

fn point_geometry(point: LngLat) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::Point(vec![point.lng, point.lat]))
}

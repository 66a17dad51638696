//! Summary statistics of a loaded layer.

use ccvi_map_render::VulnerabilityLevel;
use ccvi_map_source_models::NormalizedRecord;
use serde::Serialize;

/// Aggregates over the records that carry data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub area_count: usize,
    pub with_data: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Count of areas per level, lowest level first.
    pub histogram: Vec<LevelCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: VulnerabilityLevel,
    pub count: usize,
}

impl Report {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let values: Vec<f64> = records
            .iter()
            .filter(|r| r.has_data)
            .map(|r| r.value)
            .collect();

        let mut histogram: Vec<LevelCount> = VulnerabilityLevel::all()
            .iter()
            .map(|&level| LevelCount { level, count: 0 })
            .collect();
        for &value in &values {
            histogram[VulnerabilityLevel::from_magnitude(value).index()].count += 1;
        }

        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
        Self {
            area_count: records.len(),
            with_data: values.len(),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            mean,
            histogram,
        }
    }
}

//! The pure part of a load: upstream payload to drawable features.
//!
//! ```text
//! response -> normalize -> extract -> bind -> encode
//! ```
//!
//! Nothing here performs I/O, so the same inputs always produce the same
//! layer.

use ccvi_map_geography::{BoundaryDataset, bind};
use ccvi_map_geography_models::BoundingBox;
use ccvi_map_indicator_models::{BoundaryLevel, IndicatorDefinition};
use ccvi_map_render::VisualFeature;
use ccvi_map_render::feature::encode_features;
use ccvi_map_source::extract::normalize_response;
use ccvi_map_source_models::NormalizedRecord;
use serde_json::Value;

/// Result of running the pipeline over one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub records: Vec<NormalizedRecord>,
    pub features: Vec<VisualFeature>,
}

impl Layer {
    /// Number of features drawn at a synthesized position.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.features.iter().filter(|f| f.placeholder).count()
    }
}

/// Runs the pipeline over an indicator response.
#[must_use]
pub fn build_layer(
    response: &Value,
    boundaries: &BoundaryDataset,
    definition: &IndicatorDefinition,
    boundary: BoundaryLevel,
) -> Layer {
    let records = normalize_response(response, definition, boundary);
    let bound = bind(&records, boundaries, &BoundingBox::PAKISTAN);
    let features = encode_features(&bound);
    Layer { records, features }
}

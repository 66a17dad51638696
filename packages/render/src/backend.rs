//! Rendering backends.
//!
//! A backend receives the complete feature set on every render and
//! reports what changed relative to the previous one. Backends own all of
//! their configuration; nothing is read from globals.

use std::collections::BTreeMap;

use crate::{RenderError, Viewport, feature::VisualFeature};

/// Default base map style.
pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/satellite-streets-v12";

/// Configuration handed to a backend at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub style_url: String,
    /// Tile provider token, when the style requires one.
    pub access_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            style_url: DEFAULT_STYLE_URL.to_string(),
            access_token: None,
        }
    }
}

/// Keys that changed between two consecutive renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl LayerDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// A map rendering strategy.
pub trait RenderBackend: Send {
    /// Replaces the drawn layer with `features` and moves the camera.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the backend cannot draw the layer.
    fn render(
        &mut self,
        features: &[VisualFeature],
        viewport: &Viewport,
    ) -> Result<LayerDiff, RenderError>;

    /// Keys of the features currently drawn, in render order.
    fn keys(&self) -> Vec<String>;
}

/// Backend that keeps the layer as a keyed `GeoJSON` source, the form map
/// engines consume for data-driven styling.
#[derive(Debug, Clone)]
pub struct GeoJsonLayerBackend {
    config: BackendConfig,
    features: BTreeMap<String, VisualFeature>,
    order: Vec<String>,
    viewport: Viewport,
}

impl GeoJsonLayerBackend {
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if the style URL is empty.
    pub fn new(config: BackendConfig) -> Result<Self, RenderError> {
        if config.style_url.trim().is_empty() {
            return Err(RenderError::InvalidConfig {
                message: "style URL must not be empty".to_string(),
            });
        }
        Ok(Self {
            config,
            features: BTreeMap::new(),
            order: Vec::new(),
            viewport: Viewport::default(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &BackendConfig {
        &self.config
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The drawn layer as a `FeatureCollection`, in render order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Json`] if a feature fails to serialize.
    pub fn feature_collection(&self) -> Result<geojson::FeatureCollection, RenderError> {
        let ordered: Vec<VisualFeature> = self
            .order
            .iter()
            .filter_map(|key| self.features.get(key).cloned())
            .collect();
        crate::feature::feature_collection(&ordered)
    }
}

impl RenderBackend for GeoJsonLayerBackend {
    fn render(
        &mut self,
        features: &[VisualFeature],
        viewport: &Viewport,
    ) -> Result<LayerDiff, RenderError> {
        let mut next = BTreeMap::new();
        let mut order = Vec::with_capacity(features.len());
        let mut diff = LayerDiff::default();

        for feature in features {
            match self.features.get(&feature.key) {
                None => diff.added.push(feature.key.clone()),
                Some(previous) if previous != feature => diff.updated.push(feature.key.clone()),
                Some(_) => diff.unchanged += 1,
            }
            order.push(feature.key.clone());
            next.insert(feature.key.clone(), feature.clone());
        }
        diff.removed = self
            .order
            .iter()
            .filter(|key| !next.contains_key(*key))
            .cloned()
            .collect();

        log::debug!(
            "Layer updated: {} added, {} updated, {} removed, {} unchanged",
            diff.added.len(),
            diff.updated.len(),
            diff.removed.len(),
            diff.unchanged
        );

        self.features = next;
        self.order = order;
        self.viewport = *viewport;
        Ok(diff)
    }

    fn keys(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use ccvi_map_geography_models::LngLat;
    use ccvi_map_source_models::{NormalizedRecord, RecordId};

    use super::*;
    use crate::encode::Style;

    fn feature(key: &str, value: f64) -> VisualFeature {
        VisualFeature {
            key: key.to_string(),
            geometry: geojson::Geometry::new(geojson::Value::Point(vec![70.0, 30.0])),
            anchor: LngLat::new(70.0, 30.0),
            placeholder: false,
            properties: NormalizedRecord {
                id: RecordId::Text(key.to_string()),
                name: key.to_string(),
                region_name: key.to_string(),
                province: "Punjab".to_string(),
                value,
                has_data: true,
                district_context: None,
            },
            style: Style::of(value, true),
        }
    }

    #[test]
    fn rejects_empty_style_url() {
        let config = BackendConfig {
            style_url: "  ".to_string(),
            access_token: None,
        };
        assert!(matches!(
            GeoJsonLayerBackend::new(config),
            Err(RenderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn diffs_successive_renders() {
        let mut backend = GeoJsonLayerBackend::new(BackendConfig::default()).unwrap();
        let viewport = Viewport::default();

        let diff = backend
            .render(&[feature("a", 0.1), feature("b", 0.5)], &viewport)
            .unwrap();
        assert_eq!(diff.added, vec!["a", "b"]);

        let diff = backend
            .render(&[feature("b", 0.9), feature("c", 0.3), feature("a", 0.1)], &viewport)
            .unwrap();
        assert_eq!(diff.added, vec!["c"]);
        assert_eq!(diff.updated, vec!["b"]);
        assert_eq!(diff.unchanged, 1);
        assert!(diff.removed.is_empty());
        assert_eq!(backend.keys(), vec!["b", "c", "a"]);

        let diff = backend.render(&[feature("c", 0.3)], &viewport).unwrap();
        assert_eq!(diff.removed, vec!["b", "a"]);
        assert_eq!(backend.feature_collection().unwrap().features.len(), 1);
    }

    #[test]
    fn identical_render_is_empty_diff() {
        let mut backend = GeoJsonLayerBackend::new(BackendConfig::default()).unwrap();
        let features = [feature("a", 0.1)];
        backend.render(&features, &Viewport::default()).unwrap();
        let diff = backend.render(&features, &Viewport::default()).unwrap();
        assert!(diff.is_empty());
    }
}

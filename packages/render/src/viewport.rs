//! Map camera state.

use ccvi_map_geography_models::LngLat;
use serde::{Deserialize, Serialize};

/// Default camera center (Pakistan).
pub const DEFAULT_CENTER: LngLat = LngLat::new(69.3451, 30.3753);
pub const DEFAULT_ZOOM: u8 = 6;
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 12;

/// Camera center and zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl Viewport {
    /// Zooms in one level, up to [`MAX_ZOOM`].
    pub fn zoom_in(&mut self) {
        self.zoom = self.zoom.saturating_add(1).min(MAX_ZOOM);
    }

    /// Zooms out one level, down to [`MIN_ZOOM`].
    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Pans and zooms, clamping the zoom level.
    pub fn move_to(&mut self, center: LngLat, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom, MAX_ZOOM);
        for _ in 0..20 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom, MIN_ZOOM);

        viewport.move_to(LngLat::new(67.0, 24.8), 40);
        assert_eq!(viewport.zoom, MAX_ZOOM);
    }

    #[test]
    fn reset_restores_default() {
        let mut viewport = Viewport::default();
        viewport.move_to(LngLat::new(74.3, 31.5), 9);
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
        assert_eq!(viewport.zoom, DEFAULT_ZOOM);
    }
}

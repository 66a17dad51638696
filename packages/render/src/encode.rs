//! Visual encoding of indicator magnitudes.
//!
//! Magnitudes in `[0, 1]` fall into five equal-width buckets separated at
//! [`BREAKPOINTS`]. Bucket determines color; radius grows linearly with
//! the magnitude and is clamped to `[MIN_RADIUS, MAX_RADIUS]`. Records
//! without data get a separate muted style so they are never mistaken for
//! a low score.

use ccvi_map_indicator_models::{AreaClassification, BoundaryLevel};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Upper bounds (exclusive) of the first four buckets.
pub const BREAKPOINTS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

/// Radius multiplier applied to the magnitude.
pub const RADIUS_SCALE: f64 = 30.0;
pub const MIN_RADIUS: f64 = 10.0;
pub const MAX_RADIUS: f64 = 30.0;
/// Fill opacity for features with data.
pub const OPACITY: f64 = 0.8;

pub const NO_DATA_COLOR: &str = "#9CA3AF";
pub const NO_DATA_OPACITY: f64 = 0.4;
pub const NO_DATA_LABEL: &str = "No data";

/// Vulnerability bucket, from 1 (very low) to 5 (very high).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VulnerabilityLevel {
    VeryLow = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    VeryHigh = 5,
}

impl VulnerabilityLevel {
    /// All levels from lowest to highest.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VeryLow,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::VeryHigh,
        ]
    }

    /// The level for a magnitude. Non-finite input maps to the lowest
    /// level.
    #[must_use]
    pub fn from_magnitude(value: f64) -> Self {
        Self::all()[bucket_index(value)]
    }

    /// 0-based bucket index.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::VeryLow => "#3B82F6",
            Self::Low => "#10B981",
            Self::Medium => "#F59E0B",
            Self::High => "#EF4444",
            Self::VeryHigh => "#DC2626",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Inclusive lower and exclusive upper bound (inclusive for the top
    /// level).
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::VeryLow => (0.0, BREAKPOINTS[0]),
            Self::Low => (BREAKPOINTS[0], BREAKPOINTS[1]),
            Self::Medium => (BREAKPOINTS[1], BREAKPOINTS[2]),
            Self::High => (BREAKPOINTS[2], BREAKPOINTS[3]),
            Self::VeryHigh => (BREAKPOINTS[3], 1.0),
        }
    }
}

/// Number of breakpoints at or below `value`. Monotonic non-decreasing.
#[must_use]
pub fn bucket_index(value: f64) -> usize {
    if value.is_nan() {
        return 0;
    }
    BREAKPOINTS.iter().take_while(|&&b| value >= b).count()
}

/// Marker radius for a magnitude.
#[must_use]
pub fn radius(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_RADIUS;
    }
    (value * RADIUS_SCALE).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// How a single feature is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Style {
    pub color: &'static str,
    pub radius: f64,
    pub opacity: f64,
}

impl Style {
    /// Style for a magnitude, or the no-data style when `has_data` is
    /// `false`.
    #[must_use]
    pub fn of(value: f64, has_data: bool) -> Self {
        if !has_data {
            return Self::no_data();
        }
        Self {
            color: VulnerabilityLevel::from_magnitude(value).color(),
            radius: radius(value),
            opacity: OPACITY,
        }
    }

    #[must_use]
    pub const fn no_data() -> Self {
        Self {
            color: NO_DATA_COLOR,
            radius: MIN_RADIUS,
            opacity: NO_DATA_OPACITY,
        }
    }
}

/// One row of the legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
    /// Magnitude range; `None` for the no-data entry.
    pub range: Option<(f64, f64)>,
}

/// Legend metadata for the current layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
    pub summary: String,
}

impl Legend {
    /// Builds the legend for `indicator_name`. `area_count` is `None`
    /// while nothing has loaded yet.
    #[must_use]
    pub fn new(
        indicator_name: &str,
        boundary: BoundaryLevel,
        classification: AreaClassification,
        area_count: Option<usize>,
    ) -> Self {
        let mut entries: Vec<LegendEntry> = VulnerabilityLevel::all()
            .iter()
            .map(|level| {
                let (low, high) = level.range();
                LegendEntry {
                    label: format!("{low:.1} - {high:.1} ({})", level.label()),
                    color: level.color(),
                    range: Some((low, high)),
                }
            })
            .collect();
        entries.push(LegendEntry {
            label: NO_DATA_LABEL.to_string(),
            color: NO_DATA_COLOR,
            range: None,
        });

        Self {
            title: format!("{indicator_name} Index"),
            entries,
            summary: summary_line(boundary, classification, area_count),
        }
    }
}

/// `Showing tehsils level data (12 areas) - Rural`
#[must_use]
pub fn summary_line(
    boundary: BoundaryLevel,
    classification: AreaClassification,
    area_count: Option<usize>,
) -> String {
    let count = area_count.map_or_else(String::new, |n| format!(" ({n} areas)"));
    format!(
        "Showing {boundary} level data{count} - {}",
        classification.label()
    )
}

//! Endpoint resolution.
//!
//! Maps an indicator and a [`FilterState`] to the upstream URL and query
//! parameters. Filter parameters come first, in a fixed order, followed by
//! the indicator's static parameters from the registry:
//!
//! ```text
//! {base}/{endpoint}?area_type=&province=&year=&area_classification=&<static>
//! ```
//!
//! `province` is only sent when a province is selected, and
//! `area_classification` is omitted entirely for
//! [`AreaClassification::All`].

use ccvi_map_indicator::IndicatorRegistry;
use ccvi_map_indicator_models::{AreaClassification, BoundaryLevel, FilterState};
use ccvi_map_source_models::ResolvedRequest;

use crate::SourceError;

/// Base URL of the IWMI CCVI API.
pub const DEFAULT_API_BASE_URL: &str = "https://pakwmis.iwmi.org/iwmi-ccvi/backend/api";

/// Resolves the indicator request for the current filters.
///
/// # Errors
///
/// Returns [`SourceError::UnknownIndicator`] if `filters.indicator_id` is
/// not registered.
pub fn resolve(
    registry: &IndicatorRegistry,
    base_url: &str,
    filters: &FilterState,
) -> Result<ResolvedRequest, SourceError> {
    let definition =
        registry
            .get(&filters.indicator_id)
            .ok_or_else(|| SourceError::UnknownIndicator {
                id: filters.indicator_id.clone(),
            })?;

    let mut query = vec![(
        "area_type".to_string(),
        filters.boundary_level.area_type().to_string(),
    )];
    if let Some(region_id) = filters.region_id {
        query.push(("province".to_string(), region_id.to_string()));
    }
    query.push(("year".to_string(), filters.year.to_string()));
    if let Some(classification) = filters.area_classification.query_value() {
        query.push(("area_classification".to_string(), classification.to_string()));
    }
    query.extend(
        definition
            .params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    Ok(ResolvedRequest {
        url: join_url(base_url, &definition.endpoint),
        query,
    })
}

/// Resolves the administrative-units request for the boundary level and
/// province in `filters`.
#[must_use]
pub fn resolve_boundaries(base_url: &str, filters: &FilterState) -> ResolvedRequest {
    let mut query = vec![(
        "level".to_string(),
        filters.boundary_level.unit_level().to_string(),
    )];
    if let Some(region_id) = filters.region_id {
        query.push(("province_id".to_string(), region_id.to_string()));
    }
    ResolvedRequest {
        url: join_url(base_url, "administrative-units"),
        query,
    }
}

/// Recovers the filter values encoded by [`resolve`] from a query string's
/// pairs. Indicator-specific parameters are ignored.
///
/// Returns `None` if a filter parameter is missing or malformed.
#[must_use]
pub fn parse_filters(indicator_id: &str, query: &[(String, String)]) -> Option<FilterState> {
    let get = |key: &str| {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let boundary_level = BoundaryLevel::from_area_type(get("area_type")?)?;
    let region_id = match get("province") {
        Some(value) => Some(value.parse::<u32>().ok()?),
        None => None,
    };
    let year = get("year")?.parse::<i32>().ok()?;
    let area_classification = match get("area_classification") {
        Some(value) => value
            .parse::<AreaClassification>()
            .ok()
            .filter(|c| *c != AreaClassification::All)?,
        None => AreaClassification::All,
    };

    Some(FilterState {
        indicator_id: indicator_id.to_string(),
        boundary_level,
        region_id,
        year,
        area_classification,
    })
}

/// Renders a resolved request as a full URL with an encoded query string.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if the base URL does not parse.
pub fn to_url(request: &ResolvedRequest) -> Result<reqwest::Url, SourceError> {
    reqwest::Url::parse_with_params(&request.url, &request.query).map_err(|e| {
        SourceError::InvalidUrl {
            url: request.url.clone(),
            message: e.to_string(),
        }
    })
}

/// Decodes the query pairs of a URL string.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `url` does not parse.
pub fn query_pairs(url: &str) -> Result<Vec<(String, String)>, SourceError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| SourceError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Joins a base URL and a relative path with exactly one `/`.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

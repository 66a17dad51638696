//! Location lookups (`{base}/location/*`).
//!
//! These back the year and region pickers. The lookups are served as plain
//! arrays today but go through the normalizer so envelope changes upstream
//! don't break them.

use ccvi_map_source_models::{RawRecord, ResolvedRequest, YearOption};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{JsonFetcher, SourceError, normalize, resolve::join_url};

/// A location lookup endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LocationKind {
    Years,
    Provinces,
    Districts,
    Tehsils,
}

impl LocationKind {
    /// Name of the parent-id query parameter, if the lookup is scoped.
    #[must_use]
    pub const fn parent_param(self) -> Option<&'static str> {
        match self {
            Self::Years | Self::Provinces => None,
            Self::Districts => Some("province_id"),
            Self::Tehsils => Some("district_id"),
        }
    }
}

/// Builds a location lookup request. `parent_id` is ignored for unscoped
/// lookups.
#[must_use]
pub fn location_request(base_url: &str, kind: LocationKind, parent_id: Option<u32>) -> ResolvedRequest {
    let query = kind
        .parent_param()
        .zip(parent_id)
        .map(|(param, id)| vec![(param.to_string(), id.to_string())])
        .unwrap_or_default();
    ResolvedRequest {
        url: join_url(base_url, &format!("location/{kind}")),
        query,
    }
}

/// Fetches a location lookup as raw records.
///
/// # Errors
///
/// Returns [`SourceError`] if the fetch fails.
pub async fn fetch_locations(
    fetcher: &dyn JsonFetcher,
    base_url: &str,
    kind: LocationKind,
    parent_id: Option<u32>,
) -> Result<Vec<RawRecord>, SourceError> {
    let request = location_request(base_url, kind, parent_id);
    let body = fetcher.fetch_json(&request).await?;
    Ok(normalize::normalize(&body))
}

/// Fetches the selectable years. Entries that don't decode are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the fetch fails.
pub async fn fetch_years(
    fetcher: &dyn JsonFetcher,
    base_url: &str,
) -> Result<Vec<YearOption>, SourceError> {
    let records = fetch_locations(fetcher, base_url, LocationKind::Years, None).await?;
    Ok(records
        .into_iter()
        .filter_map(|record| {
            serde_json::from_value::<YearOption>(Value::Object(record))
                .inspect_err(|e| log::warn!("Skipping year option: {e}"))
                .ok()
        })
        .collect())
}

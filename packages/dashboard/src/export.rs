//! Export of the drawn layer.

use ccvi_map_source_models::NormalizedRecord;
use serde::Serialize;

use crate::DashboardError;

/// One CSV row. Records without data leave `value` empty.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: String,
    name: &'a str,
    district: &'a str,
    province: &'a str,
    value: Option<f64>,
}

/// Writes records as CSV with a header row.
///
/// # Errors
///
/// Returns [`DashboardError::Csv`] if serialization fails.
pub fn records_to_csv(records: &[NormalizedRecord]) -> Result<String, DashboardError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(CsvRow {
            id: record.id.to_string(),
            name: &record.name,
            district: record.district_context.as_deref().unwrap_or(""),
            province: &record.province,
            value: record.has_data.then_some(record.value),
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes records as a JSON array.
///
/// # Errors
///
/// Returns [`DashboardError::Json`] if serialization fails.
pub fn records_to_json(records: &[NormalizedRecord]) -> Result<String, DashboardError> {
    Ok(serde_json::to_string_pretty(records)?)
}

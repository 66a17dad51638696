//! Rendering stored rows into export payloads.

use ccvi_map_server_models::{ExportFormat, VulnerabilityRecord};
use serde_json::Value;

use crate::storage::StorageError;

/// Renders `records` as CSV text or a JSON array.
///
/// # Errors
///
/// Returns [`StorageError`] if serialization fails.
pub fn render(format: ExportFormat, records: &[VulnerabilityRecord]) -> Result<Value, StorageError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_value(records)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for record in records {
                writer.serialize(record)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| StorageError::Csv(e.into_error().into()))?;
            Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

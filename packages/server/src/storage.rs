//! The backend storage collaborator.
//!
//! Handlers only see the [`Storage`] trait. [`MemStorage`] keeps a fixed
//! seed set in memory; nothing is persisted.

use async_trait::async_trait;
use ccvi_map_server_models::{
    ClimateIndicator, ExportData, ExportFormat, VulnerabilityFilter, VulnerabilityRecord,
};
use chrono::Utc;
use thiserror::Error;

use crate::export;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// CSV rendering failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON rendering failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Access to indicators and stored vulnerability scores.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Lists all indicators.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    async fn get_indicators(&self) -> Result<Vec<ClimateIndicator>, StorageError>;

    /// Lists scores matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    async fn get_vulnerability_data(
        &self,
        filter: &VulnerabilityFilter,
    ) -> Result<Vec<VulnerabilityRecord>, StorageError>;

    /// Renders the scores matching `filter` as an export.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the rows cannot be read or rendered.
    async fn generate_export(
        &self,
        format: ExportFormat,
        filter: &VulnerabilityFilter,
    ) -> Result<ExportData, StorageError> {
        let records = self.get_vulnerability_data(filter).await?;
        Ok(ExportData {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            format,
            record_count: records.len(),
            content: export::render(format, &records)?,
        })
    }
}

/// In-memory [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    indicators: Vec<ClimateIndicator>,
    records: Vec<VulnerabilityRecord>,
}

impl MemStorage {
    #[must_use]
    pub const fn new(indicators: Vec<ClimateIndicator>, records: Vec<VulnerabilityRecord>) -> Self {
        Self {
            indicators,
            records,
        }
    }

    /// Storage preloaded with the four CCVI components and sample scores.
    #[must_use]
    pub fn seeded() -> Self {
        let indicator = |id: i64, name: &str, category: &str, description: &str| ClimateIndicator {
            id,
            name: name.to_string(),
            category: category.to_string(),
            description: Some(description.to_string()),
            is_active: true,
        };
        let record = |id: i64, state: &str, county: &str, score: f64, lat: f64, lng: f64| {
            VulnerabilityRecord {
                id,
                state: state.to_string(),
                county: Some(county.to_string()),
                indicator_id: Some(1),
                score,
                latitude: Some(lat),
                longitude: Some(lng),
            }
        };

        Self::new(
            vec![
                indicator(
                    1,
                    "Overall Climate Vulnerability",
                    "vulnerability",
                    "Composite climate change vulnerability index",
                ),
                indicator(2, "Exposure", "exposure", "Exposure to climate hazards"),
                indicator(
                    3,
                    "Sensitivity Index",
                    "sensitivity",
                    "Degree to which a system is affected by climate stimuli",
                ),
                indicator(
                    4,
                    "Adaptive Capacity",
                    "adaptive-capacity",
                    "Ability to adjust to climate change",
                ),
            ],
            vec![
                record(1, "CA", "Los Angeles", 85.0, 34.0522, -118.2437),
                record(2, "TX", "Harris", 72.0, 29.7604, -95.3698),
                record(3, "FL", "Miami-Dade", 91.0, 25.7617, -80.1918),
                record(4, "NY", "New York", 78.0, 40.7128, -74.0060),
                record(5, "WA", "King", 65.0, 47.6062, -122.3321),
            ],
        )
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_indicators(&self) -> Result<Vec<ClimateIndicator>, StorageError> {
        Ok(self.indicators.clone())
    }

    async fn get_vulnerability_data(
        &self,
        filter: &VulnerabilityFilter,
    ) -> Result<Vec<VulnerabilityRecord>, StorageError> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                filter
                    .state
                    .as_deref()
                    .is_none_or(|state| r.state.eq_ignore_ascii_case(state.trim()))
            })
            .filter(|r| filter.indicator_id.is_none_or(|id| r.indicator_id == Some(id)))
            .cloned()
            .collect())
    }
}

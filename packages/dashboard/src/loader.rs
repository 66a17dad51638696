//! Fetching and memoizing the inputs of a layer.
//!
//! A load fetches the indicator payload and the boundary dataset
//! concurrently and only runs the pipeline once both have settled. Both
//! payloads are memoized in [`TtlCache`]s shared by every clone of the
//! [`LayerLoader`].
//!
//! A failed boundary fetch does not fail the load: every record is drawn
//! at a placeholder position instead. A failed indicator fetch does.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ccvi_map_geography::BoundaryDataset;
use ccvi_map_indicator::IndicatorRegistry;
use ccvi_map_indicator_models::{FilterState, IndicatorDescriptor};
use ccvi_map_source::{JsonFetcher, SourceError, resolve};
use ccvi_map_source_models::ResolvedRequest;
use serde_json::Value;

use crate::DashboardError;
use crate::cache::{BOUNDARY_TTL, INDICATOR_TTL, TtlCache};
use crate::pipeline::{Layer, build_layer};

type SharedCache<V> = Arc<Mutex<TtlCache<String, Arc<V>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A successfully loaded layer.
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    pub filters: FilterState,
    pub indicator: IndicatorDescriptor,
    /// Fully encoded upstream URL the values came from.
    pub request_url: String,
    pub layer: Layer,
    /// Boundary fetch failure, when the layer fell back to placeholders.
    pub boundary_error: Option<String>,
}

/// Loads layers through a [`JsonFetcher`], memoizing upstream payloads.
#[derive(Clone)]
pub struct LayerLoader {
    fetcher: Arc<dyn JsonFetcher>,
    registry: Arc<IndicatorRegistry>,
    base_url: String,
    indicators: SharedCache<Value>,
    boundaries: SharedCache<BoundaryDataset>,
}

impl std::fmt::Debug for LayerLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerLoader")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LayerLoader {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        registry: Arc<IndicatorRegistry>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            base_url: base_url.into(),
            indicators: Arc::new(Mutex::new(TtlCache::new(INDICATOR_TTL))),
            boundaries: Arc::new(Mutex::new(TtlCache::new(BOUNDARY_TTL))),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn fetcher(&self) -> &dyn JsonFetcher {
        self.fetcher.as_ref()
    }

    /// Resolves the indicator request for `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownIndicator`] for unregistered ids.
    pub fn resolve(&self, filters: &FilterState) -> Result<ResolvedRequest, SourceError> {
        resolve::resolve(&self.registry, &self.base_url, filters)
    }

    /// Loads the layer for `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Source`] if the indicator is unknown or its
    /// payload cannot be fetched.
    pub async fn load(&self, filters: &FilterState) -> Result<LoadedLayer, DashboardError> {
        let request = self.resolve(filters)?;
        let definition = self.registry.get(&filters.indicator_id).ok_or_else(|| {
            SourceError::UnknownIndicator {
                id: filters.indicator_id.clone(),
            }
        })?;
        let request_url = resolve::to_url(&request)?.to_string();

        let (payload, boundaries) = tokio::join!(
            self.indicator_payload(filters, &request),
            self.boundary_dataset(filters),
        );
        let payload = payload?;
        let (boundaries, boundary_error) = match boundaries {
            Ok(dataset) => (dataset, None),
            Err(e) => {
                log::warn!("Boundary fetch failed, using placeholder positions: {e}");
                (Arc::new(BoundaryDataset::default()), Some(e.to_string()))
            }
        };

        let layer = build_layer(&payload, &boundaries, definition, filters.boundary_level);
        log::info!(
            "Loaded {} areas for '{}' ({} without boundary)",
            layer.features.len(),
            filters.indicator_id,
            layer.placeholder_count()
        );

        Ok(LoadedLayer {
            filters: filters.clone(),
            indicator: definition.descriptor(),
            request_url,
            layer,
            boundary_error,
        })
    }

    /// Drops expired entries from both caches.
    pub fn purge_expired(&self) -> usize {
        lock(&self.indicators).purge_expired() + lock(&self.boundaries).purge_expired()
    }

    async fn indicator_payload(
        &self,
        filters: &FilterState,
        request: &ResolvedRequest,
    ) -> Result<Arc<Value>, SourceError> {
        let key = filters.cache_key();
        let cached = lock(&self.indicators).get(&key);
        if let Some(payload) = cached {
            log::debug!("Indicator cache hit: {key}");
            return Ok(payload);
        }

        let payload = Arc::new(self.fetcher.fetch_json(request).await?);
        lock(&self.indicators).insert(key, Arc::clone(&payload));
        Ok(payload)
    }

    async fn boundary_dataset(
        &self,
        filters: &FilterState,
    ) -> Result<Arc<BoundaryDataset>, SourceError> {
        let key = filters.boundary_cache_key();
        let cached = lock(&self.boundaries).get(&key);
        if let Some(dataset) = cached {
            log::debug!("Boundary cache hit: {key}");
            return Ok(dataset);
        }

        let request = resolve::resolve_boundaries(&self.base_url, filters);
        let body = self.fetcher.fetch_json(&request).await?;
        let dataset = Arc::new(BoundaryDataset::from_json(&body));
        lock(&self.boundaries).insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }
}

/// A load that has been started by the controller but not yet run.
///
/// Owns everything it needs, so it can be awaited or spawned without
/// borrowing the controller.
#[derive(Debug, Clone)]
pub struct PendingLoad {
    loader: LayerLoader,
    filters: FilterState,
}

impl PendingLoad {
    #[must_use]
    pub const fn new(loader: LayerLoader, filters: FilterState) -> Self {
        Self { loader, filters }
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Runs the load to completion.
    pub async fn run(self) -> CompletedLoad {
        let result = self.loader.load(&self.filters).await;
        CompletedLoad {
            filters: self.filters,
            result,
        }
    }
}

/// Outcome of a [`PendingLoad`], tagged with the filters it was started
/// for.
#[derive(Debug)]
pub struct CompletedLoad {
    pub filters: FilterState,
    pub result: Result<LoadedLayer, DashboardError>,
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use ccvi_map_indicator_models::BoundaryLevel;
    use serde_json::json;

    use super::*;

    /// Serves canned indicator and boundary payloads and counts calls.
    pub struct MockFetcher {
        pub indicator: Value,
        pub boundaries: Option<Value>,
        pub indicator_calls: AtomicUsize,
        pub boundary_calls: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new(indicator: Value, boundaries: Option<Value>) -> Self {
            Self {
                indicator,
                boundaries,
                indicator_calls: AtomicUsize::new(0),
                boundary_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JsonFetcher for MockFetcher {
        async fn fetch_json(&self, request: &ResolvedRequest) -> Result<Value, SourceError> {
            if request.url.ends_with("/administrative-units") {
                self.boundary_calls.fetch_add(1, Ordering::SeqCst);
                return self.boundaries.clone().ok_or_else(|| SourceError::Status {
                    status: 503,
                    url: request.url.clone(),
                });
            }
            self.indicator_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.indicator.clone())
        }
    }

    pub fn sample_indicator() -> Value {
        json!([
            {"district_name": "Lahore", "province_name": "Punjab", "vulnerability_index": 0.35},
            {"district_name": "Quetta", "province_name": "Balochistan", "vulnerability_index": 0.82},
        ])
    }

    pub fn sample_boundaries() -> Value {
        json!({"units": [{
            "id": 1,
            "name": "Lahore",
            "geometry": {"type": "Point", "coordinates": [74.35, 31.55]},
        }]})
    }

    pub fn loader(fetcher: Arc<MockFetcher>) -> LayerLoader {
        LayerLoader::new(
            fetcher,
            Arc::new(IndicatorRegistry::load().unwrap()),
            "https://api.test",
        )
    }

    #[tokio::test]
    async fn loads_and_binds() {
        let fetcher = Arc::new(MockFetcher::new(sample_indicator(), Some(sample_boundaries())));
        let loaded = loader(fetcher).load(&FilterState::default()).await.unwrap();

        assert_eq!(loaded.layer.features.len(), 2);
        assert_eq!(loaded.layer.placeholder_count(), 1);
        assert_eq!(loaded.indicator.id, "vulnerability");
        assert!(loaded.request_url.starts_with("https://api.test/ccvi/vulnerability?"));
        assert!(loaded.boundary_error.is_none());
    }

    #[tokio::test]
    async fn boundary_failure_degrades_to_placeholders() {
        let fetcher = Arc::new(MockFetcher::new(sample_indicator(), None));
        let loaded = loader(fetcher).load(&FilterState::default()).await.unwrap();

        assert_eq!(loaded.layer.placeholder_count(), 2);
        assert!(loaded.boundary_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn memoizes_until_ttl() {
        let fetcher = Arc::new(MockFetcher::new(sample_indicator(), Some(sample_boundaries())));
        let loader = loader(Arc::clone(&fetcher));
        let filters = FilterState::default();

        loader.load(&filters).await.unwrap();
        loader.load(&filters).await.unwrap();
        assert_eq!(fetcher.indicator_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.boundary_calls.load(Ordering::SeqCst), 1);

        // A different indicator on the same boundaries reuses the dataset.
        let exposure = FilterState {
            indicator_id: "exposure".to_string(),
            ..filters.clone()
        };
        loader.load(&exposure).await.unwrap();
        assert_eq!(fetcher.indicator_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.boundary_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(INDICATOR_TTL).await;
        loader.load(&filters).await.unwrap();
        assert_eq!(fetcher.indicator_calls.load(Ordering::SeqCst), 3);
        assert_eq!(fetcher.boundary_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(BOUNDARY_TTL).await;
        let tehsils = FilterState {
            boundary_level: BoundaryLevel::Tehsils,
            ..filters
        };
        loader.load(&tehsils).await.unwrap();
        assert_eq!(fetcher.boundary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_indicator_fails_without_fetching() {
        let fetcher = Arc::new(MockFetcher::new(sample_indicator(), Some(sample_boundaries())));
        let filters = FilterState {
            indicator_id: "nope".to_string(),
            ..FilterState::default()
        };
        let err = loader(Arc::clone(&fetcher)).load(&filters).await.unwrap_err();

        assert!(matches!(
            err,
            DashboardError::Source(SourceError::UnknownIndicator { .. })
        ));
        assert_eq!(fetcher.indicator_calls.load(Ordering::SeqCst), 0);
    }

    /// Holds every fetch until both the indicator and boundary fetches
    /// are in flight.
    struct RendezvousFetcher {
        barrier: tokio::sync::Barrier,
    }

    #[async_trait]
    impl JsonFetcher for RendezvousFetcher {
        async fn fetch_json(&self, request: &ResolvedRequest) -> Result<Value, SourceError> {
            self.barrier.wait().await;
            if request.url.ends_with("/administrative-units") {
                Ok(sample_boundaries())
            } else {
                Ok(sample_indicator())
            }
        }
    }

    #[tokio::test]
    async fn fetches_indicator_and_boundaries_concurrently() {
        let fetcher = Arc::new(RendezvousFetcher {
            barrier: tokio::sync::Barrier::new(2),
        });
        let loader = LayerLoader::new(
            fetcher,
            Arc::new(IndicatorRegistry::load().unwrap()),
            "https://api.test",
        );

        let loaded = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            loader.load(&FilterState::default()),
        )
        .await
        .expect("both fetches should be in flight together")
        .unwrap();

        assert_eq!(loaded.layer.features.len(), 2);
        assert_eq!(loaded.layer.placeholder_count(), 1);
        assert!(loaded.boundary_error.is_none());
    }
}

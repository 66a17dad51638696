//! The map view/controller.
//!
//! ```text
//! Idle --begin_load--> Loading --apply(Ok)--> Loaded
//!                         |  \--apply(Err)--> Errored
//!                         \<--- any filter change, from any state
//! ```
//!
//! Loads are split in two so the controller is never borrowed across an
//! await: a setter returns a [`PendingLoad`], the caller runs it, and the
//! [`CompletedLoad`] is handed back to [`DashboardController::apply`].
//! Results whose filters no longer match the current ones are discarded.
//!
//! While loading, and after an error, the last good layer stays drawn.

use std::fmt;

use ccvi_map_indicator_models::{
    AreaClassification, BoundaryLevel, FilterState, IndicatorDescriptor,
};
use ccvi_map_render::feature::Popup;
use ccvi_map_render::{LayerDiff, Legend, RenderBackend, Viewport, VisualFeature};
use ccvi_map_source::SourceError;
use ccvi_map_source_models::NormalizedRecord;

use crate::report::Report;
use crate::{CompletedLoad, DashboardError, LayerLoader, PendingLoad, export};

/// Page title shown above the map.
pub const DASHBOARD_TITLE: &str = "Pakistan CCVI Dashboard";

/// Where the controller is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// Connection indicator shown in the corner of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusBadge {
    /// Nothing has loaded yet.
    Connecting,
    Loading,
    Connected,
    Error(String),
}

impl StatusBadge {
    /// Badge color.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Connecting | Self::Loading => "yellow",
            Self::Connected => "green",
            Self::Error(_) => "red",
        }
    }
}

impl fmt::Display for StatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("Connecting to API..."),
            Self::Loading => f.write_str("Loading data from IWMI API..."),
            Self::Connected => f.write_str("Connected to IWMI CCVI API"),
            Self::Error(message) => write!(f, "API Error: {message}"),
        }
    }
}

/// What [`DashboardController::apply`] did with a completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The layer was drawn.
    Applied(LayerDiff),
    /// The filters changed while loading; the result was dropped.
    Stale,
    /// The load failed; the previous layer is still drawn.
    Failed(String),
}

/// Title block for the selected indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub indicator: String,
    pub description: String,
}

/// Map view/controller over a rendering backend `B`.
pub struct DashboardController<B: RenderBackend> {
    loader: LayerLoader,
    backend: B,
    filters: FilterState,
    state: LoadState,
    features: Vec<VisualFeature>,
    records: Vec<NormalizedRecord>,
    loaded_once: bool,
    selected: Option<String>,
    viewport: Viewport,
}

impl<B: RenderBackend> fmt::Debug for DashboardController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardController")
            .field("filters", &self.filters)
            .field("state", &self.state)
            .field("features", &self.features.len())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl<B: RenderBackend> DashboardController<B> {
    /// Creates an idle controller with default filters.
    #[must_use]
    pub fn new(loader: LayerLoader, backend: B) -> Self {
        Self {
            loader,
            backend,
            filters: FilterState::default(),
            state: LoadState::Idle,
            features: Vec::new(),
            records: Vec::new(),
            loaded_once: false,
            selected: None,
            viewport: Viewport::default(),
        }
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    #[must_use]
    pub fn features(&self) -> &[VisualFeature] {
        &self.features
    }

    #[must_use]
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Starts a load for the current filters.
    pub fn begin_load(&mut self) -> PendingLoad {
        self.state = LoadState::Loading;
        log::debug!("Loading {}", self.filters.cache_key());
        PendingLoad::new(self.loader.clone(), self.filters.clone())
    }

    /// Reloads the current filters.
    pub fn refresh(&mut self) -> PendingLoad {
        self.begin_load()
    }

    /// Selects an indicator.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownIndicator`] if `id` is not registered;
    /// the filters are left unchanged and the controller moves to
    /// [`LoadState::Errored`].
    pub fn set_indicator(&mut self, id: &str) -> Result<Option<PendingLoad>, DashboardError> {
        if self.loader.registry().get(id).is_none() {
            let error: DashboardError = SourceError::UnknownIndicator { id: id.to_string() }.into();
            log::error!("Rejected indicator selection: {error}");
            self.state = LoadState::Errored(error.to_string());
            return Err(error);
        }
        Ok(self.update(|f| f.indicator_id = id.to_string()))
    }

    pub fn set_boundary_level(&mut self, level: BoundaryLevel) -> Option<PendingLoad> {
        self.update(|f| f.boundary_level = level)
    }

    /// Restricts the map to a province, or clears the restriction.
    pub fn set_region(&mut self, region_id: Option<u32>) -> Option<PendingLoad> {
        self.update(|f| f.region_id = region_id)
    }

    pub fn set_year(&mut self, year: i32) -> Option<PendingLoad> {
        self.update(|f| f.year = year)
    }

    pub fn set_area_classification(
        &mut self,
        classification: AreaClassification,
    ) -> Option<PendingLoad> {
        self.update(|f| f.area_classification = classification)
    }

    /// Applies `change` and starts a load if it changed anything.
    fn update(&mut self, change: impl FnOnce(&mut FilterState)) -> Option<PendingLoad> {
        let mut next = self.filters.clone();
        change(&mut next);
        if next == self.filters {
            return None;
        }
        self.filters = next;
        Some(self.begin_load())
    }

    /// Applies a completed load.
    pub fn apply(&mut self, completed: CompletedLoad) -> ApplyOutcome {
        if completed.filters != self.filters {
            log::debug!(
                "Discarding stale result for {} (current: {})",
                completed.filters.cache_key(),
                self.filters.cache_key()
            );
            return ApplyOutcome::Stale;
        }

        let loaded = match completed.result {
            Ok(loaded) => loaded,
            Err(e) => return self.fail(&e),
        };

        let diff = match self.backend.render(&loaded.layer.features, &self.viewport) {
            Ok(diff) => diff,
            Err(e) => return self.fail(&e.into()),
        };

        self.features = loaded.layer.features;
        self.records = loaded.layer.records;
        self.state = LoadState::Loaded;
        self.loaded_once = true;
        if let Some(key) = &self.selected
            && !self.features.iter().any(|f| &f.key == key)
        {
            log::debug!("Selected feature {key} is gone; closing popup");
            self.selected = None;
        }
        ApplyOutcome::Applied(diff)
    }

    fn fail(&mut self, error: &DashboardError) -> ApplyOutcome {
        let message = error.to_string();
        log::error!("Failed to load {}: {message}", self.filters.indicator_id);
        self.state = LoadState::Errored(message.clone());
        ApplyOutcome::Failed(message)
    }

    /// Runs a load for the current filters to completion and applies it.
    pub async fn reload(&mut self) -> ApplyOutcome {
        let completed = self.begin_load().run().await;
        self.apply(completed)
    }

    /// Opens the popup for `key`, replacing any open popup. Returns `None`
    /// if no drawn feature has that key.
    pub fn select_feature(&mut self, key: &str) -> Option<Popup> {
        if !self.features.iter().any(|f| f.key == key) {
            return None;
        }
        self.selected = Some(key.to_string());
        self.popup()
    }

    pub fn close_popup(&mut self) {
        self.selected = None;
    }

    /// The open popup, if any.
    #[must_use]
    pub fn popup(&self) -> Option<Popup> {
        let key = self.selected.as_ref()?;
        let feature = self.features.iter().find(|f| &f.key == key)?;
        Some(Popup::for_feature(feature, &self.indicator().display_name))
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    #[must_use]
    pub fn status(&self) -> StatusBadge {
        match &self.state {
            LoadState::Loading => StatusBadge::Loading,
            LoadState::Errored(message) => StatusBadge::Error(message.clone()),
            LoadState::Loaded => StatusBadge::Connected,
            LoadState::Idle if self.loaded_once => StatusBadge::Connected,
            LoadState::Idle => StatusBadge::Connecting,
        }
    }

    /// Descriptor of the selected indicator.
    #[must_use]
    pub fn indicator(&self) -> IndicatorDescriptor {
        self.loader.registry().get(&self.filters.indicator_id).map_or_else(
            || IndicatorDescriptor {
                id: self.filters.indicator_id.clone(),
                display_name: self.filters.indicator_id.clone(),
                description: String::new(),
                parent_category: None,
            },
            ccvi_map_indicator_models::IndicatorDefinition::descriptor,
        )
    }

    #[must_use]
    pub fn header(&self) -> Header {
        let indicator = self.indicator();
        Header {
            title: DASHBOARD_TITLE.to_string(),
            indicator: indicator.display_name,
            description: indicator.description,
        }
    }

    #[must_use]
    pub fn legend(&self) -> Legend {
        Legend::new(
            &self.indicator().display_name,
            self.filters.boundary_level,
            self.filters.area_classification,
            self.loaded_once.then_some(self.features.len()),
        )
    }

    /// Summary statistics of the drawn layer.
    #[must_use]
    pub fn report(&self) -> Report {
        Report::from_records(&self.records)
    }

    /// The drawn layer as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Csv`] if writing fails.
    pub fn export_csv(&self) -> Result<String, DashboardError> {
        export::records_to_csv(&self.records)
    }
}

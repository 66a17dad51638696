//! Environment-driven configuration.

use ccvi_map_render::BackendConfig;
use ccvi_map_render::backend::DEFAULT_STYLE_URL;
use ccvi_map_source::resolve::DEFAULT_API_BASE_URL;

/// Settings needed to load and render the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base URL of the upstream CCVI API.
    pub api_base_url: String,
    pub backend: BackendConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            backend: BackendConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads `CCVI_API_BASE_URL`, `MAP_STYLE_URL` and `MAP_ACCESS_TOKEN`,
    /// falling back to defaults for anything unset or blank.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reads variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_base_url: get("CCVI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            backend: BackendConfig {
                style_url: get("MAP_STYLE_URL").unwrap_or_else(|| DEFAULT_STYLE_URL.to_string()),
                access_token: get("MAP_ACCESS_TOKEN"),
            },
        }
    }
}

//! HTTP handler functions for the CCVI map API.

use actix_web::{HttpResponse, web};
use ccvi_map_dashboard::{DashboardError, LoadedLayer, StatusBadge};
use ccvi_map_indicator::provinces as registry_provinces;
use ccvi_map_render::{
    GeoJsonLayerBackend, Legend, Popup, RenderBackend as _, RenderError, Viewport,
};
use ccvi_map_server_models::{
    ApiHealth, ApiMapResponse, ApiStatus, ExportRequest, ExportResponse, MapQueryParams,
    VulnerabilityFilter, VulnerabilityQueryParams,
};
use ccvi_map_source::{SourceError, location};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/indicators`
///
/// Lists the indicators known to the storage backend.
pub async fn indicators(state: web::Data<AppState>) -> HttpResponse {
    match state.storage.get_indicators().await {
        Ok(indicators) => HttpResponse::Ok().json(indicators),
        Err(e) => {
            log::error!("Failed to fetch indicators: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Failed to fetch indicators"
            }))
        }
    }
}

/// `GET /api/indicator-tree`
///
/// Returns the four CCVI components with their sub-indicators.
pub async fn indicator_tree(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.loader.registry().tree())
}

/// `GET /api/provinces`
pub async fn provinces() -> HttpResponse {
    match registry_provinces() {
        Ok(provinces) => HttpResponse::Ok().json(provinces),
        Err(e) => {
            log::error!("Failed to load provinces: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Failed to load provinces"
            }))
        }
    }
}

/// `GET /api/years`
///
/// Proxies the upstream year lookup.
pub async fn years(state: web::Data<AppState>) -> HttpResponse {
    match location::fetch_years(state.loader.fetcher(), state.loader.base_url()).await {
        Ok(years) => HttpResponse::Ok().json(years),
        Err(e) => {
            log::error!("Failed to fetch years: {e}");
            HttpResponse::BadGateway().json(serde_json::json!({
                "message": "Failed to fetch years"
            }))
        }
    }
}

/// `GET /api/vulnerability-data?state=&indicator=`
pub async fn vulnerability_data(
    state: web::Data<AppState>,
    params: web::Query<VulnerabilityQueryParams>,
) -> HttpResponse {
    let indicator_id = match params.indicator.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "message": format!("Invalid indicator id: {raw}")
                }));
            }
        },
    };
    let filter = VulnerabilityFilter {
        state: params.state.clone().filter(|s| !s.trim().is_empty()),
        indicator_id,
    };

    match state.storage.get_vulnerability_data(&filter).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            log::error!("Failed to fetch vulnerability data: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Failed to fetch vulnerability data"
            }))
        }
    }
}

/// `POST /api/export-data`
pub async fn export_data(
    state: web::Data<AppState>,
    body: web::Json<ExportRequest>,
) -> HttpResponse {
    let ExportRequest { format, filters } = body.into_inner();

    match state.storage.generate_export(format, &filters).await {
        Ok(data) => {
            log::info!("Exported {} records as {format}", data.record_count);
            HttpResponse::Ok().json(ExportResponse {
                success: true,
                data: Some(data),
                message: "Data exported successfully".to_string(),
            })
        }
        Err(e) => {
            log::error!("Failed to export data: {e}");
            HttpResponse::InternalServerError().json(ExportResponse {
                success: false,
                data: None,
                message: "Failed to export data".to_string(),
            })
        }
    }
}

/// `GET /api/map?indicator=&boundary=&province=&year=&areaClassification=`
///
/// Loads one layer through the shared loader and returns it as a styled
/// `GeoJSON` collection with its legend and popups.
pub async fn map(state: web::Data<AppState>, params: web::Query<MapQueryParams>) -> HttpResponse {
    let filters = params.to_filters();

    let loaded = match state.loader.load(&filters).await {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Failed to load layer {}: {e}", filters.cache_key());
            let status = api_status(&StatusBadge::Error(e.to_string()));
            let body = serde_json::json!({ "error": e.to_string(), "status": status });
            return match e {
                DashboardError::Source(SourceError::UnknownIndicator { .. }) => {
                    HttpResponse::BadRequest().json(body)
                }
                _ => HttpResponse::BadGateway().json(body),
            };
        }
    };

    match map_response(&state, &loaded) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("Failed to render layer {}: {e}", filters.cache_key());
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to render layer"
            }))
        }
    }
}

/// `GET /api/legend?indicator=&boundary=&areaClassification=`
///
/// Legend for a selection without loading its values.
pub async fn legend(
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let filters = params.to_filters();
    let Some(definition) = state.loader.registry().get(&filters.indicator_id) else {
        let error = SourceError::UnknownIndicator {
            id: filters.indicator_id,
        };
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": error.to_string() }));
    };

    HttpResponse::Ok().json(Legend::new(
        &definition.name,
        filters.boundary_level,
        filters.area_classification,
        None,
    ))
}

fn map_response(state: &AppState, loaded: &LoadedLayer) -> Result<ApiMapResponse, RenderError> {
    let mut backend = GeoJsonLayerBackend::new(state.config.backend.clone())?;
    backend.render(&loaded.layer.features, &Viewport::default())?;

    let indicator_name = &loaded.indicator.display_name;
    let popups: Vec<Popup> = loaded
        .layer
        .features
        .iter()
        .map(|feature| Popup::for_feature(feature, indicator_name))
        .collect();

    if let Some(error) = &loaded.boundary_error {
        log::warn!("Serving placeholder positions: {error}");
    }

    Ok(ApiMapResponse {
        features: backend.feature_collection()?,
        legend: Legend::new(
            indicator_name,
            loaded.filters.boundary_level,
            loaded.filters.area_classification,
            Some(loaded.layer.features.len()),
        ),
        status: api_status(&StatusBadge::Connected),
        source_url: loaded.request_url.clone(),
        placeholders: loaded.layer.placeholder_count(),
        popups,
    })
}

fn api_status(badge: &StatusBadge) -> ApiStatus {
    let state = match badge {
        StatusBadge::Connecting => "connecting",
        StatusBadge::Loading => "loading",
        StatusBadge::Connected => "connected",
        StatusBadge::Error(_) => "error",
    };
    ApiStatus {
        state: state.to_string(),
        label: badge.to_string(),
        color: badge.color().to_string(),
    }
}

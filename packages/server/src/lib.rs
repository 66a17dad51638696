#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the CCVI map.
//!
//! Serves the indicator catalogue, stored vulnerability scores and their
//! exports, and rendered map layers built from the upstream CCVI API.

mod export;
mod handlers;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use ccvi_map_dashboard::{DashboardConfig, LayerLoader};
use ccvi_map_indicator::IndicatorRegistry;
use ccvi_map_source::HttpFetcher;

pub use storage::{MemStorage, Storage, StorageError};

/// How often expired upstream payloads are dropped from the loader caches.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
pub struct AppState {
    /// Indicator catalogue and stored scores.
    pub storage: Arc<dyn Storage>,
    /// Memoizing layer loader over the upstream API.
    pub loader: LayerLoader,
    pub config: DashboardConfig,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/indicators", web::get().to(handlers::indicators))
            .route("/indicator-tree", web::get().to(handlers::indicator_tree))
            .route("/provinces", web::get().to(handlers::provinces))
            .route("/years", web::get().to(handlers::years))
            .route("/vulnerability-data", web::get().to(handlers::vulnerability_data))
            .route("/export-data", web::post().to(handlers::export_data))
            .route("/map", web::get().to(handlers::map))
            .route("/legend", web::get().to(handlers::legend)),
    );
}

/// Starts the CCVI map API server.
///
/// Loads the indicator registry, builds the upstream HTTP client, and
/// starts the Actix-Web HTTP server on `BIND_ADDR:PORT`. The caller is
/// responsible for the async runtime and for initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the registry or HTTP client
/// cannot be built, or if the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let config = DashboardConfig::from_env();
    log::info!("Using upstream API at {}", config.api_base_url);

    let registry = IndicatorRegistry::load().map_err(std::io::Error::other)?;
    let fetcher = HttpFetcher::new().map_err(std::io::Error::other)?;
    let loader = LayerLoader::new(Arc::new(fetcher), Arc::new(registry), &config.api_base_url);

    let purge_loader = loader.clone();
    actix_rt::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_loader.purge_expired();
            if purged > 0 {
                log::debug!("Purged {purged} expired cache entries");
            }
        }
    });

    let state = web::Data::new(AppState {
        storage: Arc::new(MemStorage::seeded()),
        loader,
        config,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

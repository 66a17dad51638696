#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the CCVI map pipeline.
//!
//! ```text
//! ccvi_map indicators [--tree]
//! ccvi_map resolve --indicator exposure --boundary tehsils --province 2
//! ccvi_map render --indicator vulnerability [--output layer.geojson]
//! ccvi_map export --format csv [--output areas.csv]
//! ccvi_map report --indicator sensitivity
//! ccvi_map serve
//! ```
//!
//! `CCVI_API_BASE_URL`, `MAP_STYLE_URL` and `MAP_ACCESS_TOKEN` override the
//! defaults.

use std::path::PathBuf;
use std::sync::Arc;

use ccvi_map_dashboard::export::records_to_json;
use ccvi_map_dashboard::{ApplyOutcome, DashboardConfig, DashboardController, LayerLoader};
use ccvi_map_indicator::IndicatorRegistry;
use ccvi_map_indicator_models::{AreaClassification, BoundaryLevel, DEFAULT_YEAR};
use ccvi_map_render::GeoJsonLayerBackend;
use ccvi_map_source::{HttpFetcher, resolve};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ccvi_map", about = "Pakistan CCVI map pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered indicators
    Indicators {
        /// Print the category tree as JSON instead of a table
        #[arg(long)]
        tree: bool,
    },
    /// Print the upstream URL a selection resolves to
    Resolve(FilterArgs),
    /// Load a layer and print it as GeoJSON
    Render {
        #[command(flatten)]
        filters: FilterArgs,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load a layer and export its records
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load a layer and print summary statistics
    Report(FilterArgs),
    /// Start the API server
    Serve,
}

#[derive(Args)]
struct FilterArgs {
    /// Indicator id (see `indicators`)
    #[arg(long, default_value = "vulnerability")]
    indicator: String,
    /// Boundary level: districts or tehsils
    #[arg(long, default_value = "districts")]
    boundary: BoundaryLevel,
    /// Province id to restrict to
    #[arg(long)]
    province: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: i32,
    /// Area classification: all, rural, or urban
    #[arg(long, default_value = "all")]
    area: AreaClassification,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

type Controller = DashboardController<GeoJsonLayerBackend>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = DashboardConfig::from_env();

    match cli.command {
        Commands::Indicators { tree } => {
            let registry = IndicatorRegistry::load()?;
            if tree {
                println!("{}", serde_json::to_string_pretty(&registry.tree())?);
                return Ok(());
            }

            println!("{:<36} {:<20} NAME", "ID", "CATEGORY");
            println!("{}", "-".repeat(90));
            for descriptor in registry.descriptors() {
                let category = descriptor
                    .parent_category
                    .map_or_else(|| "-".to_string(), |c| c.to_string());
                println!(
                    "{:<36} {:<20} {}",
                    descriptor.id, category, descriptor.display_name
                );
            }
            println!("\n{} indicator(s)", registry.all().len());
        }
        Commands::Resolve(filters) => {
            let loader = loader(&config)?;
            let mut controller = controller(&config, loader.clone())?;
            apply_filters(&mut controller, &filters)?;
            let request = loader.resolve(controller.filters())?;
            println!("{}", resolve::to_url(&request)?);
        }
        Commands::Render { filters, output } => {
            let controller = load(&config, &filters).await?;
            let collection = controller.backend().feature_collection()?;
            eprintln!("{}", controller.legend().summary);
            write_output(output, &serde_json::to_string_pretty(&collection)?)?;
        }
        Commands::Export {
            filters,
            format,
            output,
        } => {
            let controller = load(&config, &filters).await?;
            let body = match format {
                Format::Csv => controller.export_csv()?,
                Format::Json => records_to_json(controller.records())?,
            };
            write_output(output, &body)?;
        }
        Commands::Report(filters) => {
            let controller = load(&config, &filters).await?;
            let header = controller.header();
            println!("{}\n{}\n", header.indicator, header.description);
            println!("{}", serde_json::to_string_pretty(&controller.report())?);
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so run it on a blocking
            // thread instead of nesting it in this tokio runtime.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(ccvi_map_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}

fn loader(config: &DashboardConfig) -> Result<LayerLoader, Box<dyn std::error::Error>> {
    let registry = IndicatorRegistry::load()?;
    let fetcher = HttpFetcher::new()?;
    Ok(LayerLoader::new(
        Arc::new(fetcher),
        Arc::new(registry),
        &config.api_base_url,
    ))
}

fn controller(
    config: &DashboardConfig,
    loader: LayerLoader,
) -> Result<Controller, Box<dyn std::error::Error>> {
    let backend = GeoJsonLayerBackend::new(config.backend.clone())?;
    Ok(DashboardController::new(loader, backend))
}

/// Pushes the selection into the controller. Every setter that changes
/// something supersedes the previous pending load, so only the last one is
/// worth running.
fn apply_filters(
    controller: &mut Controller,
    filters: &FilterArgs,
) -> Result<Option<ccvi_map_dashboard::PendingLoad>, Box<dyn std::error::Error>> {
    let pending = [
        controller.set_indicator(&filters.indicator)?,
        controller.set_boundary_level(filters.boundary),
        controller.set_region(filters.province),
        controller.set_year(filters.year),
        controller.set_area_classification(filters.area),
    ];
    Ok(pending.into_iter().flatten().last())
}

async fn load(
    config: &DashboardConfig,
    filters: &FilterArgs,
) -> Result<Controller, Box<dyn std::error::Error>> {
    let mut controller = controller(config, loader(config)?)?;
    let pending = apply_filters(&mut controller, filters)?
        .unwrap_or_else(|| controller.begin_load());

    match controller.apply(pending.run().await) {
        ApplyOutcome::Applied(diff) => {
            log::info!(
                "Drew {} areas ({} added)",
                controller.features().len(),
                diff.added.len()
            );
            Ok(controller)
        }
        ApplyOutcome::Stale => Err("selection changed while loading".into()),
        ApplyOutcome::Failed(_) => Err(controller.status().to_string().into()),
    }
}

fn write_output(path: Option<PathBuf>, body: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(&path, body)?;
            log::info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_boundary_and_area_filters() {
        let cli = Cli::try_parse_from([
            "ccvi_map", "report", "--indicator", "exposure", "--boundary", "tehsils", "--area",
            "rural", "--province", "2",
        ])
        .unwrap();
        let Commands::Report(filters) = cli.command else {
            panic!("expected the report command");
        };
        assert_eq!(filters.indicator, "exposure");
        assert_eq!(filters.boundary, BoundaryLevel::Tehsils);
        assert_eq!(filters.area, AreaClassification::Rural);
        assert_eq!(filters.province, Some(2));
        assert_eq!(filters.year, DEFAULT_YEAR);
    }

    #[test]
    fn filter_defaults_match_dashboard_defaults() {
        let cli = Cli::try_parse_from(["ccvi_map", "resolve"]).unwrap();
        let Commands::Resolve(filters) = cli.command else {
            panic!("expected the resolve command");
        };
        assert_eq!(filters.boundary, BoundaryLevel::Districts);
        assert_eq!(filters.area, AreaClassification::All);
        assert_eq!(filters.province, None);
    }

    #[test]
    fn rejects_unknown_boundary() {
        assert!(Cli::try_parse_from(["ccvi_map", "render", "--boundary", "counties"]).is_err());
    }
}

//! Flood inundation map viewer CLI.
//!
//! Renders the flood-extent overlays of a reach at a stage into a
//! directory (one PNG plus placement JSON per raster), prints historical
//! quantiles, and lists the configured map regions.

mod canvas;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fim_common::{GeographicBounds, ReachFeature, ReachId};
use fim_pipeline::{
    FimApiClient, LayerVisibility, MapCanvas, Notification, Notifier, OverlayPipeline,
    PipelineConfig, QuantilesOutcome, QuantilesService, RegionsConfig, TracingNotifier, Viewport,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use renderer::RenderMode;
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use canvas::FileCanvas;

/// Approximate CONUS extent, the initial map view.
const CONUS_VIEW: (f64, f64, f64, f64) = (24.0, -125.0, 50.0, -66.0);

#[derive(Parser, Debug)]
#[command(name = "fim-viewer")]
#[command(about = "Flood inundation map overlays for river reaches")]
struct Cli {
    /// Inundation API base URL (overrides FIM_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Overlay rendering: binary, normalized or auto
    #[arg(long, global = true)]
    render_mode: Option<RenderMode>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the overlays of one reach at one stage
    Overlay {
        /// Reach identifier (COMID)
        #[arg(short, long, conflicts_with = "feature")]
        reach: Option<String>,

        /// Feature attributes as a JSON object, e.g. '{"COMID": 7086109}'
        #[arg(long)]
        feature: Option<String>,

        /// Stage in meters; must match a cataloged stage exactly
        #[arg(short, long)]
        stage: f64,

        /// Output directory for overlay PNG and JSON files
        #[arg(short, long, default_value = "overlays")]
        out: PathBuf,

        /// Region whose default zoom sets the viewport
        #[arg(long)]
        region: Option<String>,

        /// Regions YAML (built-in regions when omitted)
        #[arg(long, env = "FIM_REGIONS_CONFIG")]
        regions: Option<PathBuf>,
    },

    /// Print the historical flow quantiles of a reach
    Quantiles {
        #[arg(short, long)]
        reach: String,

        /// Calendar year the series are anchored to (default: current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// List map regions and their service URLs
    Regions {
        /// Regions YAML (built-in regions when omitted)
        #[arg(long, env = "FIM_REGIONS_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let prometheus = if cli.print_metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    let config = pipeline_config(&cli)?;

    match cli.command {
        Commands::Overlay {
            reach,
            feature,
            stage,
            out,
            region,
            regions,
        } => {
            let feature = reach_feature(reach, feature)?;
            let regions = load_regions(regions)?;
            run_overlay(&config, &regions, feature, stage, out, region.as_deref()).await?;
        }
        Commands::Quantiles { reach, year } => {
            let reach = ReachId::new(&reach).context("Reach id must not be empty")?;
            run_quantiles(&config, &reach, year).await?;
        }
        Commands::Regions { config: path } => {
            print_regions(&load_regions(path)?)?;
        }
    }

    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }

    Ok(())
}

fn pipeline_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env().context("Invalid environment configuration")?;
    if let Some(base) = &cli.api_base {
        config.api_base = base.clone();
    }
    if let Some(mode) = cli.render_mode {
        config.render_mode = mode;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_regions(path: Option<PathBuf>) -> Result<RegionsConfig> {
    match path {
        Some(path) => RegionsConfig::from_file(&path)
            .with_context(|| format!("Failed to load regions from {}", path.display())),
        None => Ok(RegionsConfig::default()),
    }
}

/// Feature attributes from `--feature` JSON, or a bare `--reach` id.
fn reach_feature(reach: Option<String>, feature: Option<String>) -> Result<ReachFeature> {
    let properties: Map<String, Value> = match (reach, feature) {
        (_, Some(json)) => serde_json::from_str(&json).context("--feature must be a JSON object")?,
        (Some(reach), None) => {
            let mut map = Map::new();
            map.insert("reach_id".to_string(), Value::String(reach));
            map
        }
        (None, None) => bail!("Either --reach or --feature is required"),
    };
    Ok(ReachFeature::new(properties))
}

async fn run_overlay(
    config: &PipelineConfig,
    regions: &RegionsConfig,
    feature: ReachFeature,
    stage: f64,
    out: PathBuf,
    region: Option<&str>,
) -> Result<()> {
    let zoom = match region {
        Some(name) => match regions.find(name) {
            Some(region) => f64::from(region.default_zoom),
            None => bail!("Unknown region '{}'", name),
        },
        None => 11.0,
    };
    let (south, west, north, east) = CONUS_VIEW;
    let viewport = Viewport {
        zoom,
        bounds: GeographicBounds::new(south, west, north, east),
    };

    let canvas = Arc::new(FileCanvas::create(&out, viewport).await?);
    let source = Arc::new(FimApiClient::new(config)?);
    let pipeline = OverlayPipeline::new(source, canvas.clone(), Arc::new(TracingNotifier), config);

    info!(
        api_base = config.api_base(),
        render_mode = %config.render_mode,
        out = %out.display(),
        "Rendering overlays"
    );
    let report = pipeline.select_reach(&feature, stage).await?;
    let visibility = LayerVisibility::for_viewport(&canvas.viewport().await, config);

    let summary = json!({
        "reach": report.reach,
        "name": feature.display_name(),
        "stage_m": report.stage_m,
        "flow_cms": report.flow_cms,
        "overlays": report.presented,
        "failed": report
            .failed
            .iter()
            .map(|(url, e)| json!({ "url": url, "error": e.to_string() }))
            .collect::<Vec<_>>(),
        "layers": visibility,
        "out_dir": canvas.dir().display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_quantiles(config: &PipelineConfig, reach: &ReachId, year: Option<i32>) -> Result<()> {
    let source = Arc::new(FimApiClient::new(config)?);
    let service = QuantilesService::new(source, config.quantiles_max_age());
    let notifier = TracingNotifier;

    let outcome = match year {
        Some(year) => service.fetch_or_load(reach, year).await,
        None => service.fetch_or_load_current(reach).await,
    };

    match outcome {
        Ok(QuantilesOutcome::Loaded { series, .. }) => {
            println!("{}", serde_json::to_string_pretty(series.as_ref())?);
        }
        Ok(QuantilesOutcome::NoData) => {
            notifier.notify(Notification::no_quantiles(reach));
        }
        Err(e) => {
            notifier.notify(Notification::quantiles_failed(reach, &e));
            return Err(e).context("Quantiles request failed");
        }
    }
    Ok(())
}

fn print_regions(regions: &RegionsConfig) -> Result<()> {
    let listing: Vec<Value> = regions
        .regions
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "title": r.title,
                "default_zoom": r.default_zoom,
                "erase_layer": r.erase_layer,
                "map_server": regions.map_server_url(r),
                "flowlines": regions.flowlines_url(r),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_from_reach_flag() {
        let feature = reach_feature(Some("7086109".to_string()), None).unwrap();
        assert_eq!(feature.reach_id().unwrap().as_str(), "7086109");
        assert_eq!(feature.display_name(), "UNNAMED RIVER");
    }

    #[test]
    fn test_feature_from_json() {
        let feature =
            reach_feature(None, Some(r#"{"COMID": 42, "river_name": "Flat Creek"}"#.to_string()))
                .unwrap();
        assert_eq!(feature.reach_id().unwrap().as_str(), "42");
        assert_eq!(feature.display_name(), "Flat Creek");
    }

    #[test]
    fn test_feature_requires_an_id_source() {
        assert!(reach_feature(None, None).is_err());
        assert!(reach_feature(None, Some("[1, 2]".to_string())).is_err());
    }

    #[test]
    fn test_cli_parses_overlay() {
        let cli = Cli::try_parse_from([
            "fim-viewer",
            "--render-mode",
            "binary",
            "overlay",
            "--reach",
            "7086109",
            "--stage",
            "2.5",
        ])
        .unwrap();
        assert_eq!(cli.render_mode, Some(RenderMode::Binary));
        assert!(matches!(cli.command, Commands::Overlay { stage, .. } if stage == 2.5));
    }
}

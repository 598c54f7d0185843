use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use outlet_coverage::app::ports::{HttpClientPort, IsochronePort, PoiSourcePort};
use outlet_coverage::app::{BatchPolicy, NearbyBusinessUseCase, ServiceAreaUseCase};
use outlet_coverage::config::Config;
use outlet_coverage::constants::DEFAULT_CONFIG_PATH;
use outlet_coverage::infra::{CachedIsochrones, CachedPoiSource, OrsIsochrones, OverpassSource, ReqwestHttp};
use outlet_coverage::outlets::{load_outlets, select_outlets};
use outlet_coverage::report::{category_shares, write_json, CoverageReport};
use outlet_coverage::{classify, logging, observability, Category, Tags};

#[derive(Parser)]
#[command(name = "outlet_coverage")]
#[command(about = "Business environment and service-area coverage for bank outlets")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print Prometheus metrics when the command finishes
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a tag set given as a JSON object, e.g. '{"shop": "bakery"}'
    Classify {
        #[arg(long)]
        tags: String,
    },
    /// List the outlets in the outlet listing
    Outlets,
    /// Survey businesses around the selected outlets
    Nearby {
        /// Outlet ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Search radius in kilometers
        #[arg(long)]
        radius_km: Option<f64>,
        /// Only list businesses of this category
        #[arg(long)]
        category: Option<Category>,
        /// Write the full result as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compute road-network service areas for the selected outlets
    ServiceArea {
        /// Outlet ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Travel distance in kilometers
        #[arg(long)]
        max_distance_km: Option<f64>,
        /// Write the merged GeoJSON report
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

const SELECT_HINT: &str = "👈 Select one or more outlets with --ids";

fn load_config(path: Option<&str>) -> Result<Config> {
    let (path, required) = match path {
        Some(p) => (p, true),
        None => (DEFAULT_CONFIG_PATH, false),
    };
    Config::load(path, required).with_context(|| format!("loading configuration from {}", path))
}

async fn run_nearby(
    config: &Config,
    http: Arc<dyn HttpClientPort>,
    ids: Vec<String>,
    radius_km: Option<f64>,
    category: Option<Category>,
    output: Option<PathBuf>,
) -> Result<()> {
    let outlets = load_outlets(&config.data.outlet_data, config.data.delimiter)
        .with_context(|| format!("reading outlets from {}", config.data.outlet_data))?;
    let selection = select_outlets(&outlets, &ids)?;

    let overpass: Arc<dyn PoiSourcePort> = Arc::new(OverpassSource::new(http, config.overpass.url.clone()));
    let source: Arc<dyn PoiSourcePort> = if config.cache.enabled {
        Arc::new(CachedPoiSource::new(overpass, config.overpass.url.clone()))
    } else {
        overpass
    };

    let radius_m = radius_km.unwrap_or(config.overpass.default_radius_km) * 1000.0;
    let use_case = NearbyBusinessUseCase::new(source, config.overpass.tag_filters.clone());
    let result = use_case.run_for_outlets(&selection, radius_m).await?;

    if result.center.is_none() {
        println!("{}", SELECT_HINT);
        return Ok(());
    }

    println!(
        "\n💵 Businesses within {} km: found {} points of interest",
        radius_m / 1000.0,
        result.total_found
    );
    for share in category_shares(&result) {
        println!("   {:<22} {:>5}  ({:.1}%)", share.category.label(), share.count, share.share * 100.0);
    }

    let listed: Vec<_> = match category {
        Some(c) => result.by_category(c),
        None => result.nodes.iter().collect(),
    };
    println!("\n📋 {} listed businesses", listed.len());
    for node in listed {
        println!(
            "   {} ({}, {} {}) @ {:.6}, {:.6}",
            node.display_name.as_deref().unwrap_or_default(),
            node.category,
            node.category.marker_color(),
            node.category.marker_icon(),
            node.coordinate.lat,
            node.coordinate.lon
        );
    }

    if let Some(path) = output {
        write_json(&path, &CoverageReport::new("nearby_businesses", &result))?;
    }
    Ok(())
}

async fn run_service_area(
    config: &Config,
    http: Arc<dyn HttpClientPort>,
    ids: Vec<String>,
    max_distance_km: Option<f64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let outlets = load_outlets(&config.data.outlet_data, config.data.delimiter)
        .with_context(|| format!("reading outlets from {}", config.data.outlet_data))?;
    let selection = select_outlets(&outlets, &ids)?;
    if selection.is_empty() {
        println!("{}", SELECT_HINT);
        return Ok(());
    }

    let ors: Arc<dyn IsochronePort> = Arc::new(OrsIsochrones::from_config(http, &config.isochrone)?);
    let port: Arc<dyn IsochronePort> = if config.cache.enabled {
        Arc::new(CachedIsochrones::new(ors, config.isochrone.url.clone()))
    } else {
        ors
    };

    let max_km = max_distance_km.unwrap_or(config.isochrone.default_max_distance_km);
    let use_case = ServiceAreaUseCase::new(port, BatchPolicy::from_config(&config.isochrone));
    let report = use_case.compute_for_outlets(&selection, max_km).await?;

    println!(
        "\n🚗 {} service areas ({} km) from {} batches",
        report.collection.len(),
        max_km,
        report.batch_count
    );
    for feature in &report.collection.features {
        let name = feature.properties.get("outlet_name").and_then(|v| v.as_str()).unwrap_or("?");
        println!(
            "   {:<30} area: {}  population: {}",
            name,
            feature.area().map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".into()),
            feature.total_pop().map(|p| format!("{:.0}", p)).unwrap_or_else(|| "-".into()),
        );
    }
    if !report.is_complete() {
        warn!("{} batches failed", report.failed_batches.len());
        println!("\n⚠️  Failed batches:");
        for failure in &report.failed_batches {
            println!(
                "   - batch {} (outlets {}..{}), {} attempts: {}",
                failure.index + 1,
                failure.start + 1,
                failure.end,
                failure.attempts,
                failure.reason
            );
        }
    }

    if let Some(path) = output {
        write_json(&path, &CoverageReport::new("service_areas", &report))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let _log_guard = logging::init_logging(&config.logging.dir);

    if cli.print_metrics {
        if let Err(e) = observability::init() {
            warn!("Metrics unavailable: {}", e);
        }
    }

    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(&config.http)?);

    let outcome = match cli.command {
        Commands::Classify { tags } => {
            let tags: Tags = serde_json::from_str(&tags).context("tags must be a JSON object of strings")?;
            println!("{}", classify(&tags));
            Ok(())
        }
        Commands::Outlets => {
            let outlets = load_outlets(&config.data.outlet_data, config.data.delimiter)
                .with_context(|| format!("reading outlets from {}", config.data.outlet_data))?;
            for outlet in &outlets {
                println!(
                    "{:<10} {:<5} {:<40} {:.6}, {:.6}",
                    outlet.id, outlet.kind, outlet.name, outlet.lat, outlet.lon
                );
            }
            info!("Listed {} outlets", outlets.len());
            Ok(())
        }
        Commands::Nearby {
            ids,
            radius_km,
            category,
            output,
        } => run_nearby(&config, http, ids, radius_km, category, output).await,
        Commands::ServiceArea {
            ids,
            max_distance_km,
            output,
        } => run_service_area(&config, http, ids, max_distance_km, output).await,
    };

    if let Err(e) = &outcome {
        error!("Command failed: {:#}", e);
    }

    if cli.print_metrics {
        if let Some(text) = observability::render() {
            println!("\n{}", text);
        }
    }
    outcome
}

//! route-cluster CLI - resolve a route or cluster a CSV of points
//!
//! Usage:
//!   route-cluster route --from <lat,lng> --to <lat,lng>
//!   route-cluster cluster <points.csv> (--radius <deg> | --zoom <level>)
//!
//! Provider endpoints default to the public services and can be overridden
//! with the ROUTE_* environment variables or the flags below.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use csv::ReaderBuilder;
use serde::Deserialize;

use route_cluster::cluster::radius_for_zoom;
use route_cluster::{
    ClusterConfig, ClusterEngine, Coordinate, GreedyClusterEngine, PointOfInterest, RouteRequest,
    RouteResolver, RoutingConfig,
};

#[derive(Parser)]
#[command(name = "route-cluster")]
#[command(about = "Route resolution and point clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a route between two coordinates
    Route {
        /// Origin as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,

        /// Destination as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,

        /// Override the primary provider base URL
        #[arg(long)]
        primary_url: Option<String>,

        /// Override the secondary provider base URL
        #[arg(long)]
        secondary_url: Option<String>,

        /// Override the OSRM base URL
        #[arg(long)]
        osrm_url: Option<String>,
    },

    /// Cluster points read from a CSV file (id,latitude,longitude[,weight])
    Cluster {
        input: PathBuf,

        /// Cluster radius in degrees
        #[arg(short, long, conflicts_with = "zoom")]
        radius: Option<f64>,

        /// Map zoom level; the radius is derived from --pixel-radius
        #[arg(short, long)]
        zoom: Option<f64>,

        /// Cluster radius in screen pixels when --zoom is used
        #[arg(long, default_value_t = 80.0)]
        pixel_radius: f64,
    },
}

#[derive(Debug, Deserialize)]
struct PointRecord {
    id: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    weight: Option<u32>,
}

fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", value))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    Coordinate::new(lat, lng).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Route {
            from,
            to,
            primary_url,
            secondary_url,
            osrm_url,
        } => run_route(from, to, primary_url, secondary_url, osrm_url),
        Commands::Cluster {
            input,
            radius,
            zoom,
            pixel_radius,
        } => run_cluster(&input, radius, zoom, pixel_radius),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_route(
    from: Coordinate,
    to: Coordinate,
    primary_url: Option<String>,
    secondary_url: Option<String>,
    osrm_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RoutingConfig::from_env();
    if let Some(url) = primary_url {
        config.primary.base_url = url;
    }
    if let Some(url) = secondary_url {
        config.secondary.base_url = url;
    }
    if let Some(url) = osrm_url {
        config.direct.base_url = url;
    }

    let resolver = RouteResolver::from_config(&config)?;
    let route = resolver.resolve(RouteRequest::new(from, to));

    println!("source:    {}", route.source);
    println!("distance:  {:.2} km", route.distance_km);
    println!("duration:  {:.1} min", route.duration_minutes);
    println!("points:    {}", route.geometry.len());
    if route.is_estimate {
        println!("note:      straight-line estimate, no road route available");
    }
    Ok(())
}

fn run_cluster(
    input: &Path,
    radius: Option<f64>,
    zoom: Option<f64>,
    pixel_radius: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClusterConfig {
        pixel_radius,
        ..ClusterConfig::default()
    };
    let radius = match (radius, zoom) {
        (Some(radius), _) => radius,
        (None, Some(zoom)) => radius_for_zoom(config.pixel_radius, zoom, config.tile_size),
        (None, None) => return Err("one of --radius or --zoom is required".into()),
    };

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(File::open(input)?);
    let mut points = Vec::new();
    for record in reader.deserialize::<PointRecord>() {
        let record = record?;
        let coordinate = Coordinate::new(record.latitude, record.longitude)?;
        let weight = record.weight.unwrap_or(1);
        points.push(PointOfInterest::new(record.id, coordinate).with_weight(weight));
    }

    let clusters = GreedyClusterEngine::new(config).cluster(&points, radius)?;
    println!(
        "{} points -> {} clusters (radius {:.6})",
        points.len(),
        clusters.len(),
        radius
    );
    for cluster in &clusters {
        println!(
            "{}\t{:.6},{:.6}\t{:?}\tweight={}\tmembers={}",
            cluster.id,
            cluster.centroid.latitude(),
            cluster.centroid.longitude(),
            cluster.size_tier,
            cluster.total_weight,
            cluster.members.iter().cloned().collect::<Vec<_>>().join(",")
        );
    }
    Ok(())
}

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;

use wayfinder_rs::geo_projector::{haversine_distance, project};
use wayfinder_rs::marker_source::MarkerSource;
use wayfinder_rs::types::{Coordinate, Heading};

/// Project a marker document around one fix and heading
#[derive(Parser, Debug)]
#[command(name = "project_markers")]
struct Args {
    /// Viewer latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Viewer longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Compass heading in degrees
    #[arg(long, allow_hyphen_values = true)]
    heading: f64,

    /// Marker document: a path (.json or .json.gz) or an http(s) URL
    #[arg(long)]
    markers: String,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct ProjectedMarker {
    x: f64,
    y: f64,
    distance_m: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let Some(heading) = Heading::new(args.heading) else {
        bail!("heading must be a finite number of degrees, got {}", args.heading);
    };
    let reference = Coordinate::new(args.lat, args.lon)?;

    let targets = MarkerSource::parse(&args.markers).fetch().await?;
    if targets.is_empty() {
        bail!("{} contains no markers", args.markers);
    }

    let projected: Vec<ProjectedMarker> = project(reference, heading, &targets)
        .into_iter()
        .zip(&targets)
        .map(|(point, &target)| ProjectedMarker {
            x: point.x,
            y: point.y,
            distance_m: haversine_distance(reference, target),
        })
        .collect();

    let json = if args.pretty {
        serde_json::to_string_pretty(&projected)?
    } else {
        serde_json::to_string(&projected)?
    };
    println!("{}", json);

    Ok(())
}

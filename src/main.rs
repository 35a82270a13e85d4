use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use wayfinder_rs::control_panel::{self, PanelState};
use wayfinder_rs::grid::{Marker, TileLayout};
use wayfinder_rs::live_status::LiveStatus;
use wayfinder_rs::marker_source::MarkerSource;
use wayfinder_rs::sensors;
use wayfinder_rs::types::{Coordinate, GpsFix, MotionSample, OrientationReading};
use wayfinder_rs::{EngineConfig, GridCommand, OverlaySession};

#[derive(Parser, Debug)]
#[command(name = "wayfinder")]
#[command(about = "Location-based AR overlay engine - markers on an endless floor grid", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the tile side length (metres)
    #[arg(long)]
    grid_size: Option<f64>,

    /// Marker document: a path (.json or .json.gz) or an http(s) URL
    #[arg(long)]
    markers: Option<String>,

    /// Output directory
    #[arg(long, default_value = "wayfinder_sessions")]
    output_dir: String,

    /// Serve the control panel on this port
    #[arg(long)]
    panel_port: Option<u16>,

    /// Start latitude for the mock GPS walk
    #[arg(long, default_value = "37.7749", allow_hyphen_values = true)]
    start_lat: f64,

    /// Start longitude for the mock GPS walk
    #[arg(long, default_value = "-122.4194", allow_hyphen_values = true)]
    start_lon: f64,

    /// Ignore device motion (manual moves only)
    #[arg(long)]
    no_motion: bool,
}

#[derive(Serialize)]
struct SessionSnapshot {
    status: LiveStatus,
    layout: TileLayout,
    markers: Vec<Marker>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(size) = args.grid_size {
        config.grid_size = size;
    }
    if args.no_motion {
        config.motion_tracking = false;
    }
    let start_coordinate = Coordinate::new(args.start_lat, args.start_lon)?;

    log::info!("[{}] Wayfinder starting", ts_now());
    log::info!("  Duration: {} seconds (0=continuous)", args.duration);
    log::info!("  Grid size: {} m", config.grid_size);
    log::info!("  Motion tracking: {}", config.motion_tracking);
    log::info!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir))?;

    let mut session = OverlaySession::new(config)?;

    // The full list must be in hand before the session sees any of it
    if let Some(source) = args.markers.as_deref().map(MarkerSource::parse) {
        match source.fetch().await {
            Ok(coordinates) => {
                session.on_markers_loaded(coordinates);
            }
            Err(e) => log::error!("Marker fetch failed, continuing without markers: {}", e),
        }
    }

    let (motion_tx, mut motion_rx) = mpsc::channel::<MotionSample>(500);
    let (orientation_tx, mut orientation_rx) = mpsc::channel::<OrientationReading>(100);
    let (gps_tx, mut gps_rx) = mpsc::channel::<GpsFix>(100);
    let (command_tx, mut command_rx) = mpsc::channel::<GridCommand>(64);

    let _motion_handle = tokio::spawn(sensors::motion_loop(motion_tx));
    let _orientation_handle = tokio::spawn(sensors::orientation_loop(orientation_tx));
    let _gps_handle = tokio::spawn(sensors::gps_loop(gps_tx, start_coordinate));

    let panel = PanelState::new(command_tx);
    if let Some(port) = args.panel_port {
        let panel = panel.clone();
        tokio::spawn(async move {
            if let Err(e) = control_panel::serve(panel, port).await {
                log::error!("Control panel stopped: {:#}", e);
            }
        });
    }

    let start = Utc::now();
    let mut last_status_update = Utc::now();

    log::info!("[{}] Session running", ts_now());

    loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                log::info!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        while let Ok(reading) = orientation_rx.try_recv() {
            session.on_orientation(&reading);
        }

        while let Ok(fix) = gps_rx.try_recv() {
            let _ = session.on_gps_fix(&fix);
        }

        while let Ok(sample) = motion_rx.try_recv() {
            if let Some(slot) = session.on_motion(&sample) {
                log::debug!("Viewer left the centre tile towards {}", slot);
            }
        }

        while let Ok(command) = command_rx.try_recv() {
            let outcome = session.apply(command);
            log::debug!("{:?} -> {:?}", command, outcome);
        }

        // Update live status every 2 seconds
        let now = Utc::now();
        if (now.signed_duration_since(last_status_update).num_seconds() as u64) >= 2 {
            let status = session.live_status(uptime_since(start));
            let status_path = format!("{}/live_status.json", args.output_dir);
            if let Err(e) = status.save(&status_path) {
                log::warn!("Failed to write {}: {}", status_path, e);
            }
            *panel.status.write().await = status;
            last_status_update = now;
        }

        sleep(Duration::from_millis(1)).await;
    }

    let final_status = session.live_status(uptime_since(start));
    let status_path = format!("{}/live_status_final.json", args.output_dir);
    final_status.save(&status_path)?;

    let snapshot = SessionSnapshot {
        status: final_status.clone(),
        layout: session.grid().layout(),
        markers: session
            .markers()
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default(),
    };
    let filename = format!("{}/session_{}_final.json", args.output_dir, ts_now_clean());
    std::fs::write(&filename, serde_json::to_string_pretty(&snapshot)?)?;
    log::info!("[{}] Final snapshot written to {}", ts_now(), filename);

    println!("\n=== Final Stats ===");
    println!("Motion samples: {}", final_status.motion_samples);
    println!("GPS fixes: {}", final_status.gps_fixes);
    println!("Markers placed: {}", final_status.markers_placed);
    match final_status.current_slot {
        Some(slot) => println!("Viewer slot: {}", slot),
        None => println!("Viewer slot: outside the neighbourhood"),
    }
    println!(
        "Pan offset: ({:.2}, {:.2}) m",
        final_status.x_offset, final_status.z_offset
    );

    Ok(())
}

fn uptime_since(start: chrono::DateTime<Utc>) -> u64 {
    Utc::now().signed_duration_since(start).num_seconds().max(0) as u64
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

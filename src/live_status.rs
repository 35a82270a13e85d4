use crate::grid::NeighborhoodSlot;
use crate::session::MarkerBearing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    // Sensor counters
    pub motion_samples: u64,
    pub orientation_readings: u64,
    pub rejected_orientation_readings: u64,
    pub gps_fixes: u64,
    pub rejected_gps_fixes: u64,
    pub commands_applied: u64,
    // Latest readings
    pub heading_deg: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    // Markers
    pub markers_loaded: usize,
    pub markers_placed: usize,
    pub nearest_marker: Option<MarkerBearing>,
    // Grid
    pub current_slot: Option<NeighborhoodSlot>,
    pub x_offset: f64,
    pub z_offset: f64,
    pub vertical_offset: f64,
    pub line_weight: f64,
    // Motion
    pub motion_tracking: bool,
    pub motion_speed: f64,
    pub rejected_motion_samples: u64,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            ..Self::default()
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

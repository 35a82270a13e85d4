use crate::error::{WayfinderError, WayfinderResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration.
///
/// Every field has a default so a config file only needs the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tile side length in metres
    pub grid_size: f64,
    /// Distance moved by one manual move command
    pub pan_step: f64,
    /// Height of the grid plane (cosmetic)
    pub vertical_offset: f64,
    /// Grid line weight (cosmetic)
    pub line_weight: f64,
    pub vertical_offset_range: (f64, f64),
    pub line_weight_range: (f64, f64),
    /// Feed device-motion samples into the grid
    pub motion_tracking: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            pan_step: 0.1,
            vertical_offset: 0.0,
            line_weight: 1.0,
            vertical_offset_range: (-5.0, 5.0),
            line_weight_range: (1.0, 10.0),
            motion_tracking: true,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> WayfinderResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            WayfinderError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: EngineConfig = serde_json::from_str(&json).map_err(|e| {
            WayfinderError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WayfinderResult<()> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(WayfinderError::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if !self.pan_step.is_finite() || self.pan_step <= 0.0 {
            return Err(WayfinderError::InvalidConfig(format!(
                "pan_step must be positive, got {}",
                self.pan_step
            )));
        }
        check_range("vertical_offset_range", self.vertical_offset_range)?;
        check_range("line_weight_range", self.line_weight_range)?;
        if !self.vertical_offset.is_finite() || !self.line_weight.is_finite() {
            return Err(WayfinderError::InvalidConfig(
                "vertical_offset and line_weight must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, (min, max): (f64, f64)) -> WayfinderResult<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(WayfinderError::InvalidConfig(format!(
            "{} must be an ordered finite pair, got ({}, {})",
            name, min, max
        )));
    }
    Ok(())
}

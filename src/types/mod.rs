pub mod linalg;

pub use linalg::*;

use crate::error::{WayfinderError, WayfinderResult};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// Geodetic coordinate in degrees (WGS84)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Validated constructor; rejects NaN/inf and out-of-range degrees
    pub fn new(latitude: f64, longitude: f64) -> WayfinderResult<Self> {
        let coordinate = Coordinate {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> WayfinderResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(WayfinderError::InvalidReading(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(WayfinderError::InvalidReading(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Metres on a locally flat plane around a reference coordinate.
///
/// In the scene convention `y` runs along scene `z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub const ORIGIN: PlanarPoint = PlanarPoint { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.to_vector().norm()
    }

    pub fn to_vector(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn from_vector(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }

    pub fn translated(self, delta: PanDelta) -> Self {
        Self {
            x: self.x + delta.dx,
            y: self.y + delta.dz,
        }
    }
}

impl Add for PlanarPoint {
    type Output = PlanarPoint;

    fn add(self, rhs: PlanarPoint) -> PlanarPoint {
        PlanarPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PlanarPoint {
    type Output = PlanarPoint;

    fn sub(self, rhs: PlanarPoint) -> PlanarPoint {
        PlanarPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// World position handed to a renderer
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ScenePoint {
    /// Lift a ground-plane point to scene space at the given height
    pub fn on_ground(point: PlanarPoint, height: f64) -> Self {
        Self {
            x: point.x,
            y: height,
            z: point.y,
        }
    }
}

/// Compass heading in degrees clockwise from north, normalised to [0, 360)
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Heading(f64);

impl Heading {
    pub fn new(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let normalised = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negatives
        Some(Heading(if normalised >= 360.0 { 0.0 } else { normalised }))
    }

    /// Filter a raw sensor value that may be missing
    pub fn from_reading(reading: Option<f64>) -> Option<Self> {
        reading.and_then(Heading::new)
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Translation in the ground plane (scene x, scene z)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PanDelta {
    pub dx: f64,
    pub dz: f64,
}

impl PanDelta {
    pub const ZERO: PanDelta = PanDelta { dx: 0.0, dz: 0.0 };

    pub fn new(dx: f64, dz: f64) -> Self {
        Self { dx, dz }
    }
}

impl Neg for PanDelta {
    type Output = PanDelta;

    fn neg(self) -> PanDelta {
        PanDelta::new(-self.dx, -self.dz)
    }
}

/// Device acceleration sample (m/s², gravity excluded).
///
/// Browsers and some Android builds report individual axes as null.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionSample {
    pub timestamp: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub interval_secs: f64,
}

impl MotionSample {
    pub fn new(timestamp: f64, x: f64, y: f64, z: f64, interval_secs: f64) -> Self {
        Self {
            timestamp,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            interval_secs,
        }
    }

    /// All three axes, if every one of them was reported and finite
    pub fn acceleration(&self) -> Option<Vec3> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) if x.is_finite() && y.is_finite() && z.is_finite() => {
                Some(Vec3::new(x, y, z))
            }
            _ => None,
        }
    }
}

/// Compass reading from the orientation collaborator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrientationReading {
    pub timestamp: f64,
    pub heading_deg: Option<f64>,
}

/// Geolocation fix
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GpsFix {
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

impl GpsFix {
    pub fn coordinate(&self) -> WayfinderResult<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

use crate::types::{MotionSample, PanDelta, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionState {
    pub velocity: (f64, f64, f64),
    pub position: (f64, f64, f64),
    pub speed: f64,
    pub samples: u64,
    pub rejected: u64,
}

/// Dead-reckoning from device acceleration.
///
/// Plain double integration: acceleration -> velocity -> position, once per
/// sample, using the interval the sensor reports. There is no bias removal,
/// no drift correction and no zero-velocity reset, so the position wanders
/// off over time even when the device is still.
pub struct MotionIntegrator {
    velocity: Vec3,
    position: Vec3,
    sample_count: u64,
    rejected_count: u64,
}

impl MotionIntegrator {
    pub fn new() -> Self {
        Self {
            velocity: Vec3::zeros(),
            position: Vec3::zeros(),
            sample_count: 0,
            rejected_count: 0,
        }
    }

    /// Integrate one sample and return the viewer displacement on the ground
    /// plane (device x -> scene x, device z -> scene z).
    ///
    /// Samples with a missing axis or an unusable interval are skipped.
    pub fn integrate(&mut self, sample: &MotionSample) -> Option<PanDelta> {
        let dt = sample.interval_secs;
        let accel = match sample.acceleration() {
            Some(accel) if dt.is_finite() && dt > 0.0 => accel,
            _ => {
                self.rejected_count += 1;
                log::debug!(
                    "Skipping motion sample at {:.3} (incomplete axes or interval {})",
                    sample.timestamp,
                    dt
                );
                return None;
            }
        };

        self.velocity += accel * dt;
        let step = self.velocity * dt;
        self.position += step;
        self.sample_count += 1;

        Some(PanDelta::new(step.x, step.z))
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn get_state(&self) -> MotionState {
        MotionState {
            velocity: (self.velocity.x, self.velocity.y, self.velocity.z),
            position: (self.position.x, self.position.y, self.position.z),
            speed: self.velocity.norm(),
            samples: self.sample_count,
            rejected: self.rejected_count,
        }
    }
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

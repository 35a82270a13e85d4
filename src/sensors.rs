use crate::live_status::current_timestamp;
use crate::types::{Coordinate, GpsFix, MotionSample, OrientationReading};
use std::process::Command;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

const MOTION_PERIOD: Duration = Duration::from_millis(20); // ~50Hz
const ORIENTATION_PERIOD: Duration = Duration::from_millis(100); // ~10Hz
const GPS_PERIOD: Duration = Duration::from_secs(1);

/// Every Nth mock compass reading comes back without a heading
const NULL_HEADING_EVERY: u64 = 25;

/// Forward one record; returns false once the receiver is gone
fn forward<T>(tx: &Sender<T>, item: T, name: &str, sent: &mut u64) -> bool {
    match tx.try_send(item) {
        Ok(_) => {
            *sent += 1;
            true
        }
        Err(TrySendError::Closed(_)) => {
            log::info!("[{}] Channel closed after {} samples", name, sent);
            false
        }
        Err(TrySendError::Full(_)) => {
            // Channel full, drop this sample
            true
        }
    }
}

pub async fn motion_loop(tx: Sender<MotionSample>) {
    let mut ticker = interval(MOTION_PERIOD);
    let mut sent = 0u64;
    let mut tick = 0u64;
    let mut last = Instant::now();
    let mut hardware = true;

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        // termux-sensor is tried until it fails once, then mock data takes over
        let reading = if hardware {
            let reading = read_linear_acceleration();
            if reading.is_none() {
                hardware = false;
                log::warn!("[motion] termux-sensor unavailable, using mock acceleration");
            }
            reading
        } else {
            None
        };
        let (x, y, z) = reading.unwrap_or_else(|| mock_acceleration(tick));
        tick += 1;

        let sample = MotionSample::new(current_timestamp(), x, y, z, dt);
        if !forward(&tx, sample, "motion", &mut sent) {
            break;
        }
        if sent > 0 && sent % 500 == 0 {
            log::debug!("[motion] {} samples", sent);
        }
    }
}

pub async fn orientation_loop(tx: Sender<OrientationReading>) {
    let mut ticker = interval(ORIENTATION_PERIOD);
    let mut sent = 0u64;
    let mut tick = 0u64;

    loop {
        ticker.tick().await;
        let reading = mock_orientation(tick);
        tick += 1;

        if !forward(&tx, reading, "orientation", &mut sent) {
            break;
        }
    }
}

pub async fn gps_loop(tx: Sender<GpsFix>, start: Coordinate) {
    let mut ticker = interval(GPS_PERIOD);
    let mut sent = 0u64;
    let mut tick = 0u64;

    loop {
        ticker.tick().await;
        let fix = mock_gps_fix(start, tick);
        tick += 1;

        if !forward(&tx, fix, "gps", &mut sent) {
            break;
        }
        log::debug!("[gps] {} fixes", sent);
    }
}

fn read_linear_acceleration() -> Option<(f64, f64, f64)> {
    let output = Command::new("termux-sensor")
        .args(["-n", "1", "-s", "linear_acceleration"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_sensor_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `x=.., y=.., z=..` pairs; all three axes must be present
fn parse_sensor_output(output: &str) -> Option<(f64, f64, f64)> {
    let mut x = None;
    let mut y = None;
    let mut z = None;

    for part in output.split(|c: char| c == ',' || c == ':') {
        let part = part.trim();
        if let Some(val) = part.strip_prefix("x=") {
            x = val.trim().parse().ok();
        } else if let Some(val) = part.strip_prefix("y=") {
            y = val.trim().parse().ok();
        } else if let Some(val) = part.strip_prefix("z=") {
            z = val.trim().parse().ok();
        }
    }

    Some((x?, y?, z?))
}

/// Gentle zero-mean sway, gravity already removed
fn mock_acceleration(tick: u64) -> (f64, f64, f64) {
    use std::f64::consts::PI;
    let t = tick as f64 * MOTION_PERIOD.as_secs_f64();
    (
        (t * 2.0 * PI).sin() * 0.05,
        (t * PI).sin() * 0.02,
        (t * 2.0 * PI).cos() * 0.05,
    )
}

/// Compass slowly sweeping clockwise
fn mock_orientation(tick: u64) -> OrientationReading {
    let heading_deg = if tick % NULL_HEADING_EVERY == NULL_HEADING_EVERY - 1 {
        None
    } else {
        Some((tick as f64 * 0.5).rem_euclid(360.0))
    };

    OrientationReading {
        timestamp: current_timestamp(),
        heading_deg,
    }
}

/// Walk north-east from `start`, about 1.5 m per fix
fn mock_gps_fix(start: Coordinate, tick: u64) -> GpsFix {
    let seq = tick as f64;
    GpsFix {
        timestamp: current_timestamp(),
        latitude: start.latitude + seq * 0.00001,
        longitude: start.longitude + seq * 0.00001,
        accuracy: Some(5.0 + (seq * 0.1).sin() * 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_sensor_output() {
        let parsed = parse_sensor_output("Linear acceleration event: x=0.5, y=-0.3, z=0.1, accuracy=3");
        assert_eq!(parsed, Some((0.5, -0.3, 0.1)));
    }

    #[test]
    fn test_parse_sensor_output_requires_all_axes() {
        assert_eq!(parse_sensor_output("x=0.5, y=0.3"), None);
        assert_eq!(parse_sensor_output("x=abc, y=0.3, z=1"), None);
        assert_eq!(parse_sensor_output(""), None);
    }

    #[test]
    fn test_mock_orientation_has_null_readings() {
        let readings: Vec<_> = (0..NULL_HEADING_EVERY * 2).map(mock_orientation).collect();
        let nulls = readings.iter().filter(|r| r.heading_deg.is_none()).count();
        assert_eq!(nulls, 2);
        assert!(readings
            .iter()
            .filter_map(|r| r.heading_deg)
            .all(|h| (0.0..360.0).contains(&h)));
    }

    #[test]
    fn test_mock_gps_starts_at_start() {
        let start = Coordinate {
            latitude: 51.5,
            longitude: -0.12,
        };
        let first = mock_gps_fix(start, 0);
        assert_eq!(first.latitude, 51.5);
        assert_eq!(first.longitude, -0.12);
        assert!(mock_gps_fix(start, 10).latitude > 51.5);
    }

    #[test]
    fn test_forward_stops_when_closed() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        let mut sent = 0;
        assert!(forward(&tx, 1, "test", &mut sent));
        // Full: dropped but the loop keeps going
        assert!(forward(&tx, 2, "test", &mut sent));
        assert_eq!(sent, 1);

        drop(rx);
        assert!(!forward(&tx, 3, "test", &mut sent));
    }

    #[tokio::test]
    async fn test_gps_loop_ends_when_receiver_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        let start = Coordinate {
            latitude: 0.0,
            longitude: 0.0,
        };
        let handle = tokio::spawn(gps_loop(tx, start));

        let fix = rx.recv().await.unwrap();
        assert_eq!(fix.latitude, 0.0);
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

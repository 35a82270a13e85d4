//! One AR overlay session
//!
//! `OverlaySession` owns every piece of engine state for as long as the AR
//! session lives: the tile grid, the marker sticks, the latest location and
//! heading, and the motion integrator. Sensor handlers and commands are
//! plain `&mut self` calls, so whoever owns the session is the only thing
//! that can mutate it.

use crate::config::EngineConfig;
use crate::controls::{CommandOutcome, GridCommand, GridReport};
use crate::error::{MissingInput, WayfinderError, WayfinderResult};
use crate::geo_projector::{haversine_distance, initial_bearing, project};
use crate::grid::{MarkerSet, NeighborhoodSlot, TileGrid};
use crate::live_status::{current_timestamp, LiveStatus};
use crate::motion::MotionIntegrator;
use crate::types::{
    Coordinate, GpsFix, Heading, MotionSample, OrientationReading, PanDelta, PlanarPoint,
};
use serde::{Deserialize, Serialize};

/// Great-circle distance and bearing from the viewer to a marker
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerBearing {
    pub index: usize,
    pub distance_m: f64,
    pub bearing_deg: f64,
}

#[derive(Clone, Debug, Default)]
struct SessionCounters {
    motion_samples: u64,
    orientation_readings: u64,
    rejected_orientation: u64,
    gps_fixes: u64,
    rejected_gps: u64,
    commands: u64,
}

pub struct OverlaySession {
    config: EngineConfig,
    grid: TileGrid,
    markers: Option<MarkerSet>,
    marker_coordinates: Vec<Coordinate>,
    location: Option<Coordinate>,
    heading: Option<Heading>,
    motion: MotionIntegrator,
    motion_tracking: bool,
    counters: SessionCounters,
}

impl OverlaySession {
    /// Start a session with the viewer at the scene origin.
    ///
    /// Fails with `InvalidConfig` if the config does not validate.
    pub fn new(config: EngineConfig) -> WayfinderResult<Self> {
        let mut grid = TileGrid::new(&config)?;
        grid.initialize(PlanarPoint::ORIGIN);

        Ok(Self {
            motion_tracking: config.motion_tracking,
            config,
            grid,
            markers: None,
            marker_coordinates: Vec::new(),
            location: None,
            heading: None,
            motion: MotionIntegrator::new(),
            counters: SessionCounters::default(),
        })
    }

    /// Keep the newest heading; null readings are dropped
    pub fn on_orientation(&mut self, reading: &OrientationReading) -> bool {
        match Heading::from_reading(reading.heading_deg) {
            Some(heading) => {
                self.heading = Some(heading);
                self.counters.orientation_readings += 1;
                self.try_place_markers();
                true
            }
            None => {
                self.counters.rejected_orientation += 1;
                log::debug!("Dropping orientation reading at {:.3} without heading", reading.timestamp);
                false
            }
        }
    }

    /// Keep the newest valid fix
    pub fn on_gps_fix(&mut self, fix: &GpsFix) -> WayfinderResult<Coordinate> {
        let coordinate = match fix.coordinate() {
            Ok(coordinate) => coordinate,
            Err(e) => {
                self.counters.rejected_gps += 1;
                log::debug!("Dropping GPS fix at {:.3}: {}", fix.timestamp, e);
                return Err(e);
            }
        };

        self.location = Some(coordinate);
        self.counters.gps_fixes += 1;
        self.try_place_markers();
        Ok(coordinate)
    }

    /// Hand over the fully fetched marker coordinates.
    ///
    /// Invalid entries are dropped. Once markers are placed, later lists are
    /// ignored.
    pub fn on_markers_loaded(&mut self, coordinates: Vec<Coordinate>) -> Option<usize> {
        if self.markers.is_some() {
            log::warn!(
                "Markers already placed, ignoring a new list of {}",
                coordinates.len()
            );
            return None;
        }

        let total = coordinates.len();
        self.marker_coordinates = coordinates
            .into_iter()
            .filter(|c| c.validate().is_ok())
            .collect();
        if self.marker_coordinates.len() < total {
            log::warn!(
                "Dropped {} invalid marker coordinates",
                total - self.marker_coordinates.len()
            );
        }
        self.try_place_markers()
    }

    /// Project the marker coordinates around the current fix and heading.
    ///
    /// Refuses until heading, location and a non-empty marker list are all
    /// present.
    pub fn project_markers(&self) -> WayfinderResult<Vec<PlanarPoint>> {
        let heading = self.heading.ok_or(MissingInput::Heading)?;
        let reference = self.location.ok_or(MissingInput::Location)?;
        if self.marker_coordinates.is_empty() {
            return Err(WayfinderError::MissingInput(MissingInput::Markers));
        }
        Ok(project(reference, heading, &self.marker_coordinates))
    }

    /// Feed one device-motion sample; pans the world against the viewer
    pub fn on_motion(&mut self, sample: &MotionSample) -> Option<NeighborhoodSlot> {
        self.counters.motion_samples += 1;
        if !self.motion_tracking {
            return None;
        }
        let displacement = self.motion.integrate(sample)?;
        self.pan(-displacement)
    }

    /// Move grid and markers by the same delta
    pub fn pan(&mut self, delta: PanDelta) -> Option<NeighborhoodSlot> {
        let recycled = self.grid.pan(delta);
        if let Some(markers) = self.markers.as_mut() {
            markers.pan(delta);
        }
        recycled
    }

    pub fn apply(&mut self, command: GridCommand) -> CommandOutcome {
        self.counters.commands += 1;

        match command {
            GridCommand::GoForward
            | GridCommand::GoBackward
            | GridCommand::GoLeft
            | GridCommand::GoRight => {
                let delta = command
                    .pan_delta(self.config.pan_step)
                    .unwrap_or(PanDelta::ZERO);
                let recycled = self.pan(delta);
                CommandOutcome::Panned {
                    recycled,
                    layout: self.grid.layout(),
                }
            }
            GridCommand::ReportValues => CommandOutcome::Report(self.report()),
            GridCommand::SetVerticalOffset { value } => {
                CommandOutcome::Appearance(self.grid.set_vertical_offset(value))
            }
            GridCommand::SetLineWeight { value } => {
                CommandOutcome::Appearance(self.grid.set_line_weight(value))
            }
            GridCommand::SetMotionTracking { enabled } => {
                self.motion_tracking = enabled;
                log::info!("Motion tracking {}", if enabled { "on" } else { "off" });
                CommandOutcome::MotionTracking { enabled }
            }
        }
    }

    pub fn report(&self) -> GridReport {
        let offset = self.grid.pan_offset();
        GridReport {
            current_slot: self.grid.locate_viewer_slot(),
            x_offset: offset.x,
            z_offset: offset.y,
        }
    }

    /// Closest marker to the current fix
    pub fn nearest_marker(&self) -> Option<MarkerBearing> {
        let here = self.location?;
        self.marker_coordinates
            .iter()
            .enumerate()
            .map(|(index, &target)| MarkerBearing {
                index,
                distance_m: haversine_distance(here, target),
                bearing_deg: initial_bearing(here, target),
            })
            .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
    }

    pub fn live_status(&self, uptime_seconds: u64) -> LiveStatus {
        let report = self.report();
        let motion = self.motion.get_state();
        LiveStatus {
            timestamp: current_timestamp(),
            uptime_seconds,
            motion_samples: self.counters.motion_samples,
            orientation_readings: self.counters.orientation_readings,
            rejected_orientation_readings: self.counters.rejected_orientation,
            gps_fixes: self.counters.gps_fixes,
            rejected_gps_fixes: self.counters.rejected_gps,
            commands_applied: self.counters.commands,
            heading_deg: self.heading.map(|h| h.degrees()),
            latitude: self.location.map(|c| c.latitude),
            longitude: self.location.map(|c| c.longitude),
            markers_loaded: self.marker_coordinates.len(),
            markers_placed: self.markers.as_ref().map_or(0, MarkerSet::len),
            nearest_marker: self.nearest_marker(),
            current_slot: report.current_slot,
            x_offset: report.x_offset,
            z_offset: report.z_offset,
            vertical_offset: self.grid.vertical_offset(),
            line_weight: self.grid.line_weight(),
            motion_tracking: self.motion_tracking,
            motion_speed: motion.speed,
            rejected_motion_samples: motion.rejected,
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn markers(&self) -> Option<&MarkerSet> {
        self.markers.as_ref()
    }

    pub fn heading(&self) -> Option<Heading> {
        self.heading
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.location
    }

    pub fn motion_tracking(&self) -> bool {
        self.motion_tracking
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn try_place_markers(&mut self) -> Option<usize> {
        if self.markers.is_some() {
            return None;
        }

        match self.project_markers() {
            Ok(points) => {
                let viewer = self.grid.viewer().unwrap_or(PlanarPoint::ORIGIN);
                let set = MarkerSet::from_points(points.into_iter().map(|p| viewer + p).collect());
                let count = set.len();
                log::info!("Placed {} markers", count);
                self.markers = Some(set);
                Some(count)
            }
            Err(e) => {
                log::debug!("Markers not placed yet: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn heading(deg: f64) -> OrientationReading {
        OrientationReading {
            timestamp: 0.0,
            heading_deg: Some(deg),
        }
    }

    fn fix(lat: f64, lon: f64) -> GpsFix {
        GpsFix {
            timestamp: 0.0,
            latitude: lat,
            longitude: lon,
            accuracy: Some(5.0),
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate {
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_projection_waits_for_every_input() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        assert_eq!(
            session.project_markers(),
            Err(WayfinderError::MissingInput(MissingInput::Heading))
        );

        session.on_orientation(&heading(0.0));
        assert_eq!(
            session.project_markers(),
            Err(WayfinderError::MissingInput(MissingInput::Location))
        );

        session.on_gps_fix(&fix(0.0, 0.0)).unwrap();
        assert_eq!(
            session.project_markers(),
            Err(WayfinderError::MissingInput(MissingInput::Markers))
        );
        assert!(session.markers().is_none());

        assert_eq!(session.on_markers_loaded(vec![coord(0.0, 0.001)]), Some(1));
        let markers = session.markers().unwrap();
        assert_eq!(markers.len(), 1);
        assert!(markers.positions()[0].x > 110.0);
    }

    #[test]
    fn test_empty_marker_list_is_missing_input() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_orientation(&heading(10.0));
        session.on_gps_fix(&fix(1.0, 1.0)).unwrap();
        assert_eq!(session.on_markers_loaded(Vec::new()), None);
        assert_eq!(
            session.project_markers(),
            Err(WayfinderError::MissingInput(MissingInput::Markers))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let inverted = EngineConfig {
            vertical_offset_range: (5.0, -5.0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            OverlaySession::new(inverted),
            Err(WayfinderError::InvalidConfig(_))
        ));

        let zero_size = EngineConfig {
            grid_size: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            OverlaySession::new(zero_size),
            Err(WayfinderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejected_motion_samples_reported() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_motion(&MotionSample::new(0.0, 1.0, 0.0, 0.0, 0.0));
        session.on_motion(&MotionSample::new(0.0, 1.0, 0.0, 0.0, 0.5));

        let status = session.live_status(0);
        assert_eq!(status.motion_samples, 2);
        assert_eq!(status.rejected_motion_samples, 1);
        assert_abs_diff_eq!(status.motion_speed, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_null_heading_is_filtered() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        let accepted = session.on_orientation(&OrientationReading {
            timestamp: 1.0,
            heading_deg: None,
        });
        assert!(!accepted);
        assert!(session.heading().is_none());
        assert_eq!(session.live_status(0).rejected_orientation_readings, 1);
    }

    #[test]
    fn test_invalid_fix_rejected() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        assert!(session.on_gps_fix(&fix(120.0, 0.0)).is_err());
        assert!(session.location().is_none());
        assert_eq!(session.live_status(0).rejected_gps_fixes, 1);
    }

    #[test]
    fn test_markers_placed_once() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_markers_loaded(vec![coord(0.0, 0.001), coord(0.001, 0.0)]);
        session.on_gps_fix(&fix(0.0, 0.0)).unwrap();
        session.on_orientation(&heading(0.0));
        let placed = session.markers().unwrap().positions();

        // A new heading does not re-project
        session.on_orientation(&heading(90.0));
        assert_eq!(session.markers().unwrap().positions(), placed);

        // A second list is ignored
        assert_eq!(session.on_markers_loaded(vec![coord(5.0, 5.0)]), None);
        assert_eq!(session.markers().unwrap().len(), 2);
    }

    #[test]
    fn test_manual_commands_move_grid_and_markers() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_orientation(&heading(0.0));
        session.on_gps_fix(&fix(0.0, 0.0)).unwrap();
        session.on_markers_loaded(vec![coord(0.0, 0.0001)]);
        let marker_before = session.markers().unwrap().positions()[0];

        match session.apply(GridCommand::GoLeft) {
            CommandOutcome::Panned { recycled, layout } => {
                assert_eq!(recycled, None);
                assert_eq!(layout.tiles.len(), 9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let marker_after = session.markers().unwrap().positions()[0];
        assert_abs_diff_eq!(marker_after.x - marker_before.x, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(session.grid().pan_offset().x, 0.1, epsilon = 1e-12);

        match session.apply(GridCommand::ReportValues) {
            CommandOutcome::Report(report) => {
                assert_eq!(report.current_slot, Some(NeighborhoodSlot::Center));
                assert_abs_diff_eq!(report.x_offset, 0.1, epsilon = 1e-12);
                assert_eq!(report.z_offset, 0.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_appearance_commands() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        match session.apply(GridCommand::SetVerticalOffset { value: -1.5 }) {
            CommandOutcome::Appearance(layout) => {
                assert_eq!(layout.vertical_offset, -1.5);
                assert!(layout.tiles.iter().all(|t| t.position.y == -1.5));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        match session.apply(GridCommand::SetLineWeight { value: 3.0 }) {
            CommandOutcome::Appearance(layout) => assert_eq!(layout.line_weight, 3.0),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_motion_pans_world_against_viewer() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_motion(&MotionSample::new(0.0, 2.0, 0.0, 0.0, 0.1));

        // Viewer accelerated towards +x, so the ground moved towards -x
        let offset = session.grid().pan_offset();
        assert!(offset.x < 0.0);
        assert_abs_diff_eq!(offset.x, -0.02, epsilon = 1e-12);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn test_motion_tracking_toggle() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.apply(GridCommand::SetMotionTracking { enabled: false });
        session.on_motion(&MotionSample::new(0.0, 2.0, 0.0, 2.0, 0.1));

        assert_eq!(session.grid().pan_offset(), PlanarPoint::ORIGIN);
        let status = session.live_status(5);
        assert_eq!(status.motion_samples, 1);
        assert!(!status.motion_tracking);
        assert_eq!(status.uptime_seconds, 5);
    }

    #[test]
    fn test_nearest_marker() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_markers_loaded(vec![coord(0.01, 0.0), coord(0.0, 0.001), coord(-0.5, 0.0)]);
        assert!(session.nearest_marker().is_none());

        session.on_gps_fix(&fix(0.0, 0.0)).unwrap();
        let nearest = session.nearest_marker().unwrap();
        assert_eq!(nearest.index, 1);
        assert_abs_diff_eq!(nearest.bearing_deg, 90.0, epsilon = 1e-6);
        assert!((nearest.distance_m - 111.19).abs() < 0.5);
    }

    #[test]
    fn test_invalid_marker_coordinates_dropped() {
        let mut session = OverlaySession::new(EngineConfig::default()).unwrap();
        session.on_markers_loaded(vec![coord(0.0, 0.001), coord(95.0, 0.0)]);
        assert_eq!(session.live_status(0).markers_loaded, 1);
    }
}

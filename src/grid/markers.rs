use crate::types::{PanDelta, PlanarPoint, ScenePoint};
use serde::Serialize;

/// Stick cylinder radius in metres
pub const STICK_RADIUS_M: f64 = 0.3;
/// Stick cylinder height in metres
pub const STICK_HEIGHT_M: f64 = 1.5;

/// A marker stick anchored to a projected coordinate
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub id: usize,
    /// Position from the geo projection
    pub anchor: PlanarPoint,
    /// Sum of every pan applied since placement
    pub offset: PlanarPoint,
}

impl Marker {
    pub fn position(&self) -> PlanarPoint {
        self.anchor + self.offset
    }

    /// Sticks stand on scene height 0
    pub fn scene_position(&self) -> ScenePoint {
        ScenePoint::on_ground(self.position(), 0.0)
    }
}

/// Marker sticks that move with the ground.
///
/// Markers are not pooled; their offsets grow for as long as the session
/// pans, which is fine for a handful of markers.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn from_points(points: Vec<PlanarPoint>) -> Self {
        let markers = points
            .into_iter()
            .enumerate()
            .map(|(id, anchor)| Marker {
                id,
                anchor,
                offset: PlanarPoint::ORIGIN,
            })
            .collect();
        MarkerSet { markers }
    }

    /// Translate every marker by the same delta as the grid
    pub fn pan(&mut self, delta: PanDelta) {
        for marker in self.markers.iter_mut() {
            marker.offset = marker.offset.translated(delta);
        }
    }

    pub fn positions(&self) -> Vec<PlanarPoint> {
        self.markers.iter().map(Marker::position).collect()
    }

    pub fn scene_positions(&self) -> Vec<ScenePoint> {
        self.markers.iter().map(Marker::scene_position).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

use super::slot::{NeighborhoodSlot, TileId, TILE_COUNT};
use crate::config::EngineConfig;
use crate::error::WayfinderResult;
use crate::types::{PanDelta, PlanarPoint, ScenePoint};
use serde::Serialize;

const IDENTITY: [TileId; TILE_COUNT] = [
    TileId(0),
    TileId(1),
    TileId(2),
    TileId(3),
    TileId(4),
    TileId(5),
    TileId(6),
    TileId(7),
    TileId(8),
];

/// One tile as a renderer should place it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TilePlacement {
    pub slot: NeighborhoodSlot,
    pub tile: TileId,
    pub position: ScenePoint,
}

/// Full grid state derived after a mutation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileLayout {
    pub tiles: Vec<TilePlacement>,
    pub vertical_offset: f64,
    pub line_weight: f64,
}

/// Endless floor grid built from a fixed pool of 9 tiles
///
/// # Architecture
/// - Tile centres are stored per physical tile (`TileId`)
/// - `slots` maps each neighbourhood slot to the tile occupying it
/// - Panning translates every tile; once the viewer stands over a
///   neighbour tile, that tile is promoted to the centre slot and the other
///   eight are laid out around it again
///
/// Recycling only ever promotes one slot. A pan that carries the viewer
/// past the whole 3x3 block in one step leaves the viewer outside every
/// tile; the permutation is then kept as is until the viewer re-enters.
///
/// # Usage
/// ```
/// use wayfinder_rs::config::EngineConfig;
/// use wayfinder_rs::grid::{NeighborhoodSlot, TileGrid};
/// use wayfinder_rs::types::{PanDelta, PlanarPoint};
///
/// let config = EngineConfig { grid_size: 10.0, ..EngineConfig::default() };
/// let mut grid = TileGrid::new(&config).unwrap();
/// grid.initialize(PlanarPoint::ORIGIN);
///
/// grid.pan(PanDelta::new(12.0, 0.0));
/// assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::West));
///
/// grid.pan(PanDelta::ZERO);
/// assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::Center));
/// ```
#[derive(Clone, Debug)]
pub struct TileGrid {
    grid_size: f64,
    centers: [PlanarPoint; TILE_COUNT],
    slots: [TileId; TILE_COUNT],
    viewer: Option<PlanarPoint>,
    viewer_lost: bool,
    pan_offset: PlanarPoint,
    vertical_offset: f64,
    line_weight: f64,
    vertical_offset_range: (f64, f64),
    line_weight_range: (f64, f64),
}

impl TileGrid {
    /// Create a grid laid out around the scene origin with no viewer yet.
    ///
    /// The config is validated first; a zero grid size or an inverted range
    /// is rejected with `InvalidConfig`.
    pub fn new(config: &EngineConfig) -> WayfinderResult<Self> {
        config.validate()?;
        let (v_min, v_max) = config.vertical_offset_range;
        let (w_min, w_max) = config.line_weight_range;

        let mut grid = TileGrid {
            grid_size: config.grid_size,
            centers: [PlanarPoint::ORIGIN; TILE_COUNT],
            slots: IDENTITY,
            viewer: None,
            viewer_lost: false,
            pan_offset: PlanarPoint::ORIGIN,
            vertical_offset: config.vertical_offset.clamp(v_min, v_max),
            line_weight: config.line_weight.clamp(w_min, w_max),
            vertical_offset_range: config.vertical_offset_range,
            line_weight_range: config.line_weight_range,
        };
        grid.relayout(PlanarPoint::ORIGIN);
        Ok(grid)
    }

    /// Lay the 3x3 block out around `origin` and make it the viewer position
    pub fn initialize(&mut self, origin: PlanarPoint) {
        self.viewer = Some(origin);
        self.viewer_lost = false;
        self.slots = IDENTITY;
        self.pan_offset = PlanarPoint::ORIGIN;
        let center = self.snap(origin);
        self.relayout(center);
        log::debug!(
            "Grid initialised at ({:.2}, {:.2}), centre tile at ({:.2}, {:.2})",
            origin.x,
            origin.y,
            center.x,
            center.y
        );
    }

    /// Update the viewer position (AR camera tracking)
    pub fn set_viewer(&mut self, position: PlanarPoint) {
        self.viewer = Some(position);
    }

    /// Recycle against the current layout, then translate every tile.
    ///
    /// Returns the slot whose tile was promoted to the centre, if any.
    pub fn pan(&mut self, delta: PanDelta) -> Option<NeighborhoodSlot> {
        let recycled = self.recycle();

        for center in self.centers.iter_mut() {
            *center = center.translated(delta);
        }
        self.pan_offset = self.pan_offset.translated(delta);

        recycled
    }

    /// Slot whose square (centre ± half a tile) contains the viewer.
    ///
    /// The centre slot is tested first so a viewer on a shared edge stays
    /// put. `None` without a viewer or outside the whole neighbourhood.
    pub fn locate_viewer_slot(&self) -> Option<NeighborhoodSlot> {
        let viewer = self.viewer?;
        let half = self.grid_size / 2.0;

        std::iter::once(NeighborhoodSlot::Center)
            .chain(
                NeighborhoodSlot::ALL
                    .into_iter()
                    .filter(|slot| !slot.is_center()),
            )
            .find(|&slot| {
                let center = self.slot_center(slot);
                (viewer.x - center.x).abs() <= half && (viewer.y - center.y).abs() <= half
            })
    }

    /// Set the grid height and return the recomputed layout
    pub fn set_vertical_offset(&mut self, value: f64) -> TileLayout {
        if value.is_finite() {
            let (min, max) = self.vertical_offset_range;
            self.vertical_offset = value.clamp(min, max);
        } else {
            log::debug!("Ignoring non-finite vertical offset {}", value);
        }
        self.layout()
    }

    /// Set the grid line weight and return the recomputed layout
    pub fn set_line_weight(&mut self, value: f64) -> TileLayout {
        if value.is_finite() {
            let (min, max) = self.line_weight_range;
            self.line_weight = value.clamp(min, max);
        } else {
            log::debug!("Ignoring non-finite line weight {}", value);
        }
        self.layout()
    }

    pub fn layout(&self) -> TileLayout {
        let tiles = NeighborhoodSlot::ALL
            .iter()
            .map(|&slot| TilePlacement {
                slot,
                tile: self.tile_in(slot),
                position: self.world_position(slot),
            })
            .collect();

        TileLayout {
            tiles,
            vertical_offset: self.vertical_offset,
            line_weight: self.line_weight,
        }
    }

    /// Slot -> tile assignment in slot order
    pub fn permutation(&self) -> [TileId; TILE_COUNT] {
        self.slots
    }

    pub fn tile_in(&self, slot: NeighborhoodSlot) -> TileId {
        self.slots[slot.index()]
    }

    pub fn tile_position(&self, tile: TileId) -> PlanarPoint {
        self.centers[tile.index()]
    }

    pub fn slot_center(&self, slot: NeighborhoodSlot) -> PlanarPoint {
        self.tile_position(self.tile_in(slot))
    }

    pub fn center_position(&self) -> PlanarPoint {
        self.slot_center(NeighborhoodSlot::Center)
    }

    pub fn world_position(&self, slot: NeighborhoodSlot) -> ScenePoint {
        ScenePoint::on_ground(self.slot_center(slot), self.vertical_offset)
    }

    /// Sum of every pan since `initialize` (diagnostic only)
    pub fn pan_offset(&self) -> PlanarPoint {
        self.pan_offset
    }

    pub fn viewer(&self) -> Option<PlanarPoint> {
        self.viewer
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn vertical_offset(&self) -> f64 {
        self.vertical_offset
    }

    pub fn line_weight(&self) -> f64 {
        self.line_weight
    }

    fn recycle(&mut self) -> Option<NeighborhoodSlot> {
        let slot = match self.locate_viewer_slot() {
            Some(slot) => slot,
            None => {
                if let Some(viewer) = self.viewer {
                    if !self.viewer_lost {
                        log::warn!(
                            "Viewer at ({:.2}, {:.2}) left the tracked neighbourhood, keeping tile assignment",
                            viewer.x,
                            viewer.y
                        );
                        self.viewer_lost = true;
                    }
                }
                return None;
            }
        };

        if self.viewer_lost {
            log::info!("Viewer back inside the tracked neighbourhood ({})", slot);
            self.viewer_lost = false;
        }

        if slot.is_center() {
            return None;
        }

        let center = NeighborhoodSlot::Center.index();
        self.slots.swap(slot.index(), center);
        let anchor = self.centers[self.slots[center].index()];
        self.relayout(anchor);

        log::debug!(
            "Recycled {}: {} now centred at ({:.2}, {:.2})",
            slot,
            self.slots[center],
            anchor.x,
            anchor.y
        );
        Some(slot)
    }

    /// Position all nine tiles around `center` according to the permutation
    fn relayout(&mut self, center: PlanarPoint) {
        for slot in NeighborhoodSlot::ALL {
            let (col, row) = slot.offset();
            let tile = self.slots[slot.index()];
            self.centers[tile.index()] = PlanarPoint::new(
                center.x + f64::from(col) * self.grid_size,
                center.y + f64::from(row) * self.grid_size,
            );
        }
    }

    fn snap(&self, point: PlanarPoint) -> PlanarPoint {
        PlanarPoint::new(
            (point.x / self.grid_size).round() * self.grid_size,
            (point.y / self.grid_size).round() * self.grid_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WayfinderError;
    use approx::assert_abs_diff_eq;
    use std::collections::HashSet;

    fn grid_with_size(size: f64) -> TileGrid {
        let config = EngineConfig {
            grid_size: size,
            ..EngineConfig::default()
        };
        TileGrid::new(&config).unwrap()
    }

    fn assert_bijection(grid: &TileGrid) {
        let tiles: HashSet<TileId> = grid.permutation().iter().copied().collect();
        assert_eq!(tiles.len(), TILE_COUNT);
        assert!(tiles.iter().all(|tile| tile.index() < TILE_COUNT));
    }

    fn assert_neighbours_adjacent(grid: &TileGrid) {
        let center = grid.center_position();
        let size = grid.grid_size();
        let mut seen = HashSet::new();

        for slot in NeighborhoodSlot::ALL {
            let p = grid.slot_center(slot);
            let col = ((p.x - center.x) / size).round() as i8;
            let row = ((p.y - center.y) / size).round() as i8;
            assert_eq!((col, row), slot.offset(), "slot {} misplaced", slot);
            assert_abs_diff_eq!(p.x - center.x, f64::from(col) * size, epsilon = 1e-9);
            assert_abs_diff_eq!(p.y - center.y, f64::from(row) * size, epsilon = 1e-9);
            assert!(seen.insert((col, row)));
        }
    }

    #[test]
    fn test_initialize_identity_and_snapped_center() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::new(12.4, -7.6));

        assert_eq!(grid.permutation(), IDENTITY);
        assert_eq!(grid.center_position(), PlanarPoint::new(10.0, -10.0));
        assert_eq!(grid.tile_in(NeighborhoodSlot::Center), TileId(4));
        assert_neighbours_adjacent(&grid);
    }

    #[test]
    fn test_no_viewer_is_not_found() {
        let mut grid = grid_with_size(10.0);
        assert_eq!(grid.locate_viewer_slot(), None);
        assert_eq!(grid.pan(PanDelta::new(3.0, 0.0)), None);
        assert_eq!(grid.permutation(), IDENTITY);
    }

    #[test]
    fn test_small_pans_stay_centered() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::ORIGIN);

        // Net movement (4, 2) stays inside the centre tile
        for _ in 0..20 {
            assert_eq!(grid.pan(PanDelta::new(0.2, 0.1)), None);
            assert_bijection(&grid);
            assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::Center));
            assert_eq!(grid.locate_viewer_slot().map(|s| s.index()), Some(4));
        }
        assert_eq!(grid.permutation(), IDENTITY);
    }

    #[test]
    fn test_recycle_after_crossing_half_tile() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::ORIGIN);

        assert_eq!(grid.pan(PanDelta::new(12.0, 0.0)), None);
        let slot = grid.locate_viewer_slot();
        assert!(slot.is_some());
        assert_ne!(slot, Some(NeighborhoodSlot::Center));
        assert_eq!(slot, Some(NeighborhoodSlot::West));

        assert_eq!(grid.pan(PanDelta::ZERO), Some(NeighborhoodSlot::West));
        assert_eq!(grid.locate_viewer_slot().map(|s| s.index()), Some(4));
        assert_bijection(&grid);
        assert_neighbours_adjacent(&grid);

        // The promoted tile is the one that sat in the west slot
        assert_eq!(grid.tile_in(NeighborhoodSlot::Center), TileId(3));
        assert_eq!(grid.tile_in(NeighborhoodSlot::West), TileId(4));
        assert_eq!(grid.center_position(), PlanarPoint::new(2.0, 0.0));
    }

    #[test]
    fn test_long_walk_keeps_invariants() {
        let mut grid = grid_with_size(2.0);
        grid.initialize(PlanarPoint::ORIGIN);

        let mut recycles = 0;
        for step in 0..500 {
            let delta = if step % 3 == 0 {
                PanDelta::new(0.3, -0.1)
            } else {
                PanDelta::new(-0.05, 0.25)
            };
            if grid.pan(delta).is_some() {
                recycles += 1;
            }
            assert_bijection(&grid);
            assert_neighbours_adjacent(&grid);
            assert!(grid.locate_viewer_slot().is_some());
        }

        assert!(recycles > 0);
        grid.pan(PanDelta::ZERO);
        assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::Center));
    }

    #[test]
    fn test_pan_offset_accumulates() {
        let mut grid = grid_with_size(1.0);
        grid.initialize(PlanarPoint::ORIGIN);
        grid.pan(PanDelta::new(1.0, 2.0));
        grid.pan(PanDelta::new(3.0, -1.0));
        assert_eq!(grid.pan_offset(), PlanarPoint::new(4.0, 1.0));

        grid.initialize(PlanarPoint::ORIGIN);
        assert_eq!(grid.pan_offset(), PlanarPoint::ORIGIN);
    }

    #[test]
    fn test_jump_past_neighbourhood_is_not_corrected() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::ORIGIN);

        // One step of 1.6 tiles skips over the west tile entirely
        grid.pan(PanDelta::new(16.0, 0.0));
        assert_eq!(grid.locate_viewer_slot(), None);

        assert_eq!(grid.pan(PanDelta::ZERO), None);
        assert_eq!(grid.permutation(), IDENTITY);

        // Walking back into range resumes recycling
        grid.pan(PanDelta::new(-4.0, 0.0));
        assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::West));
        assert_eq!(grid.pan(PanDelta::ZERO), Some(NeighborhoodSlot::West));
    }

    #[test]
    fn test_viewer_movement_triggers_recycle() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::ORIGIN);

        grid.set_viewer(PlanarPoint::new(6.0, -7.0));
        assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::NorthEast));

        assert_eq!(grid.pan(PanDelta::ZERO), Some(NeighborhoodSlot::NorthEast));
        assert_eq!(grid.center_position(), PlanarPoint::new(10.0, -10.0));
        assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::Center));
    }

    #[test]
    fn test_edge_prefers_center() {
        let mut grid = grid_with_size(10.0);
        grid.initialize(PlanarPoint::ORIGIN);
        grid.set_viewer(PlanarPoint::new(5.0, 5.0));
        assert_eq!(grid.locate_viewer_slot(), Some(NeighborhoodSlot::Center));
    }

    #[test]
    fn test_vertical_offset_recomputes_layout() {
        let mut grid = grid_with_size(1.0);
        grid.initialize(PlanarPoint::ORIGIN);

        let layout = grid.set_vertical_offset(-1.25);
        assert_eq!(layout.vertical_offset, -1.25);
        assert_eq!(layout.tiles.len(), TILE_COUNT);
        assert!(layout.tiles.iter().all(|t| t.position.y == -1.25));

        // Horizontal placement is unaffected
        let center = &layout.tiles[NeighborhoodSlot::Center.index()];
        assert_eq!(center.position.x, 0.0);
        assert_eq!(center.position.z, 0.0);

        assert_eq!(grid.set_vertical_offset(9.0).vertical_offset, 5.0);
        assert_eq!(grid.set_vertical_offset(f64::NAN).vertical_offset, 5.0);
    }

    #[test]
    fn test_line_weight_clamped() {
        let mut grid = grid_with_size(1.0);
        assert_eq!(grid.set_line_weight(4.5).line_weight, 4.5);
        assert_eq!(grid.set_line_weight(0.2).line_weight, 1.0);
        assert_eq!(grid.set_line_weight(25.0).line_weight, 10.0);
        assert_eq!(grid.line_weight(), 10.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let inverted = EngineConfig {
            vertical_offset_range: (5.0, -5.0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            TileGrid::new(&inverted),
            Err(WayfinderError::InvalidConfig(_))
        ));

        let zero_size = EngineConfig {
            grid_size: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            TileGrid::new(&zero_size),
            Err(WayfinderError::InvalidConfig(_))
        ));
    }
}

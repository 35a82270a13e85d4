//! Endless floor grid and the marker sticks placed on it
//!
//! A fixed pool of nine tiles is recycled around the viewer; markers pan in
//! lockstep with the tiles but are never recycled.

pub mod markers;
pub mod slot;
pub mod tile_grid;

pub use markers::{Marker, MarkerSet, STICK_HEIGHT_M, STICK_RADIUS_M};
pub use slot::{NeighborhoodSlot, TileId, TILE_COUNT};
pub use tile_grid::{TileGrid, TileLayout, TilePlacement};

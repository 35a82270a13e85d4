//! Location-based AR overlay engine.
//!
//! Projects marker coordinates onto a local ground plane around the viewer
//! and keeps an endless floor grid under them by recycling a fixed pool of
//! nine tiles as the world pans.

pub mod config;
pub mod control_panel;
pub mod controls;
pub mod error;
pub mod geo_projector;
pub mod grid;
pub mod live_status;
pub mod marker_source;
pub mod motion;
pub mod sensors;
pub mod session;
pub mod types;

pub use config::EngineConfig;
pub use controls::{CommandOutcome, GridCommand, GridReport};
pub use error::{MissingInput, WayfinderError, WayfinderResult};
pub use grid::{MarkerSet, NeighborhoodSlot, TileGrid};
pub use session::{MarkerBearing, OverlaySession};
pub use types::{Coordinate, Heading, PanDelta, PlanarPoint};

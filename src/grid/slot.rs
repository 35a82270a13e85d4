use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of tiles in the pool (3x3 neighbourhood)
pub const TILE_COUNT: usize = 9;

/// Logical position around the viewer in a 3x3 neighbourhood.
///
/// Order: NW, N, NE, W, C, E, SW, S, SE (row-major, index 4 is the centre).
/// Columns run along scene x (west = -x). Rows run along scene z with the
/// north row at -z, the direction a default camera looks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodSlot {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl NeighborhoodSlot {
    pub const ALL: [NeighborhoodSlot; TILE_COUNT] = [
        NeighborhoodSlot::NorthWest,
        NeighborhoodSlot::North,
        NeighborhoodSlot::NorthEast,
        NeighborhoodSlot::West,
        NeighborhoodSlot::Center,
        NeighborhoodSlot::East,
        NeighborhoodSlot::SouthWest,
        NeighborhoodSlot::South,
        NeighborhoodSlot::SouthEast,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_center(self) -> bool {
        self == NeighborhoodSlot::Center
    }

    /// (column, row) offset from the centre in tile units
    pub fn offset(self) -> (i8, i8) {
        let index = self.index() as i8;
        (index % 3 - 1, index / 3 - 1)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            NeighborhoodSlot::NorthWest => "NW",
            NeighborhoodSlot::North => "N",
            NeighborhoodSlot::NorthEast => "NE",
            NeighborhoodSlot::West => "W",
            NeighborhoodSlot::Center => "C",
            NeighborhoodSlot::East => "E",
            NeighborhoodSlot::SouthWest => "SW",
            NeighborhoodSlot::South => "S",
            NeighborhoodSlot::SouthEast => "SE",
        }
    }
}

impl Display for NeighborhoodSlot {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Identifier of one physical tile in the pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u8);

impl TileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "tile_{}", self.0)
    }
}

//! Linear algebra aliases for the overlay engine
//!
//! Everything in the engine works in metres on a local ground plane, so only
//! small fixed-size nalgebra types are needed.

use nalgebra::{Rotation2, SVector};

// ===== Dimensions =====
pub const PLANE_DIM: usize = 2; // (x, z) on the ground
pub const SPACE_DIM: usize = 3; // device / scene space

pub type Vec2 = SVector<f64, PLANE_DIM>;
pub type Vec3 = SVector<f64, SPACE_DIM>;
pub type Rot2 = Rotation2<f64>;

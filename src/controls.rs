use crate::grid::{NeighborhoodSlot, TileLayout};
use crate::types::PanDelta;
use serde::{Deserialize, Serialize};

/// Commands accepted from the control panel or any other input binding
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum GridCommand {
    GoForward,
    GoBackward,
    GoLeft,
    GoRight,
    ReportValues,
    SetVerticalOffset { value: f64 },
    SetLineWeight { value: f64 },
    SetMotionTracking { enabled: bool },
}

impl GridCommand {
    /// Manual pan for the move commands.
    ///
    /// The ground moves opposite to the viewer: stepping left pans +x,
    /// stepping forward (scene -z) pans +z.
    pub fn pan_delta(&self, step: f64) -> Option<PanDelta> {
        match self {
            GridCommand::GoForward => Some(PanDelta::new(0.0, step)),
            GridCommand::GoBackward => Some(PanDelta::new(0.0, -step)),
            GridCommand::GoLeft => Some(PanDelta::new(step, 0.0)),
            GridCommand::GoRight => Some(PanDelta::new(-step, 0.0)),
            GridCommand::ReportValues
            | GridCommand::SetVerticalOffset { .. }
            | GridCommand::SetLineWeight { .. }
            | GridCommand::SetMotionTracking { .. } => None,
        }
    }
}

/// Grid diagnostics for the debug readout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridReport {
    pub current_slot: Option<NeighborhoodSlot>,
    pub x_offset: f64,
    pub z_offset: f64,
}

/// Result of dispatching a command
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Panned {
        recycled: Option<NeighborhoodSlot>,
        layout: TileLayout,
    },
    Report(GridReport),
    Appearance(TileLayout),
    MotionTracking { enabled: bool },
}

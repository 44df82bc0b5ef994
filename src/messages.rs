// Define message types for the runtime

use serde::{Deserialize, Serialize};

/// How a move request is executed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MoveMode {
    /// Single step straight to the target
    Point,
    /// Straight line split into resolution-sized steps
    #[default]
    Line,
}

// Command from teleop/scripts -> runtime
// velocity and resolution fall back to the configured defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveCommand {
    pub target: [f64; 3],
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub mode: MoveMode,
}

// State published by runtime -> observers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionerStatus {
    /// Last commanded platform position [x, y, z] in meters
    pub position: [f64; 3],
    pub moves_completed: u64,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    /// Last request failed validation, nothing was sent
    Rejected,
    /// Drive refused a command, the last move stopped early
    DriveFault,
}

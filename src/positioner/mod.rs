// Cable positioner for a spider-cam style robot
//
// Provides:
// - Axis registry (winch anchor points and drum diameters)
// - Cable robot inverse kinematics (point -> cable length, velocity -> cable rate)
// - Line planner that splits long moves into short waypoints
// - Positioner that dispatches per-axis commands to a drive channel
// - Serial and simulated drive channels

mod axis;
mod dispatcher;
pub mod drive;
pub mod kinematics;
pub mod planner;
pub mod serial;

use nalgebra::Point3;

pub use axis::{Axis, AxisId, AxisRegistry};
pub use dispatcher::{MoveReport, PlatformState, Positioner};
pub use drive::{DriveChannel, DriveError, SimulatedDrive};
pub use kinematics::AxisCommand;
pub use serial::SerialDrive;

/// Possible errors raised by the positioner
#[derive(Debug, thiserror::Error)]
pub enum PositionerError {
    #[error("Axis {id} is already registered")]
    DuplicateAxis { id: AxisId },

    #[error("Invalid geometry for axis {id}: {reason}")]
    InvalidGeometry { id: AxisId, reason: String },

    #[error("Platform point {point:?} coincides with the anchor of axis {id}")]
    DegenerateGeometry { id: AxisId, point: Point3<f64> },

    #[error("Line resolution must be positive, got {0}")]
    InvalidResolution(f64),

    #[error("Velocity must be non-negative, got {0}")]
    InvalidVelocity(f64),

    #[error("No axes registered")]
    NoAxesRegistered,

    #[error("Drive failed on axis {axis} at waypoint {waypoint}: {source}")]
    DriveCommand {
        axis: AxisId,
        waypoint: usize,
        #[source]
        source: DriveError,
    },

    #[error("Failed to enable axis {id}: {source}")]
    DriveEnable {
        id: AxisId,
        #[source]
        source: DriveError,
    },
}

// Cable robot inverse kinematics
//
// Maps a Cartesian platform point to per-axis cable length, and a Cartesian
// platform velocity to per-axis cable rate (Jacobian-transpose relation).
// All functions are pure: no state is kept between calls.
//
// Rates handed to the drive are in revolutions per second of the drum.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};

use super::axis::{Axis, AxisId};
use super::PositionerError;

/// Per-axis command for one waypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCommand {
    pub axis_id: AxisId,
    /// Cable length in meters (> 0)
    pub cable_length: f64,
    /// Drum rate in rev/s, positive = letting cable out
    pub angular_rate: f64,
}

/// Vector from the anchor to the cable attachment point on the platform
fn cable_vector(axis: &Axis, point: &Point3<f64>) -> Vector3<f64> {
    (*point + axis.attachment()) - axis.anchor()
}

/// Unit vector from the anchor toward the platform
///
/// Fails when the attachment point sits on the anchor, where the cable
/// direction is undefined.
fn cable_direction(axis: &Axis, point: &Point3<f64>) -> Result<Vector3<f64>, PositionerError> {
    let v = cable_vector(axis, point);
    let length = v.norm();
    if length <= f64::EPSILON {
        return Err(PositionerError::DegenerateGeometry {
            id: axis.id(),
            point: *point,
        });
    }
    Ok(v / length)
}

/// Cable length in meters: distance from anchor to the platform point
pub fn cable_length(axis: &Axis, point: &Point3<f64>) -> Result<f64, PositionerError> {
    let length = cable_vector(axis, point).norm();
    if length <= f64::EPSILON {
        return Err(PositionerError::DegenerateGeometry {
            id: axis.id(),
            point: *point,
        });
    }
    Ok(length)
}

/// Instantaneous rate of change of cable length in m/s
///
/// Projects the platform velocity onto the cable line of sight. Positive
/// means the cable is lengthening.
pub fn cable_rate(
    axis: &Axis,
    point: &Point3<f64>,
    velocity: &Vector3<f64>,
) -> Result<f64, PositionerError> {
    let u = cable_direction(axis, point)?;
    Ok(u.dot(velocity))
}

/// Convert a cable rate (m/s) into drum revolutions per second
pub fn angular_rate(axis: &Axis, rate: f64) -> f64 {
    rate / (PI * axis.drum_diameter())
}

/// Absolute drum rotation in degrees needed to pay out `length` meters
pub fn length_to_rotation(axis: &Axis, length: f64) -> f64 {
    360.0 * length / (PI * axis.drum_diameter())
}

/// Cable length in meters paid out by `degrees` of drum rotation
pub fn rotation_to_length(axis: &Axis, degrees: f64) -> f64 {
    PI * axis.drum_diameter() * degrees / 360.0
}

/// Compute the full command for one axis at one waypoint
pub fn axis_command(
    axis: &Axis,
    point: &Point3<f64>,
    velocity: &Vector3<f64>,
) -> Result<AxisCommand, PositionerError> {
    let u = cable_direction(axis, point)?;
    Ok(AxisCommand {
        axis_id: axis.id(),
        cable_length: cable_vector(axis, point).norm(),
        angular_rate: angular_rate(axis, u.dot(velocity)),
    })
}

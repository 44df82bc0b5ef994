// Path planner: splits a move into kinematically valid waypoints
//
// The point kinematics are only exact at a single point, so long moves are
// cut into steps no longer than the requested resolution.

use nalgebra::{Point3, Vector3};

use super::PositionerError;
use crate::config::MAX_WAYPOINTS;

/// Slack applied to `distance / resolution` before rounding up, so a distance
/// that is a whole multiple of the resolution does not gain a step
const STEP_TOLERANCE: f64 = 1e-9;

fn check_velocity(velocity: f64) -> Result<(), PositionerError> {
    if !(velocity >= 0.0) || velocity.is_infinite() {
        return Err(PositionerError::InvalidVelocity(velocity));
    }
    Ok(())
}

fn check_resolution(resolution: f64) -> Result<(), PositionerError> {
    if !(resolution > 0.0) || resolution.is_infinite() {
        return Err(PositionerError::InvalidResolution(resolution));
    }
    Ok(())
}

/// Number of steps needed to cover `distance` in steps of at most `resolution`
///
/// Fails when the line would need more than `MAX_WAYPOINTS` steps.
pub fn step_count(distance: f64, resolution: f64) -> Result<usize, PositionerError> {
    if distance <= 0.0 {
        return Ok(1);
    }
    let steps = (distance / resolution - STEP_TOLERANCE).ceil();
    if !steps.is_finite() || steps > MAX_WAYPOINTS as f64 {
        return Err(PositionerError::InvalidResolution(resolution));
    }
    Ok((steps as usize).max(1))
}

/// Plan a straight line from `from` (exclusive) to `to` (inclusive)
///
/// Waypoints are evenly spaced by `distance / steps` where
/// `steps = ceil(distance / resolution)`. A zero-length move yields `[to]`.
pub fn plan_line(
    from: &Point3<f64>,
    to: &Point3<f64>,
    velocity: f64,
    resolution: f64,
) -> Result<Vec<Point3<f64>>, PositionerError> {
    check_resolution(resolution)?;
    check_velocity(velocity)?;

    let (from, to) = (*from, *to);
    let delta = to - from;
    let steps = step_count(delta.norm(), resolution)?;

    let mut waypoints: Vec<Point3<f64>> = (1..steps)
        .map(|i| from + delta * (i as f64 / steps as f64))
        .collect();
    // Land exactly on the target, free of interpolation rounding
    waypoints.push(to);

    Ok(waypoints)
}

/// Plan a direct move with no subdivision
///
/// Kinematics are exact only at the endpoint.
pub fn plan_point(to: &Point3<f64>, velocity: f64) -> Result<Vec<Point3<f64>>, PositionerError> {
    check_velocity(velocity)?;
    Ok(vec![*to])
}

/// Unit direction of travel between two consecutive waypoints
///
/// Returns the zero vector when the points coincide.
pub fn travel_direction(from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
    let delta = *to - *from;
    let norm = delta.norm();
    if norm <= f64::EPSILON {
        Vector3::zeros()
    } else {
        delta / norm
    }
}

// Positioner: turns move requests into per-axis drive commands
//
// Moves are planned into waypoints, the kinematics are evaluated for every
// axis at every waypoint, and each waypoint is sent to the drive channel as
// one batch. The platform position only advances once a whole batch has been
// accepted.

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use super::axis::{Axis, AxisId, AxisRegistry};
use super::drive::DriveChannel;
use super::kinematics::{axis_command, cable_length, AxisCommand};
use super::planner::{plan_line, plan_point, travel_direction};
use super::PositionerError;

/// Where the platform was last commanded to be
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformState {
    pub current_position: Point3<f64>,
}

/// Outcome of a completed move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveReport {
    /// Number of waypoints issued
    pub waypoints: usize,
    /// Platform position after the move
    pub position: Point3<f64>,
}

/// Cable positioner owning its axes, platform state and drive channel
pub struct Positioner<D: DriveChannel> {
    drive: D,
    axes: AxisRegistry,
    state: PlatformState,
}

impl<D: DriveChannel> Positioner<D> {
    /// Create a positioner with the platform at `start_position`
    pub fn new(drive: D, start_position: Point3<f64>) -> Self {
        info!(
            "Positioner start position: x={:.3}m, y={:.3}m, z={:.3}m",
            start_position.x, start_position.y, start_position.z
        );
        Self {
            drive,
            axes: AxisRegistry::new(),
            state: PlatformState {
                current_position: start_position,
            },
        }
    }

    /// Register an axis whose cable is fixed at the platform reference point
    pub fn register_axis(
        &mut self,
        id: AxisId,
        anchor: Point3<f64>,
        drum_diameter: f64,
    ) -> Result<&Axis, PositionerError> {
        self.axes.register(id, anchor, drum_diameter)
    }

    /// Register an axis with a cable attachment offset on the platform
    pub fn register_axis_with_attachment(
        &mut self,
        id: AxisId,
        anchor: Point3<f64>,
        drum_diameter: f64,
        attachment: Vector3<f64>,
    ) -> Result<&Axis, PositionerError> {
        self.axes
            .register_with_attachment(id, anchor, drum_diameter, attachment)
    }

    /// Power up every registered axis on the drive
    ///
    /// Each axis is told its cable length at the current platform position.
    pub fn enable_axes(&mut self) -> Result<(), PositionerError> {
        if self.axes.is_empty() {
            return Err(PositionerError::NoAxesRegistered);
        }

        let position = self.state.current_position;
        for axis in self.axes.all_axes() {
            let length = cable_length(axis, &position)?;
            self.drive
                .enable_axis(axis, length)
                .map_err(|source| PositionerError::DriveEnable {
                    id: axis.id(),
                    source,
                })?;
        }

        info!("{} axes enabled", self.axes.len());
        Ok(())
    }

    pub fn current_position(&self) -> Point3<f64> {
        self.state.current_position
    }

    pub fn state(&self) -> PlatformState {
        self.state
    }

    pub fn axes(&self) -> &AxisRegistry {
        &self.axes
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut D {
        &mut self.drive
    }

    /// Move directly to `target` at `velocity` m/s, without subdivision
    pub fn move_to(
        &mut self,
        target: Point3<f64>,
        velocity: f64,
    ) -> Result<MoveReport, PositionerError> {
        self.require_axes()?;
        let waypoints = plan_point(&target, velocity)?;

        self.log_move(&target, velocity, waypoints.len());
        self.execute(&waypoints, velocity)
    }

    /// Move along a straight line to `target`, in steps of at most `resolution` m
    pub fn move_on_line(
        &mut self,
        target: Point3<f64>,
        velocity: f64,
        resolution: f64,
    ) -> Result<MoveReport, PositionerError> {
        self.require_axes()?;
        let waypoints = plan_line(&self.state.current_position, &target, velocity, resolution)?;

        self.log_move(&target, velocity, waypoints.len());
        self.execute(&waypoints, velocity)
    }

    fn require_axes(&self) -> Result<(), PositionerError> {
        if self.axes.is_empty() {
            return Err(PositionerError::NoAxesRegistered);
        }
        Ok(())
    }

    fn log_move(&self, target: &Point3<f64>, velocity: f64, waypoints: usize) {
        info!(
            "Moving platform to x={:.3}m, y={:.3}m, z={:.3}m at {:.1} mm/s ({} waypoints)",
            target.x,
            target.y,
            target.z,
            velocity * 1000.0,
            waypoints
        );
    }

    /// Evaluate the kinematics for every axis at every waypoint
    ///
    /// The velocity at each waypoint points from the previous waypoint (or the
    /// current position) toward it.
    fn compute_batches(
        &self,
        waypoints: &[Point3<f64>],
        velocity: f64,
    ) -> Result<Vec<Vec<AxisCommand>>, PositionerError> {
        let mut previous = self.state.current_position;
        let mut batches = Vec::with_capacity(waypoints.len());

        for waypoint in waypoints {
            let v = travel_direction(&previous, waypoint) * velocity;
            let batch = self
                .axes
                .all_axes()
                .map(|axis| axis_command(axis, waypoint, &v))
                .collect::<Result<Vec<_>, _>>()?;
            batches.push(batch);
            previous = *waypoint;
        }

        Ok(batches)
    }

    fn execute(
        &mut self,
        waypoints: &[Point3<f64>],
        velocity: f64,
    ) -> Result<MoveReport, PositionerError> {
        // Fail on bad geometry before anything reaches the drive
        let batches = self.compute_batches(waypoints, velocity)?;

        for (index, (waypoint, batch)) in waypoints.iter().zip(batches).enumerate() {
            debug!(
                "Waypoint {}: x={:.4}, y={:.4}, z={:.4}",
                index, waypoint.x, waypoint.y, waypoint.z
            );

            for command in &batch {
                debug!(
                    "Axis {}: length={:.4}m, rate={:.4}rev/s",
                    command.axis_id, command.cable_length, command.angular_rate
                );
                if let Err(source) = self.drive.send(command) {
                    warn!(
                        "Drive failed on axis {} at waypoint {}: {}",
                        command.axis_id, index, source
                    );
                    return Err(PositionerError::DriveCommand {
                        axis: command.axis_id,
                        waypoint: index,
                        source,
                    });
                }
            }

            self.state.current_position = *waypoint;
        }

        Ok(MoveReport {
            waypoints: waypoints.len(),
            position: self.state.current_position,
        })
    }
}

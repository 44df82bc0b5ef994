// Fixed-rate loop executing move requests received over Zenoh
//
// Moves are executed one at a time in arrival order; a move (all of its
// waypoints) completes before the next request is looked at.

use nalgebra::Point3;
use tokio::time::interval;
use tracing::{info, warn};

// local imports
use crate::config::{loop_period, RobotConfig, TOPIC_CMD_MOVE, TOPIC_HEALTH, TOPIC_STATE_POSITION};
use crate::messages::{MoveCommand, MoveMode, PositionerStatus, RuntimeHealth};
use crate::positioner::{DriveChannel, MoveReport, Positioner, PositionerError};

pub struct Runtime<D: DriveChannel> {
    positioner: Positioner<D>,
    default_velocity: f64,
    default_resolution: f64,
    moves_completed: u64,
    health: RuntimeHealth,
}

impl<D: DriveChannel> Runtime<D> {
    pub fn new(positioner: Positioner<D>, config: &RobotConfig) -> Self {
        Self {
            positioner,
            default_velocity: config.default_velocity,
            default_resolution: config.default_resolution,
            moves_completed: 0,
            health: RuntimeHealth::Ok,
        }
    }

    /// Execute one move request, blocking until the drive has taken it
    pub fn on_command(&mut self, cmd: &MoveCommand) -> Result<MoveReport, PositionerError> {
        info!("Received command: {:?}", cmd);
        let target = Point3::from(cmd.target);
        let velocity = cmd.velocity.unwrap_or(self.default_velocity);

        let result = match cmd.mode {
            MoveMode::Point => self.positioner.move_to(target, velocity),
            MoveMode::Line => {
                let resolution = cmd.resolution.unwrap_or(self.default_resolution);
                self.positioner.move_on_line(target, velocity, resolution)
            }
        };

        match &result {
            Ok(_) => {
                self.moves_completed += 1;
                self.health = RuntimeHealth::Ok;
            }
            Err(e @ (PositionerError::DriveCommand { .. } | PositionerError::DriveEnable { .. })) => {
                warn!("Move aborted: {}", e);
                self.health = RuntimeHealth::DriveFault;
            }
            Err(e) => {
                warn!("Move rejected: {}", e);
                self.health = RuntimeHealth::Rejected;
            }
        }
        result
    }

    pub fn status(&self) -> PositionerStatus {
        let p = self.positioner.current_position();
        PositionerStatus {
            position: [p.x, p.y, p.z],
            moves_completed: self.moves_completed,
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn positioner(&self) -> &Positioner<D> {
        &self.positioner
    }
}

pub async fn run<D: DriveChannel>(
    mut runtime: Runtime<D>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_MOVE).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE_POSITION).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let period = loop_period();
    let mut tick = interval(period);

    info!("Runtime started: {}ms loop", period.as_millis());
    info!("Subscribed to: {}", TOPIC_CMD_MOVE);
    info!("Publishing to: {}, {}", TOPIC_STATE_POSITION, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain pending requests (non-blocking), execute each in order
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<MoveCommand>(&payload) {
                Ok(cmd) => {
                    // Drive I/O blocks; keep it off the async workers.
                    // Failures are logged and reflected in health by on_command.
                    if let Ok(report) = tokio::task::block_in_place(|| runtime.on_command(&cmd)) {
                        info!("Move complete: {} waypoints", report.waypoints);
                    }
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Publish commanded position
        let state_json = serde_json::to_string(&runtime.status())?;
        pub_state.put(state_json).await?;

        // 3. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positioner::{AxisCommand, DriveError, SimulatedDrive};

    fn config() -> RobotConfig {
        RobotConfig::from_json(
            r#"{
                "axes": [
                    { "id": 1, "anchor": [-1.0, 0.0, 2.0] },
                    { "id": 2, "anchor": [1.0, 0.0, 2.0] }
                ],
                "default_velocity": 0.1,
                "default_resolution": 0.25
            }"#,
        )
        .unwrap()
    }

    struct BrokenDrive;

    impl DriveChannel for BrokenDrive {
        fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError> {
            Err(DriveError::Timeout {
                id: command.axis_id,
            })
        }
    }

    #[test]
    fn test_line_command_uses_defaults() {
        let config = config();
        let positioner = config.build_positioner(SimulatedDrive::new()).unwrap();
        let mut runtime = Runtime::new(positioner, &config);

        let cmd = MoveCommand {
            target: [0.5, 0.0, 0.0],
            velocity: None,
            resolution: None,
            mode: MoveMode::Line,
        };
        let report = runtime.on_command(&cmd).unwrap();

        // 0.5 m at 0.25 m resolution
        assert_eq!(report.waypoints, 2);
        assert_eq!(runtime.positioner().drive().commands_sent(), 4);
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(
            runtime.status(),
            PositionerStatus {
                position: [0.5, 0.0, 0.0],
                moves_completed: 1,
            }
        );
    }

    #[test]
    fn test_point_command_single_waypoint() {
        let config = config();
        let positioner = config.build_positioner(SimulatedDrive::new()).unwrap();
        let mut runtime = Runtime::new(positioner, &config);

        let cmd = MoveCommand {
            target: [0.0, 0.5, 0.5],
            velocity: Some(0.02),
            resolution: None,
            mode: MoveMode::Point,
        };
        let report = runtime.on_command(&cmd).unwrap();
        assert_eq!(report.waypoints, 1);
        assert_eq!(runtime.status().position, [0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_rejected_command_health() {
        let config = config();
        let positioner = config.build_positioner(SimulatedDrive::new()).unwrap();
        let mut runtime = Runtime::new(positioner, &config);

        let cmd = MoveCommand {
            target: [0.5, 0.0, 0.0],
            velocity: Some(-0.1),
            resolution: None,
            mode: MoveMode::Line,
        };
        assert!(runtime.on_command(&cmd).is_err());
        assert_eq!(runtime.health(), RuntimeHealth::Rejected);
        assert_eq!(runtime.status().moves_completed, 0);
        assert_eq!(runtime.positioner().drive().commands_sent(), 0);
    }

    #[test]
    fn test_too_fine_resolution_rejected() {
        let config = config();
        let positioner = config.build_positioner(SimulatedDrive::new()).unwrap();
        let mut runtime = Runtime::new(positioner, &config);

        let cmd = MoveCommand {
            target: [0.5, 0.0, 0.0],
            velocity: None,
            resolution: Some(1e-300),
            mode: MoveMode::Line,
        };
        let err = runtime.on_command(&cmd).unwrap_err();
        assert!(matches!(err, PositionerError::InvalidResolution(_)));
        assert_eq!(runtime.health(), RuntimeHealth::Rejected);
        assert_eq!(runtime.positioner().drive().commands_sent(), 0);
        assert_eq!(runtime.status().position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_drive_fault_health() {
        let config = config();
        let positioner = config.build_positioner(BrokenDrive).unwrap();
        let mut runtime = Runtime::new(positioner, &config);

        let cmd = MoveCommand {
            target: [0.5, 0.0, 0.0],
            velocity: None,
            resolution: None,
            mode: MoveMode::Line,
        };
        let err = runtime.on_command(&cmd).unwrap_err();
        assert!(matches!(err, PositionerError::DriveCommand { waypoint: 0, .. }));
        assert_eq!(runtime.health(), RuntimeHealth::DriveFault);
        assert_eq!(runtime.status().position, [0.0, 0.0, 0.0]);
    }
}

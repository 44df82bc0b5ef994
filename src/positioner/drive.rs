// Drive channel abstraction
//
// The positioner hands one AxisCommand per axis per waypoint to a drive
// channel. The channel owns the transport; the positioner only needs to know
// whether each command was accepted.

use tracing::{debug, info};

use super::axis::{Axis, AxisId};
use super::kinematics::AxisCommand;

/// Error types reported by a drive channel
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Axis {id} is not powered")]
    NotPowered { id: AxisId },

    #[error("Axis {id} is not enabled on this drive")]
    UnknownAxis { id: AxisId },

    #[error("Timeout waiting for response from axis {id}")]
    Timeout { id: AxisId },

    #[error("Axis {id} rejected command: {reason}")]
    Rejected { id: AxisId, reason: String },
}

/// Capability to forward axis commands to the motor drives
pub trait DriveChannel {
    /// Send one axis command, returning once the drive accepted it
    fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError>;

    /// Power up an axis before its first command
    ///
    /// `initial_length` is the cable length at the current platform position,
    /// which drives that track absolute rotation use as their zero.
    fn enable_axis(&mut self, axis: &Axis, initial_length: f64) -> Result<(), DriveError> {
        let _ = (axis, initial_length);
        Ok(())
    }
}

impl<T: DriveChannel + ?Sized> DriveChannel for Box<T> {
    fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError> {
        (**self).send(command)
    }

    fn enable_axis(&mut self, axis: &Axis, initial_length: f64) -> Result<(), DriveError> {
        (**self).enable_axis(axis, initial_length)
    }
}

/// Drive channel that only logs commands (no hardware attached)
#[derive(Debug, Default)]
pub struct SimulatedDrive {
    sent: usize,
}

impl SimulatedDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands accepted so far
    pub fn commands_sent(&self) -> usize {
        self.sent
    }
}

impl DriveChannel for SimulatedDrive {
    fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError> {
        debug!(
            "[sim] axis {}: length={:.4}m, rate={:.4}rev/s",
            command.axis_id, command.cable_length, command.angular_rate
        );
        self.sent += 1;
        Ok(())
    }

    fn enable_axis(&mut self, axis: &Axis, initial_length: f64) -> Result<(), DriveError> {
        info!(
            "[sim] axis {} ready, initial cable length {:.4}m",
            axis.id(),
            initial_length
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_drive_counts_commands() {
        let mut drive = SimulatedDrive::new();
        for id in 1..=3 {
            drive
                .send(&AxisCommand {
                    axis_id: id,
                    cable_length: 1.0,
                    angular_rate: 0.0,
                })
                .unwrap();
        }
        assert_eq!(drive.commands_sent(), 3);
    }

    #[test]
    fn test_boxed_channel_forwards() {
        let mut drive: Box<dyn DriveChannel> = Box::new(SimulatedDrive::new());
        let cmd = AxisCommand {
            axis_id: 2,
            cable_length: 0.5,
            angular_rate: -0.1,
        };
        assert!(drive.send(&cmd).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = DriveError::Rejected {
            id: 4,
            reason: "no ack".to_string(),
        };
        assert_eq!(err.to_string(), "Axis 4 rejected command: no ack");
        assert_eq!(
            DriveError::NotPowered { id: 2 }.to_string(),
            "Axis 2 is not powered"
        );
    }
}

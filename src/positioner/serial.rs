// Serial drive channel for the winch controllers
//
// Line-oriented ASCII over a serial port, one line per instruction:
//   AX{id}:POW ON     power the axis
//   AX{id}:POW?       query power state, answers "ON" or "OFF"
//   AX{id}:RATE {n}   drum rate in deg/s (unsigned)
//   AX{id}:POS {n}    absolute drum angle in degrees
// Only queries (lines containing '?') produce a response line.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::thread::sleep;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, warn};

use super::axis::{Axis, AxisId};
use super::drive::{DriveChannel, DriveError};
use super::kinematics::{length_to_rotation, rotation_to_length, AxisCommand};

/// Default serial configuration for the winch controllers
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Drum rate limits accepted by the controllers, deg/s
const MIN_RATE_DEG: f64 = 1.0;
const MAX_RATE_DEG: f64 = 1000.0;

/// Settle delays between instructions
const RATE_SETTLE: Duration = Duration::from_millis(10);
const POS_SETTLE: Duration = Duration::from_millis(50);

/// Longest response line accepted before giving up
const MAX_RESPONSE_LEN: usize = 64;

/// Drum state tracked per enabled axis
#[derive(Debug, Clone)]
struct DrumTrack {
    axis: Axis,
    /// Rotation in degrees corresponding to the cable length at enable time
    zero_rotation: f64,
}

impl DrumTrack {
    fn new(axis: &Axis, initial_length: f64) -> Self {
        Self {
            axis: axis.clone(),
            zero_rotation: length_to_rotation(axis, initial_length),
        }
    }

    /// Drum angle in degrees relative to the enable-time rotation
    fn angle(&self, length: f64) -> f64 {
        length_to_rotation(&self.axis, length) - self.zero_rotation
    }

    /// Cable length the drum reaches at a relative `angle` in degrees
    fn length(&self, angle: f64) -> f64 {
        rotation_to_length(&self.axis, angle + self.zero_rotation)
    }
}

/// Serial drive channel - handles communication with the winch controllers
pub struct SerialDrive {
    port: Box<dyn SerialPort>,
    drums: HashMap<AxisId, DrumTrack>,
}

impl SerialDrive {
    /// Open a new connection to the winch controllers
    pub fn open(port_name: &str) -> Result<Self, DriveError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, DriveError> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;
        info!("Connection opened to drive port {}", port_name);

        Ok(Self {
            port,
            drums: HashMap::new(),
        })
    }

    /// Write one instruction line
    fn write_line(&mut self, line: &str) -> Result<(), DriveError> {
        debug!("-> {}", line);
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }

    /// Read one response line, stripped of control characters
    fn read_line(&mut self, id: AxisId) -> Result<String, DriveError> {
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            self.port.read_exact(&mut byte).map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    DriveError::Timeout { id }
                } else {
                    DriveError::Io(e)
                }
            })?;

            if byte[0] == b'\n' {
                break;
            }
            raw.push(byte[0]);
            if raw.len() > MAX_RESPONSE_LEN {
                return Err(DriveError::Rejected {
                    id,
                    reason: format!("response longer than {} bytes", MAX_RESPONSE_LEN),
                });
            }
        }

        let response = clean_response(&raw);
        debug!("<- {}", response);
        Ok(response)
    }

    /// Send a query and return its response
    pub fn query(&mut self, id: AxisId, line: &str) -> Result<String, DriveError> {
        self.write_line(line)?;
        self.read_line(id)
    }

    /// Check whether an axis reports power on
    pub fn is_powered(&mut self, id: AxisId) -> Result<bool, DriveError> {
        let response = self.query(id, &power_query_line(id))?;
        Ok(response.contains("ON"))
    }
}

impl DriveChannel for SerialDrive {
    fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError> {
        let id = command.axis_id;
        let drum = self.drums.get(&id).ok_or(DriveError::UnknownAxis { id })?;

        let rate = rate_to_wire(command.angular_rate);
        let angle = drum.angle(command.cable_length).round() as i64;
        debug!(
            "Axis {} position quantized by {:.2e}m",
            id,
            drum.length(angle as f64) - command.cable_length
        );

        self.write_line(&rate_line(id, rate))?;
        sleep(RATE_SETTLE);
        self.write_line(&position_line(id, angle))?;
        sleep(POS_SETTLE);

        Ok(())
    }

    fn enable_axis(&mut self, axis: &Axis, initial_length: f64) -> Result<(), DriveError> {
        let id = axis.id();
        self.write_line(&power_on_line(id))?;

        if !self.is_powered(id)? {
            warn!("Axis {} is not powered", id);
            return Err(DriveError::NotPowered { id });
        }
        info!("Axis {} is ready", id);

        self.drums.insert(id, DrumTrack::new(axis, initial_length));
        Ok(())
    }
}

fn axis_name(id: AxisId) -> String {
    format!("AX{}", id)
}

fn power_on_line(id: AxisId) -> String {
    format!("{}:POW ON", axis_name(id))
}

fn power_query_line(id: AxisId) -> String {
    format!("{}:POW?", axis_name(id))
}

fn rate_line(id: AxisId, rate_deg: u32) -> String {
    format!("{}:RATE {}", axis_name(id), rate_deg)
}

fn position_line(id: AxisId, angle_deg: i64) -> String {
    format!("{}:POS {}", axis_name(id), angle_deg)
}

/// Convert a signed drum rate in rev/s into the controller's unsigned deg/s
///
/// Direction comes from the position target, so only the magnitude is sent.
fn rate_to_wire(angular_rate: f64) -> u32 {
    let degps = (angular_rate * 360.0).abs();
    degps.clamp(MIN_RATE_DEG, MAX_RATE_DEG).round() as u32
}

/// Drop control characters and whitespace from a raw response
fn clean_response(raw: &[u8]) -> String {
    raw.iter()
        .filter(|&&b| b > 0x20 && b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

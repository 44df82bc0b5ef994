// Topics, defaults, and the robot description file
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::positioner::{AxisId, DriveChannel, Positioner, PositionerError};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 20;

pub fn loop_period() -> Duration {
    Duration::from_millis(1000 / LOOP_HZ)
}

// Zenoh topics
pub const TOPIC_CMD_MOVE: &str = "spider/cmd/move"; // move requests
pub const TOPIC_STATE_POSITION: &str = "spider/state/position"; // commanded position
pub const TOPIC_HEALTH: &str = "spider/state/health"; // health status

// Drive configuration
// Serial port for the winch controllers
pub const DRIVE_PORT: &str = "/dev/ttyUSB0";

// Enable hardware drive (set to false for simulation/testing)
pub const DRIVE_ENABLED: bool = true;

// Motion defaults
pub const DEFAULT_VELOCITY: f64 = 0.05; // m/s
pub const DEFAULT_RESOLUTION: f64 = 0.1; // m
pub const DEFAULT_DRUM_DIAMETER: f64 = 0.05; // m

// Upper bound on waypoints per line move; finer resolutions are rejected
pub const MAX_WAYPOINTS: usize = 100_000;

/// Error types for loading the robot description
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One winch as described in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    pub id: AxisId,
    /// Anchor point [x, y, z] in meters
    pub anchor: [f64; 3],
    #[serde(default = "default_drum_diameter")]
    pub drum_diameter: f64,
    /// Cable attachment offset on the platform [x, y, z] in meters
    #[serde(default)]
    pub attachment: [f64; 3],
}

/// Robot description loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub baudrate: Option<u32>,
    #[serde(default = "default_drive_enabled")]
    pub drive_enabled: bool,
    /// Platform position at startup [x, y, z] in meters
    #[serde(default)]
    pub start_position: [f64; 3],
    pub axes: Vec<AxisConfig>,
    #[serde(default = "default_velocity")]
    pub default_velocity: f64,
    #[serde(default = "default_resolution")]
    pub default_resolution: f64,
}

fn default_drum_diameter() -> f64 {
    DEFAULT_DRUM_DIAMETER
}

fn default_port() -> String {
    DRIVE_PORT.to_string()
}

fn default_drive_enabled() -> bool {
    DRIVE_ENABLED
}

fn default_velocity() -> f64 {
    DEFAULT_VELOCITY
}

fn default_resolution() -> f64 {
    DEFAULT_RESOLUTION
}

impl RobotConfig {
    /// Load and validate a JSON robot description
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.axes.is_empty() {
            return Err(ConfigError::Invalid("no axes configured".to_string()));
        }
        if !(self.default_velocity >= 0.0) || !self.default_velocity.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "default_velocity must be finite and non-negative, got {}",
                self.default_velocity
            )));
        }
        if !(self.default_resolution > 0.0) || !self.default_resolution.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "default_resolution must be finite and positive, got {}",
                self.default_resolution
            )));
        }
        Ok(())
    }

    pub fn start_position(&self) -> Point3<f64> {
        Point3::from(self.start_position)
    }

    /// Build a positioner with every configured axis registered
    pub fn build_positioner<D: DriveChannel>(
        &self,
        drive: D,
    ) -> Result<Positioner<D>, PositionerError> {
        let mut positioner = Positioner::new(drive, self.start_position());
        for axis in &self.axes {
            positioner.register_axis_with_attachment(
                axis.id,
                Point3::from(axis.anchor),
                axis.drum_diameter,
                Vector3::from(axis.attachment),
            )?;
        }
        Ok(positioner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positioner::SimulatedDrive;

    const FOUR_AXES: &str = r#"{
        "port": "/dev/ttyACM0",
        "start_position": [0.0, 0.0, 0.5],
        "axes": [
            { "id": 1, "anchor": [-2.0, -2.0, 3.0] },
            { "id": 2, "anchor": [2.0, -2.0, 3.0], "drum_diameter": 0.08 },
            { "id": 3, "anchor": [2.0, 2.0, 3.0], "attachment": [0.0, 0.0, 0.1] },
            { "id": 4, "anchor": [-2.0, 2.0, 3.0] }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = RobotConfig::from_json(FOUR_AXES).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baudrate, None);
        assert_eq!(config.drive_enabled, DRIVE_ENABLED);
        assert_eq!(config.default_velocity, DEFAULT_VELOCITY);
        assert_eq!(config.default_resolution, DEFAULT_RESOLUTION);
        assert_eq!(config.axes.len(), 4);
        assert_eq!(config.axes[0].drum_diameter, DEFAULT_DRUM_DIAMETER);
        assert_eq!(config.axes[1].drum_diameter, 0.08);
        assert_eq!(config.axes[2].attachment, [0.0, 0.0, 0.1]);
        assert_eq!(config.start_position(), Point3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_build_positioner() {
        let config = RobotConfig::from_json(FOUR_AXES).unwrap();
        let positioner = config.build_positioner(SimulatedDrive::new()).unwrap();
        assert_eq!(positioner.axes().len(), 4);
        assert_eq!(positioner.current_position(), Point3::new(0.0, 0.0, 0.5));
        let axis = positioner.axes().lookup(3).unwrap();
        assert_eq!(axis.attachment(), Vector3::new(0.0, 0.0, 0.1));
    }

    #[test]
    fn test_duplicate_axis_in_config() {
        let json = r#"{ "axes": [
            { "id": 1, "anchor": [0.0, 0.0, 3.0] },
            { "id": 1, "anchor": [1.0, 0.0, 3.0] }
        ] }"#;
        let config = RobotConfig::from_json(json).unwrap();
        let err = config.build_positioner(SimulatedDrive::new()).err();
        assert!(matches!(err, Some(PositionerError::DuplicateAxis { id: 1 })));
    }

    #[test]
    fn test_invalid_configs() {
        let err = RobotConfig::from_json(r#"{ "axes": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let json = r#"{ "default_resolution": 0.0, "axes": [ { "id": 1, "anchor": [0, 0, 3] } ] }"#;
        let err = RobotConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        // serde_json rejects inf literals, so go through the struct
        let mut config = RobotConfig::from_json(FOUR_AXES).unwrap();
        config.default_velocity = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.default_velocity = DEFAULT_VELOCITY;
        config.default_resolution = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.default_resolution = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let err = RobotConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = RobotConfig::from_file("/nonexistent/spider.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

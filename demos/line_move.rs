// Line move demo: four winches at the corners of a 4 m x 4 m frame
//
// Runs entirely against the simulated drive and prints every axis command.
// Usage: cargo run --example line_move

use nalgebra::Point3;
use spider_positioner::config::{DEFAULT_DRUM_DIAMETER, DEFAULT_RESOLUTION, DEFAULT_VELOCITY};
use spider_positioner::positioner::{
    AxisCommand, DriveChannel, DriveError, Positioner, SimulatedDrive,
};

/// Prints commands before handing them to the simulated drive
struct PrintingDrive(SimulatedDrive);

impl DriveChannel for PrintingDrive {
    fn send(&mut self, command: &AxisCommand) -> Result<(), DriveError> {
        println!(
            "  AX{}  length {:>7.4} m   rate {:>+8.4} rev/s",
            command.axis_id, command.cable_length, command.angular_rate
        );
        self.0.send(command)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let mut positioner = Positioner::new(
        PrintingDrive(SimulatedDrive::new()),
        Point3::new(0.0, 0.0, 0.5),
    );
    let corners = [(-2.0, -2.0), (2.0, -2.0), (2.0, 2.0), (-2.0, 2.0)];
    for (id, (x, y)) in (1..).zip(corners) {
        positioner.register_axis(id, Point3::new(x, y, 3.0), DEFAULT_DRUM_DIAMETER)?;
    }
    positioner.enable_axes()?;

    println!("Direct move to (0.5, 0, 0.5):");
    positioner.move_to(Point3::new(0.5, 0.0, 0.5), DEFAULT_VELOCITY)?;

    println!();
    println!("Line move to (-0.5, 0.5, 1.0):");
    let report = positioner.move_on_line(
        Point3::new(-0.5, 0.5, 1.0),
        DEFAULT_VELOCITY,
        DEFAULT_RESOLUTION,
    )?;

    println!();
    println!(
        "Done: {} waypoints, {} commands sent, platform at {:?}",
        report.waypoints,
        positioner.drive().0.commands_sent(),
        report.position
    );
    Ok(())
}

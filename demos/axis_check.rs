// Axis check: power up every configured axis and report its state
//
// Sends only power instructions; no axis is moved.
// Usage: cargo run --example axis_check -- [config.json]

use spider_positioner::config::RobotConfig;
use spider_positioner::positioner::SerialDrive;
use spider_positioner::positioner::kinematics::cable_length;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "spider.json".to_string());
    let config = RobotConfig::from_file(&path)?;

    println!("Config: {}", path);
    println!("Serial port: {}", config.port);
    println!();

    println!("Step 1: Opening serial port...");
    let drive = match config.baudrate {
        Some(baudrate) => SerialDrive::open_with_baudrate(&config.port, baudrate)?,
        None => SerialDrive::open(&config.port)?,
    };
    println!("✓ Connected");
    println!();

    println!("Step 2: Enabling axes at the start position...");
    let mut positioner = config.build_positioner(drive)?;
    let start = positioner.current_position();
    for axis in positioner.axes().all_axes() {
        let a = axis.anchor();
        let length = cable_length(axis, &start)?;
        println!(
            "  Axis {}: anchor ({:.3}, {:.3}, {:.3}), drum {:.0} mm, cable {:.3} m",
            axis.id(),
            a.x,
            a.y,
            a.z,
            axis.drum_diameter() * 1000.0,
            length
        );
    }

    match positioner.enable_axes() {
        Ok(()) => println!("✓ All axes powered"),
        Err(e) => println!("✗ {}", e),
    }

    Ok(())
}

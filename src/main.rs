use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spider_positioner::config::RobotConfig;
use spider_positioner::positioner::{DriveChannel, SerialDrive, SimulatedDrive};
use spider_positioner::runtime::{self, Runtime};

/// Cable-suspended positioner runtime
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Robot description (JSON)
    #[arg(short, long, default_value = "spider.json")]
    config: PathBuf,

    /// Serial port override for the winch controllers
    #[arg(short, long)]
    port: Option<String>,

    /// Log commands instead of driving hardware
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    if let Err(e) = start(args).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn start(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = RobotConfig::from_file(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let drive: Box<dyn DriveChannel> = if args.simulate || !config.drive_enabled {
        info!("Drive disabled, simulating winches");
        Box::new(SimulatedDrive::new())
    } else {
        match config.baudrate {
            Some(baudrate) => Box::new(SerialDrive::open_with_baudrate(&config.port, baudrate)?),
            None => Box::new(SerialDrive::open(&config.port)?),
        }
    };

    let mut positioner = config.build_positioner(drive)?;
    positioner.enable_axes()?;

    runtime::run(Runtime::new(positioner, &config)).await
}

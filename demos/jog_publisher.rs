// Keyboard jog: WASD move in x/y, R/F up/down, +/- step size, Q quit
//
// Each key press publishes one line move relative to the last target.
// Usage: cargo run --example jog_publisher -- [config.json]
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use spider_positioner::config::{RobotConfig, TOPIC_CMD_MOVE};
use std::time::Duration;
use tracing::info;

const STEPS: [f64; 3] = [0.01, 0.05, 0.2]; // m per key press
const JOG_VELOCITY: f64 = 0.05; // m/s

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Jog relative to the platform's configured start position
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "spider.json".to_string());
    let config = RobotConfig::from_file(&path)?;
    let target = config.start_position;
    info!(
        "Start: x={:.3}, y={:.3}, z={:.3} (from {})",
        target[0], target[1], target[2], path
    );

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_MOVE).await?;

    info!("Controls: WASD=x/y, R/F=up/down, +/-=step, Q=quit");
    print_step(0);

    enable_raw_mode()?;
    let result = run_jog(&publisher, target).await;
    disable_raw_mode()?;

    result
}

async fn run_jog(
    publisher: &zenoh::pubsub::Publisher<'_>,
    mut target: [f64; 3],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut step_idx: usize = 0;

    loop {
        if !event::poll(Duration::from_millis(20))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        let step = STEPS[step_idx];
        let delta = match code {
            KeyCode::Char('w') => [step, 0.0, 0.0],
            KeyCode::Char('s') => [-step, 0.0, 0.0],
            KeyCode::Char('a') => [0.0, step, 0.0],
            KeyCode::Char('d') => [0.0, -step, 0.0],
            KeyCode::Char('r') => [0.0, 0.0, step],
            KeyCode::Char('f') => [0.0, 0.0, -step],

            // Step size
            KeyCode::Char('+') => {
                step_idx = (step_idx + 1).min(STEPS.len() - 1);
                print_step(step_idx);
                continue;
            }
            KeyCode::Char('-') => {
                step_idx = step_idx.saturating_sub(1);
                print_step(step_idx);
                continue;
            }

            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => continue,
        };

        for (t, d) in target.iter_mut().zip(delta) {
            *t += d;
        }

        let cmd = json!({
            "target": target,
            "velocity": JOG_VELOCITY,
            "mode": "line"
        });
        publisher.put(cmd.to_string()).await?;
        info!(
            "Target: x={:.3}, y={:.3}, z={:.3}\r",
            target[0], target[1], target[2]
        );
    }

    Ok(())
}

fn print_step(idx: usize) {
    info!("Step: {:.0} mm", STEPS[idx] * 1000.0);
}

//! # Tube Simulator
//!
//! Flies the tube headless for a fixed time and reports what it saw.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=donk=debug tube_sim [CONFIG.toml] --seconds 120 --fps 60
//! ```

use std::process::ExitCode;

use donk::{DonkConfig, RunSession};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Seconds between boost toggles.
const BOOST_PERIOD: f32 = 5.0;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut seconds = 60.0f32;
    let mut fps = 60.0f32;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" | "-s" => {
                if i + 1 < args.len() {
                    seconds = args[i + 1].parse().unwrap_or(seconds);
                    i += 1;
                }
            }
            "--fps" | "-f" => {
                if i + 1 < args.len() {
                    fps = args[i + 1].parse().unwrap_or(fps);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: tube_sim [CONFIG.toml] [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --seconds <SECONDS>   Simulated run length (default: 60)");
                println!("  -f, --fps <FPS>           Frame rate to simulate (default: 60)");
                return ExitCode::SUCCESS;
            }
            path => config_path = Some(path.to_owned()),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => match DonkConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path, error = %e, "Could not load config");
                return ExitCode::FAILURE;
            }
        },
        None => DonkConfig::default(),
    };
    let seed = config.tube.seed;

    let mut session = match RunSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Could not start run");
            return ExitCode::FAILURE;
        }
    };

    let frame_dt = 1.0 / fps.max(1.0);
    let frames = (seconds.max(0.0) * fps.max(1.0)).ceil() as u64;
    let boost_frames = ((BOOST_PERIOD * fps.max(1.0)) as u64).max(1);
    let mut blocked = 0u64;

    info!(seed, seconds, fps, frames, "Simulation started");

    for frame in 0..frames {
        session.set_boost((frame / boost_frames) % 2 == 1);
        session.update(frame_dt);

        for cue in session.probe_mut().take_cues() {
            info!(cue = %cue, distance = session.tube().y(), "Music cue");
        }
        if let Some(sample) = session.probe().sample() {
            if !sample.current.is_open() {
                blocked += 1;
            }
        }
    }

    let stats = session.stats();
    let tube = session.tube();
    if stats.generated == 0 {
        warn!("No rings generated");
    }
    info!(
        distance = tube.y(),
        steps = session.steps(),
        generated = stats.generated,
        culled = stats.culled,
        live = tube.ring_count(),
        branch_swaps = stats.branch_swaps,
        level = %tube.current_ring().level,
        blocked_steps = blocked,
        "Simulation finished"
    );

    ExitCode::SUCCESS
}
